//! Shared multi-selection of tasks.
//!
//! One [`SelectionSynchronizer`] is created per application and cloned into
//! every surface that shows or acts on the selection. Clones share the same
//! set, so a list row's checkbox and the bulk-action menu can never disagree:
//! row flags are membership lookups, never separate state.

use crate::task::domain::{TaskId, TaskStatus};
use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

/// Identifiers currently selected.
pub type SelectionSet = BTreeSet<TaskId>;

/// Handle to the canonical selection set.
#[derive(Debug, Clone)]
pub struct SelectionSynchronizer {
    shared: Arc<SharedSelection>,
}

#[derive(Debug)]
struct SharedSelection {
    eligible: Mutex<HashSet<TaskId>>,
    changes: watch::Sender<SelectionSet>,
}

impl Default for SelectionSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionSynchronizer {
    /// Creates an empty selection with no eligible tasks.
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = watch::channel(SelectionSet::new());
        Self {
            shared: Arc::new(SharedSelection {
                eligible: Mutex::new(HashSet::new()),
                changes,
            }),
        }
    }

    fn eligible(&self) -> MutexGuard<'_, HashSet<TaskId>> {
        self.shared
            .eligible
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `change` and notifies subscribers when the set changed.
    fn mutate(&self, change: impl FnOnce(&mut SelectionSet) -> bool) -> bool {
        self.shared.changes.send_if_modified(change)
    }

    /// Selects `id` if it is a loaded, selectable task.
    ///
    /// Returns whether the set changed.
    #[must_use]
    pub fn select(&self, id: TaskId) -> bool {
        let eligible = self.eligible();
        self.mutate(|selected| eligible.contains(&id) && selected.insert(id))
    }

    /// Removes `id` from the selection.
    ///
    /// Returns whether the set changed.
    #[must_use]
    pub fn deselect(&self, id: TaskId) -> bool {
        self.mutate(|selected| selected.remove(&id))
    }

    /// Drives `id` to `desired` membership, as a row checkbox does.
    ///
    /// Returns whether the set changed.
    #[must_use]
    pub fn toggle(&self, id: TaskId, desired: bool) -> bool {
        if desired {
            self.select(id)
        } else {
            self.deselect(id)
        }
    }

    /// Adds every eligible identifier in `candidates`.
    ///
    /// Callers pass the current tab's visible identifiers; nothing outside
    /// `candidates` is ever added. Returns how many identifiers were added.
    #[must_use]
    pub fn select_all(&self, candidates: impl IntoIterator<Item = TaskId>) -> usize {
        let eligible = self.eligible();
        let additions: Vec<TaskId> = candidates
            .into_iter()
            .filter(|id| eligible.contains(id))
            .collect();
        let mut added = 0;
        self.mutate(|selected| {
            added = additions.into_iter().filter(|id| selected.insert(*id)).count();
            added > 0
        });
        added
    }

    /// Empties the selection.
    pub fn clear(&self) {
        self.mutate(|selected| {
            let changed = !selected.is_empty();
            selected.clear();
            changed
        });
    }

    /// Reacts to the user switching tabs.
    ///
    /// Selection is only meaningful on the completed and deleted tabs, so
    /// moving to the active tab clears it.
    pub fn on_tab_changed(&self, tab: TaskStatus) {
        if !tab.is_selectable() {
            self.clear();
        }
    }

    /// Replaces the set of selectable identifiers and prunes the selection
    /// to it.
    ///
    /// The lifecycle controller calls this after every collection change
    /// with the loaded, non-active task identifiers.
    pub fn retain_eligible(&self, eligible_ids: impl IntoIterator<Item = TaskId>) {
        let mut eligible = self.eligible();
        *eligible = eligible_ids.into_iter().collect();
        self.mutate(|selected| {
            let before = selected.len();
            selected.retain(|id| eligible.contains(id));
            selected.len() != before
        });
    }

    /// Returns whether `id` is selected.
    #[must_use]
    pub fn is_selected(&self, id: TaskId) -> bool {
        self.shared.changes.borrow().contains(&id)
    }

    /// Returns a copy of the current selection.
    #[must_use]
    pub fn selected(&self) -> SelectionSet {
        self.shared.changes.borrow().clone()
    }

    /// Returns the number of selected tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.changes.borrow().len()
    }

    /// Returns whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.changes.borrow().is_empty()
    }

    /// Subscribes to selection changes.
    ///
    /// Every effective mutation publishes the new set before the mutating
    /// call returns.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SelectionSet> {
        self.shared.changes.subscribe()
    }
}
