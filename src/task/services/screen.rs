//! Task list screen: gestures and menu actions routed to the controller.

use super::lifecycle::{
    BulkDeleteOutcome, PendingWrite, TaskLifecycleController, TaskLifecycleResult,
};
use super::swipe::{SwipeDeck, SwipeRelease};
use crate::task::{
    domain::{ScreenRoute, SortMode, Task, TaskId, TaskStatus},
    ports::{Navigator, TaskGateway},
};
use mockable::Clock;
use std::sync::Arc;
use tracing::debug;

/// Interaction layer of the task list.
///
/// Holds one swipe engine per visible row and forwards committed gestures,
/// checkbox toggles and menu actions to the lifecycle controller.
pub struct TaskListScreen<G, C, N>
where
    G: TaskGateway + 'static,
    C: Clock + Send + Sync + 'static,
    N: Navigator,
{
    controller: TaskLifecycleController<G, C>,
    navigator: Arc<N>,
    deck: SwipeDeck,
}

impl<G, C, N> TaskListScreen<G, C, N>
where
    G: TaskGateway + 'static,
    C: Clock + Send + Sync + 'static,
    N: Navigator,
{
    /// Creates a screen over `controller`.
    #[must_use]
    pub fn new(controller: TaskLifecycleController<G, C>, navigator: Arc<N>) -> Self {
        let deck = SwipeDeck::new(controller.config().swipe());
        Self {
            controller,
            navigator,
            deck,
        }
    }

    /// Returns the controller behind the screen.
    #[must_use]
    pub const fn controller(&self) -> &TaskLifecycleController<G, C> {
        &self.controller
    }

    /// Returns the tab being browsed.
    #[must_use]
    pub fn tab(&self) -> TaskStatus {
        self.controller.snapshot().tab
    }

    /// Switches tabs and drops gesture state of rows that left the screen.
    pub fn select_tab(&mut self, tab: TaskStatus) {
        self.controller.set_tab(tab);
        let visible: Vec<TaskId> = self.visible_tasks().iter().map(Task::id).collect();
        self.deck.retain_visible(&visible);
    }

    /// Returns the rows of the current tab.
    #[must_use]
    pub fn visible_tasks(&self) -> Vec<Task> {
        self.controller.visible_tasks()
    }

    /// Applies the sort option with the given menu label.
    ///
    /// Returns `false` for an unknown label.
    #[must_use]
    pub fn choose_sort(&self, label: &str) -> bool {
        SortMode::from_label(label).is_some_and(|mode| {
            self.controller.set_sort_mode(mode);
            true
        })
    }

    /// Opens the editor for a row.
    pub fn open_task(&self, task_id: TaskId) {
        self.navigator.open(ScreenRoute::edit(task_id));
    }

    /// Opens the editor for a new task.
    pub fn add_task(&self) {
        self.navigator.open(ScreenRoute::CreateTask);
    }

    /// Opens the settings screen.
    pub fn open_settings(&self) {
        self.navigator.open(ScreenRoute::Settings);
    }

    /// Opens the map of located tasks.
    pub fn open_map(&self) {
        self.navigator.open(ScreenRoute::TaskMap);
    }

    /// Returns the tab a row is shown under, if it is on screen.
    fn row_tab(&self, task_id: TaskId) -> Option<TaskStatus> {
        let tab = self.tab();
        self.controller
            .task(task_id)
            .filter(|task| task.status() == tab)
            .map(|_| tab)
    }

    /// Moves a row horizontally by `delta` pixels.
    pub fn drag(&mut self, task_id: TaskId, delta: f64) {
        let Some(tab) = self.row_tab(task_id) else {
            debug!(task_id = %task_id, "drag on a row that is not shown");
            return;
        };
        self.deck.engine(task_id, tab).drag(delta);
    }

    /// Ends a drag on a row `item_width` pixels wide.
    ///
    /// A committed gesture issues exactly one status transition; a spring
    /// back returns `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns the controller's error when the transition is rejected.
    pub fn release(
        &mut self,
        task_id: TaskId,
        item_width: f64,
    ) -> TaskLifecycleResult<Option<PendingWrite>> {
        let Some(tab) = self.row_tab(task_id) else {
            return Ok(None);
        };
        match self.deck.engine(task_id, tab).release(item_width) {
            SwipeRelease::SpringBack => Ok(None),
            SwipeRelease::Committed(request) => self
                .controller
                .transition_status(request.task_id, request.target)
                .map(Some),
        }
    }

    /// Sets a row's checkbox. Rows on the active tab cannot be selected.
    ///
    /// Returns whether the selection changed.
    #[must_use]
    pub fn toggle_selection(&self, task_id: TaskId, desired: bool) -> bool {
        self.controller.selection().toggle(task_id, desired)
    }

    /// Returns whether a row's checkbox is ticked.
    #[must_use]
    pub fn is_selected(&self, task_id: TaskId) -> bool {
        self.controller.selection().is_selected(task_id)
    }

    /// Returns how many rows are selected.
    #[must_use]
    pub fn selection_count(&self) -> usize {
        self.controller.selection().len()
    }

    /// Ticks every row of the current tab.
    #[must_use]
    pub fn select_all(&self) -> usize {
        self.controller.select_all_visible()
    }

    /// Unticks every row.
    pub fn clear_selection(&self) {
        self.controller.selection().clear();
    }

    /// Deletes the selected rows.
    #[must_use]
    pub fn delete_selected(&self) -> BulkDeleteOutcome {
        self.controller.delete_selected_ids()
    }
}
