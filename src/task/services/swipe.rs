//! Horizontal swipe gestures on list rows.
//!
//! Each row owns a [`SwipeEngine`] that tracks the drag offset and decides,
//! on release, whether the gesture commits a status transition or springs
//! back. Which anchors a row can reach depends on the tab it is shown under.

use super::config::DEFAULT_COMMIT_THRESHOLD;
use crate::task::domain::{TaskId, TaskStatus};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

/// Resting position of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwipeAnchor {
    /// Swiped fully to the left (`-1`).
    Left,
    /// At rest (`0`).
    Neutral,
    /// Swiped fully to the right (`+1`).
    Right,
}

impl SwipeAnchor {
    /// Returns the signed anchor value.
    #[must_use]
    pub const fn value(self) -> i8 {
        match self {
            Self::Left => -1,
            Self::Neutral => 0,
            Self::Right => 1,
        }
    }
}

/// Assignment of active-tab gestures to sides.
///
/// Only the active tab is affected. Completed rows always restore from the
/// left and deleted rows from the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipePolarity {
    /// Left completes and right deletes.
    #[default]
    LeftCompletes,
    /// Left deletes and right completes.
    LeftDeletes,
}

impl SwipePolarity {
    /// Returns the side that completes an active task.
    const fn completing_side(self) -> SwipeAnchor {
        match self {
            Self::LeftCompletes => SwipeAnchor::Left,
            Self::LeftDeletes => SwipeAnchor::Right,
        }
    }

    /// Returns the status a commit to `anchor` requests on `tab`.
    fn target(self, tab: TaskStatus, anchor: SwipeAnchor) -> Option<TaskStatus> {
        match (tab, anchor) {
            (_, SwipeAnchor::Neutral) => None,
            (TaskStatus::Active, side) if side == self.completing_side() => {
                Some(TaskStatus::Completed)
            }
            (TaskStatus::Active, _) => Some(TaskStatus::Deleted),
            (TaskStatus::Completed, SwipeAnchor::Left)
            | (TaskStatus::Deleted, SwipeAnchor::Right) => Some(TaskStatus::Active),
            (TaskStatus::Completed | TaskStatus::Deleted, _) => None,
        }
    }
}

/// Swipe settings shared by every row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeConfig {
    /// Fraction of the item width a drag must cover to commit.
    pub commit_threshold: f64,
    /// Side assignment on the active tab.
    pub polarity: SwipePolarity,
}

impl SwipeConfig {
    /// Returns the threshold used on release.
    ///
    /// A threshold outside `(0, 1]` falls back to
    /// [`DEFAULT_COMMIT_THRESHOLD`], so a tap never commits.
    #[must_use]
    pub const fn effective_threshold(&self) -> f64 {
        let threshold = self.commit_threshold;
        if threshold > 0.0 && threshold <= 1.0 {
            threshold
        } else {
            DEFAULT_COMMIT_THRESHOLD
        }
    }
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            commit_threshold: DEFAULT_COMMIT_THRESHOLD,
            polarity: SwipePolarity::default(),
        }
    }
}

/// Status change requested by a committed swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRequest {
    /// Task being moved.
    pub task_id: TaskId,
    /// Requested status.
    pub target: TaskStatus,
}

/// Outcome of releasing a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeRelease {
    /// The row returns to neutral without side effects.
    SpringBack,
    /// The row committed; the request must be forwarded exactly once.
    Committed(TransitionRequest),
}

/// Gesture state of a single row.
#[derive(Debug, Clone, PartialEq)]
pub struct SwipeEngine {
    task_id: TaskId,
    tab: TaskStatus,
    config: SwipeConfig,
    drag_offset: f64,
}

impl SwipeEngine {
    /// Creates a neutral engine for a row shown on `tab`.
    #[must_use]
    pub const fn new(task_id: TaskId, tab: TaskStatus, config: SwipeConfig) -> Self {
        Self {
            task_id,
            tab,
            config,
            drag_offset: 0.0,
        }
    }

    /// Returns the task this engine drives.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the tab the row is shown under.
    #[must_use]
    pub const fn tab(&self) -> TaskStatus {
        self.tab
    }

    /// Returns the anchor the current drag leans towards, which decides
    /// the action hint drawn behind the row.
    #[must_use]
    pub const fn leaning(&self) -> SwipeAnchor {
        if self.drag_offset < 0.0 {
            SwipeAnchor::Left
        } else if self.drag_offset > 0.0 {
            SwipeAnchor::Right
        } else {
            SwipeAnchor::Neutral
        }
    }

    /// Returns the current drag offset in pixels.
    #[must_use]
    pub const fn drag_offset(&self) -> f64 {
        self.drag_offset
    }

    /// Returns the anchors a row on this tab can rest at.
    #[must_use]
    pub fn reachable_anchors(&self) -> Vec<SwipeAnchor> {
        [SwipeAnchor::Left, SwipeAnchor::Neutral, SwipeAnchor::Right]
            .into_iter()
            .filter(|anchor| self.is_reachable(*anchor))
            .collect()
    }

    fn is_reachable(&self, anchor: SwipeAnchor) -> bool {
        matches!(anchor, SwipeAnchor::Neutral)
            || self.config.polarity.target(self.tab, anchor).is_some()
    }

    /// Moves the row by `delta` pixels (negative is left).
    ///
    /// The offset never points towards an unreachable anchor; non-finite
    /// deltas are ignored.
    #[expect(
        clippy::float_arithmetic,
        reason = "drag offsets are accumulated pointer deltas"
    )]
    pub fn drag(&mut self, delta: f64) {
        if !delta.is_finite() {
            return;
        }
        let moved = self.drag_offset + delta;
        let floor = if self.is_reachable(SwipeAnchor::Left) {
            f64::NEG_INFINITY
        } else {
            0.0
        };
        let ceiling = if self.is_reachable(SwipeAnchor::Right) {
            f64::INFINITY
        } else {
            0.0
        };
        self.drag_offset = moved.clamp(floor, ceiling);
    }

    /// Ends the gesture on a row `item_width` pixels wide.
    ///
    /// Commits when the drag covers at least the threshold fraction of the
    /// width towards a reachable anchor, using
    /// [`SwipeConfig::effective_threshold`]. The engine always ends up
    /// neutral, so a commit is reported once. A non-positive width always
    /// springs back.
    #[expect(
        clippy::float_arithmetic,
        reason = "commit decision compares the dragged fraction of the width"
    )]
    pub fn release(&mut self, item_width: f64) -> SwipeRelease {
        let offset = std::mem::take(&mut self.drag_offset);
        if !(item_width.is_finite() && item_width > 0.0) {
            return SwipeRelease::SpringBack;
        }
        let fraction = offset / item_width;
        let threshold = self.config.effective_threshold();
        let anchor = if fraction <= -threshold {
            SwipeAnchor::Left
        } else if fraction >= threshold {
            SwipeAnchor::Right
        } else {
            return SwipeRelease::SpringBack;
        };
        self.config
            .polarity
            .target(self.tab, anchor)
            .map_or(SwipeRelease::SpringBack, |target| {
                SwipeRelease::Committed(TransitionRequest {
                    task_id: self.task_id,
                    target,
                })
            })
    }
}

/// Swipe engines for the rows currently on screen.
#[derive(Debug, Clone, Default)]
pub struct SwipeDeck {
    config: SwipeConfig,
    engines: HashMap<TaskId, SwipeEngine>,
}

impl SwipeDeck {
    /// Creates an empty deck.
    #[must_use]
    pub fn new(config: SwipeConfig) -> Self {
        Self {
            config,
            engines: HashMap::new(),
        }
    }

    /// Returns the engine for `task_id` shown on `tab`.
    ///
    /// A row that reappears under a different tab starts again from neutral.
    pub fn engine(&mut self, task_id: TaskId, tab: TaskStatus) -> &mut SwipeEngine {
        let config = self.config;
        let engine = self
            .engines
            .entry(task_id)
            .or_insert_with(|| SwipeEngine::new(task_id, tab, config));
        if engine.tab != tab {
            *engine = SwipeEngine::new(task_id, tab, config);
        }
        engine
    }

    /// Drops engines of rows that are no longer visible.
    pub fn retain_visible(&mut self, visible: &[TaskId]) {
        let keep: HashSet<&TaskId> = visible.iter().collect();
        self.engines.retain(|task_id, _| keep.contains(task_id));
    }

    /// Returns how many rows currently hold an engine.
    #[must_use]
    pub fn len(&self) -> usize {
        self.engines.len()
    }

    /// Returns whether no row holds an engine.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}
