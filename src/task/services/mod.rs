//! Application services for the task list: the lifecycle controller and the
//! gesture, selection and view logic around it.

mod config;
mod lifecycle;
mod screen;
mod selection;
mod swipe;
mod view;

pub use config::{
    DEFAULT_COMMIT_THRESHOLD, DEFAULT_WRITE_TIMEOUT, TaskListConfig, TaskListConfigError,
};
pub use lifecycle::{
    BulkDeleteOutcome, PendingWrite, RemoteSubscription, TaskLifecycleController,
    TaskLifecycleError, TaskLifecycleResult, TaskListSnapshot, WriteOutcome,
};
pub use screen::TaskListScreen;
pub use selection::{SelectionSet, SelectionSynchronizer};
pub use swipe::{
    SwipeAnchor, SwipeConfig, SwipeDeck, SwipeEngine, SwipePolarity, SwipeRelease,
    TransitionRequest,
};
pub use view::{view, visible_ids};
