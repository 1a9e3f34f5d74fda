//! Domain model for the task list.
//!
//! Task records, their lifecycle status, sort modes and navigation routes.
//! Everything here is pure data and validation; persistence and
//! orchestration stay outside the domain boundary.

mod draft;
mod error;
mod ids;
mod route;
mod sort;
mod task;

pub use draft::{TaskDraft, TaskEdit};
pub use error::{ParseRouteError, ParseSortModeError, ParseTaskStatusError, TaskDomainError};
pub use ids::{GeoLocation, TaskId, UserId};
pub use route::{NO_SELECTION, ScreenRoute, TASK_ID_KEY};
pub use sort::SortMode;
pub use task::{DEFAULT_REMINDER_LEAD, PersistedTaskData, Task, TaskStatus};
