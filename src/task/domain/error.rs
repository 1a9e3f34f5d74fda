//! Error types for task domain validation and parsing.

use super::{TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating domain task values.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The task description is empty after trimming.
    #[error("task description must not be empty")]
    EmptyDescription,

    /// The user identifier is empty or contains whitespace.
    #[error("invalid user identifier '{0}'")]
    InvalidUserId(String),

    /// The task identifier could not be parsed.
    #[error("invalid task identifier '{0}'")]
    InvalidTaskId(String),

    /// Coordinates are outside the valid range.
    #[error("invalid location ({latitude}, {longitude})")]
    InvalidLocation {
        /// Rejected latitude.
        latitude: f64,
        /// Rejected longitude.
        longitude: f64,
    },

    /// The status change is not permitted by the lifecycle.
    #[error("task {task_id} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        /// Task identifier.
        task_id: TaskId,
        /// Current status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },
}

/// Error returned while parsing task statuses.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing sort modes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown sort mode: {0}")]
pub struct ParseSortModeError(pub String);

/// Error returned while parsing navigation routes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseRouteError {
    /// The screen name is not a known route.
    #[error("unknown screen: {0}")]
    UnknownScreen(String),

    /// A query parameter value could not be decoded.
    #[error("invalid value '{value}' for route parameter '{key}'")]
    InvalidParameter {
        /// Parameter name.
        key: String,
        /// Rejected value.
        value: String,
    },
}
