//! Gateway port for the remote task store.

use crate::task::domain::{Task, TaskEdit, TaskId, TaskStatus, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Result type for gateway operations.
pub type TaskGatewayResult<T> = Result<T, TaskGatewayError>;

/// Stream of full per-owner snapshots delivered by [`TaskGateway::subscribe`].
///
/// Dropping the receiver unsubscribes.
pub type TaskSnapshotStream = mpsc::Receiver<TaskGatewayResult<Vec<Task>>>;

/// Partial update sent for an existing task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "changes", rename_all = "snake_case")]
pub enum TaskPatch {
    /// Status change.
    Status(TaskStatus),
    /// Field edits applied in order.
    Fields(Vec<TaskEdit>),
}

impl TaskPatch {
    /// Applies the patch to a stored record.
    pub fn apply_to(&self, task: &mut Task) {
        match self {
            Self::Status(status) => task.set_status(*status),
            Self::Fields(edits) => {
                for edit in edits {
                    task.apply_edit(edit);
                }
            }
        }
    }
}

/// Asynchronous task store contract.
#[async_trait]
pub trait TaskGateway: Send + Sync {
    /// Stores a new task for `owner`.
    ///
    /// Returns the identifier the store filed the task under.
    async fn create(&self, owner: &UserId, task: &Task) -> TaskGatewayResult<TaskId>;

    /// Applies a patch to an existing task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskGatewayError::NotFound`] when the record no longer
    /// exists.
    async fn update(&self, task_id: TaskId, patch: &TaskPatch) -> TaskGatewayResult<()>;

    /// Permanently removes a task.
    async fn delete(&self, task_id: TaskId) -> TaskGatewayResult<()>;

    /// Subscribes to snapshots of every task owned by `owner`.
    ///
    /// Emissions are ordered per stream; no ordering is guaranteed relative
    /// to writes issued by the caller.
    async fn subscribe(&self, owner: &UserId) -> TaskGatewayResult<TaskSnapshotStream>;
}

/// Errors returned by gateway implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskGatewayError {
    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Network or backend failure.
    #[error("task store unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskGatewayError {
    /// Wraps a backend error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
