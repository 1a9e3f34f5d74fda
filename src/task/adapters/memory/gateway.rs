//! In-memory task gateway for tests and local runs.

use async_trait::async_trait;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::{Semaphore, mpsc};
use tracing::debug;

use crate::task::{
    domain::{Task, TaskId, UserId},
    ports::{TaskGateway, TaskGatewayError, TaskGatewayResult, TaskPatch, TaskSnapshotStream},
};

const SNAPSHOT_BUFFER: usize = 64;

/// Thread-safe in-memory task store.
///
/// Besides the gateway contract it exposes hooks to inject write failures,
/// hold writes until released, and push remote-side changes to subscribers.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    records: Vec<StoredTask>,
    subscribers: Vec<Subscriber>,
    failing_writes: usize,
    failing_subscriptions: usize,
    write_gate: Option<Arc<Semaphore>>,
    server_assigned_ids: bool,
    writes_received: usize,
}

#[derive(Debug, Clone)]
struct StoredTask {
    owner: UserId,
    task: Task,
}

#[derive(Debug)]
struct Subscriber {
    owner: UserId,
    sender: mpsc::Sender<TaskGatewayResult<Vec<Task>>>,
}

fn poisoned(err: impl ToString) -> TaskGatewayError {
    TaskGatewayError::unavailable(std::io::Error::other(err.to_string()))
}

fn injected_failure() -> TaskGatewayError {
    TaskGatewayError::unavailable(std::io::Error::other("injected write failure"))
}

impl InMemoryGatewayState {
    fn snapshot_for(&self, owner: &UserId) -> Vec<Task> {
        self.records
            .iter()
            .filter(|record| &record.owner == owner)
            .map(|record| record.task.clone())
            .collect()
    }

    fn owner_of(&self, task_id: TaskId) -> Option<UserId> {
        self.records
            .iter()
            .find(|record| record.task.id() == task_id)
            .map(|record| record.owner.clone())
    }

    /// Pushes the owner's snapshot to live subscribers, dropping closed ones.
    fn publish(&mut self, owner: &UserId) {
        let snapshot = self.snapshot_for(owner);
        self.subscribers.retain(|subscriber| {
            if &subscriber.owner != owner {
                return !subscriber.sender.is_closed();
            }
            subscriber.sender.try_send(Ok(snapshot.clone())).is_ok()
        });
    }

    /// Counts the write and consumes one injected failure, if any.
    fn admit_write(&mut self) -> WriteAdmission {
        self.writes_received += 1;
        let fails = self.failing_writes > 0;
        if fails {
            self.failing_writes -= 1;
        }
        WriteAdmission {
            gate: self.write_gate.clone(),
            fails,
        }
    }
}

impl InMemoryTaskGateway {
    /// Creates an empty in-memory gateway.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> TaskGatewayResult<RwLockReadGuard<'_, InMemoryGatewayState>> {
        self.state.read().map_err(poisoned)
    }

    fn write(&self) -> TaskGatewayResult<RwLockWriteGuard<'_, InMemoryGatewayState>> {
        self.state.write().map_err(poisoned)
    }

    /// Stores tasks directly, bypassing the write path, and notifies
    /// subscribers.
    ///
    /// # Errors
    ///
    /// Returns gateway errors when lock acquisition fails.
    pub fn seed(
        &self,
        owner: &UserId,
        tasks: impl IntoIterator<Item = Task>,
    ) -> TaskGatewayResult<()> {
        let mut state = self.write()?;
        for task in tasks {
            state.records.retain(|record| record.task.id() != task.id());
            state.records.push(StoredTask {
                owner: owner.clone(),
                task,
            });
        }
        state.publish(owner);
        Ok(())
    }

    /// Removes a task as another writer would, and notifies subscribers.
    ///
    /// # Errors
    ///
    /// Returns gateway errors when lock acquisition fails.
    pub fn remove_remotely(&self, task_id: TaskId) -> TaskGatewayResult<()> {
        let mut state = self.write()?;
        let Some(owner) = state.owner_of(task_id) else {
            return Ok(());
        };
        state.records.retain(|record| record.task.id() != task_id);
        state.publish(&owner);
        Ok(())
    }

    /// Sends a stream error to every subscriber of `owner`.
    ///
    /// # Errors
    ///
    /// Returns gateway errors when lock acquisition fails.
    pub fn emit_subscription_error(
        &self,
        owner: &UserId,
        error: TaskGatewayError,
    ) -> TaskGatewayResult<()> {
        let state = self.read()?;
        for subscriber in state.subscribers.iter().filter(|s| &s.owner == owner) {
            if subscriber.sender.try_send(Err(error.clone())).is_err() {
                debug!(owner = %owner, "subscriber not listening; stream error dropped");
            }
        }
        Ok(())
    }

    /// Makes the next `count` create/update/delete calls fail.
    ///
    /// # Errors
    ///
    /// Returns gateway errors when lock acquisition fails.
    pub fn fail_next_writes(&self, count: usize) -> TaskGatewayResult<()> {
        self.write()?.failing_writes = count;
        Ok(())
    }

    /// Makes the next `count` subscribe calls fail.
    ///
    /// # Errors
    ///
    /// Returns gateway errors when lock acquisition fails.
    pub fn fail_next_subscriptions(&self, count: usize) -> TaskGatewayResult<()> {
        self.write()?.failing_subscriptions = count;
        Ok(())
    }

    /// Holds every subsequent write until released.
    ///
    /// Held writes resume in arrival order, one per released permit.
    ///
    /// # Errors
    ///
    /// Returns gateway errors when lock acquisition fails.
    pub fn hold_writes(&self) -> TaskGatewayResult<()> {
        self.write()?.write_gate = Some(Arc::new(Semaphore::new(0)));
        Ok(())
    }

    /// Lets `count` held writes proceed.
    ///
    /// # Errors
    ///
    /// Returns gateway errors when lock acquisition fails.
    pub fn release_writes(&self, count: usize) -> TaskGatewayResult<()> {
        if let Some(gate) = &self.read()?.write_gate {
            gate.add_permits(count);
        }
        Ok(())
    }

    /// Stops holding writes and lets every waiting write through.
    ///
    /// # Errors
    ///
    /// Returns gateway errors when lock acquisition fails.
    pub fn open_writes(&self) -> TaskGatewayResult<()> {
        if let Some(gate) = self.write()?.write_gate.take() {
            gate.close();
        }
        Ok(())
    }

    /// Files created tasks under fresh identifiers instead of the caller's.
    ///
    /// # Errors
    ///
    /// Returns gateway errors when lock acquisition fails.
    pub fn assign_server_ids(&self) -> TaskGatewayResult<()> {
        self.write()?.server_assigned_ids = true;
        Ok(())
    }

    /// Returns the stored copy of a task.
    ///
    /// # Errors
    ///
    /// Returns gateway errors when lock acquisition fails.
    pub fn stored(&self, task_id: TaskId) -> TaskGatewayResult<Option<Task>> {
        Ok(self
            .read()?
            .records
            .iter()
            .find(|record| record.task.id() == task_id)
            .map(|record| record.task.clone()))
    }

    /// Returns how many create/update/delete calls reached the gateway.
    ///
    /// # Errors
    ///
    /// Returns gateway errors when lock acquisition fails.
    pub fn writes_received(&self) -> TaskGatewayResult<usize> {
        Ok(self.read()?.writes_received)
    }
}

/// Fate of one write, decided when it arrives.
struct WriteAdmission {
    gate: Option<Arc<Semaphore>>,
    fails: bool,
}

impl WriteAdmission {
    /// Waits for a permit when writes are held, then reports the injected
    /// outcome. A closed gate lets writes pass.
    async fn settle(self) -> TaskGatewayResult<()> {
        if let Some(semaphore) = self.gate
            && let Ok(permit) = semaphore.acquire().await
        {
            permit.forget();
        }
        if self.fails {
            return Err(injected_failure());
        }
        Ok(())
    }
}

#[async_trait]
impl TaskGateway for InMemoryTaskGateway {
    async fn create(&self, owner: &UserId, task: &Task) -> TaskGatewayResult<TaskId> {
        let admission = self.write()?.admit_write();
        admission.settle().await?;

        let mut state = self.write()?;
        let mut stored = task.clone();
        if state.server_assigned_ids {
            stored.reassign_id(TaskId::new());
        }
        let stored_id = stored.id();
        state.records.retain(|record| record.task.id() != stored_id);
        state.records.push(StoredTask {
            owner: owner.clone(),
            task: stored,
        });
        state.publish(owner);
        Ok(stored_id)
    }

    async fn update(&self, task_id: TaskId, patch: &TaskPatch) -> TaskGatewayResult<()> {
        let admission = self.write()?.admit_write();
        admission.settle().await?;

        let mut state = self.write()?;
        let record = state
            .records
            .iter_mut()
            .find(|record| record.task.id() == task_id)
            .ok_or(TaskGatewayError::NotFound(task_id))?;
        patch.apply_to(&mut record.task);
        let owner = record.owner.clone();
        state.publish(&owner);
        Ok(())
    }

    async fn delete(&self, task_id: TaskId) -> TaskGatewayResult<()> {
        let admission = self.write()?.admit_write();
        admission.settle().await?;

        let mut state = self.write()?;
        let owner = state
            .owner_of(task_id)
            .ok_or(TaskGatewayError::NotFound(task_id))?;
        state.records.retain(|record| record.task.id() != task_id);
        state.publish(&owner);
        Ok(())
    }

    async fn subscribe(&self, owner: &UserId) -> TaskGatewayResult<TaskSnapshotStream> {
        let mut state = self.write()?;
        if state.failing_subscriptions > 0 {
            state.failing_subscriptions -= 1;
            return Err(TaskGatewayError::unavailable(std::io::Error::other(
                "injected subscription failure",
            )));
        }
        let (sender, receiver) = mpsc::channel(SNAPSHOT_BUFFER);
        if sender.try_send(Ok(state.snapshot_for(owner))).is_err() {
            debug!(owner = %owner, "initial snapshot not delivered");
        }
        state.subscribers.push(Subscriber {
            owner: owner.clone(),
            sender,
        });
        Ok(receiver)
    }
}
