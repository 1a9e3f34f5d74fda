//! Task lifecycle controller: the single owner of the task collection.
//!
//! Every mutation is applied to the local collection first and published,
//! then persisted through a spawned gateway call. Completions reconcile the
//! collection under the same lock, so the controller never holds it across
//! an `.await`.

use super::config::TaskListConfig;
use super::selection::SelectionSynchronizer;
use super::view::{view, visible_ids};
use crate::task::{
    domain::{SortMode, Task, TaskDomainError, TaskDraft, TaskEdit, TaskId, TaskStatus, UserId},
    ports::{TaskGateway, TaskGatewayError, TaskPatch},
};
use mockable::Clock;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Service-level errors for task lifecycle operations.
///
/// Cloneable so the most recent failure can be carried in snapshots.
#[derive(Debug, Clone, Error)]
pub enum TaskLifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),

    /// The task is not in the loaded collection.
    #[error("task {0} is not loaded")]
    UnknownTask(TaskId),

    /// The gateway rejected a write.
    #[error(transparent)]
    Gateway(#[from] TaskGatewayError),

    /// The gateway did not settle a write in time.
    #[error("write for task {task_id} did not settle within {timeout:?}")]
    WriteTimedOut {
        /// Task being written.
        task_id: TaskId,
        /// Configured write timeout.
        timeout: Duration,
    },

    /// The remote subscription failed.
    #[error("task subscription failed: {0}")]
    Subscription(TaskGatewayError),

    /// The spawned gateway call ended without a result.
    #[error("write for task {0} was aborted")]
    WriteAborted(TaskId),

    /// The task is still being created in the store.
    #[error("task {0} is still being created")]
    CreateInFlight(TaskId),
}

/// Result type for task lifecycle operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Per-item results of a bulk delete.
pub type BulkDeleteOutcome = Vec<(TaskId, TaskLifecycleResult<PendingWrite>)>;

/// Read-only view state published after every change.
#[derive(Debug, Clone)]
pub struct TaskListSnapshot {
    /// Full loaded collection in load order.
    pub tasks: Vec<Task>,
    /// Whether the first remote emission is still outstanding.
    pub is_loading: bool,
    /// Most recent failure surfaced to the user.
    pub last_error: Option<TaskLifecycleError>,
    /// Tab the user is browsing.
    pub tab: TaskStatus,
    /// Ordering applied to the tab.
    pub sort_mode: SortMode,
}

impl TaskListSnapshot {
    /// Returns the rows shown on the current tab, in display order.
    #[must_use]
    pub fn visible(&self) -> Vec<&Task> {
        view(&self.tasks, self.tab, self.sort_mode)
    }
}

/// Final state of one persisted mutation.
#[derive(Debug, Clone)]
pub enum WriteOutcome {
    /// Nothing was sent to the store.
    Unchanged,
    /// The gateway accepted the write.
    Confirmed,
    /// The gateway stored a new task under the returned identifier.
    Created(TaskId),
    /// The gateway rejected a status change; the previous status is back.
    Reverted(TaskLifecycleError),
    /// Field edits failed; the local values are kept and marked unsynced.
    Unsynced(TaskLifecycleError),
    /// Creation failed; the task stays as a local-only record.
    LocalOnly(TaskLifecycleError),
    /// The task no longer exists remotely and was dropped locally.
    Pruned,
    /// A newer write for the same task superseded this one.
    Superseded,
    /// The reconciliation task ended without reporting.
    Aborted,
}

impl WriteOutcome {
    /// Returns the failure carried by this outcome, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&TaskLifecycleError> {
        match self {
            Self::Reverted(err) | Self::Unsynced(err) | Self::LocalOnly(err) => Some(err),
            _ => None,
        }
    }
}

/// Handle to a write issued by the controller.
///
/// Dropping the handle does not cancel the write.
#[derive(Debug)]
pub struct PendingWrite {
    task_id: TaskId,
    state: PendingState,
}

#[derive(Debug)]
enum PendingState {
    Ready(WriteOutcome),
    Spawned(JoinHandle<WriteOutcome>),
}

impl PendingWrite {
    const fn ready(task_id: TaskId, outcome: WriteOutcome) -> Self {
        Self {
            task_id,
            state: PendingState::Ready(outcome),
        }
    }

    const fn unchanged(task_id: TaskId) -> Self {
        Self::ready(task_id, WriteOutcome::Unchanged)
    }

    /// Returns the task the write targets.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns whether the call was a no-op that issued no write.
    #[must_use]
    pub const fn is_unchanged(&self) -> bool {
        matches!(self.state, PendingState::Ready(WriteOutcome::Unchanged))
    }

    /// Waits until the write has been reconciled with the collection.
    pub async fn settled(self) -> WriteOutcome {
        match self.state {
            PendingState::Ready(outcome) => outcome,
            PendingState::Spawned(handle) => handle.await.unwrap_or(WriteOutcome::Aborted),
        }
    }
}

/// Live remote subscription feeding the controller.
///
/// Cancelling or dropping it stops applying remote emissions; writes
/// already in flight still settle.
#[derive(Debug)]
pub struct RemoteSubscription {
    listener: JoinHandle<()>,
}

impl RemoteSubscription {
    /// Stops listening for remote emissions.
    pub fn cancel(self) {
        self.listener.abort();
    }

    /// Returns whether the remote stream has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.listener.is_finished()
    }
}

impl Drop for RemoteSubscription {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WritePhase {
    Applied,
    Confirmed,
    Reverted,
    Unsynced,
}

#[derive(Debug, Clone, Copy)]
struct WriteState {
    seq: u64,
    phase: WritePhase,
}

/// Local effect a completion has to reconcile.
#[derive(Debug)]
enum WriteKind {
    Create(Box<Task>),
    Status {
        previous: TaskStatus,
        target: TaskStatus,
    },
    Edits(Vec<TaskEdit>),
    Purge {
        position: usize,
        task: Box<Task>,
    },
}

/// Owned gateway call moved onto the runtime.
enum GatewayRequest {
    Create { owner: UserId, task: Box<Task> },
    Update(TaskPatch),
    Delete,
}

impl WriteKind {
    fn request(&self) -> GatewayRequest {
        match self {
            Self::Create(task) => GatewayRequest::Create {
                owner: task.owner().clone(),
                task: task.clone(),
            },
            Self::Status { target, .. } => GatewayRequest::Update(TaskPatch::Status(*target)),
            Self::Edits(edits) => GatewayRequest::Update(TaskPatch::Fields(edits.clone())),
            Self::Purge { .. } => GatewayRequest::Delete,
        }
    }
}

#[derive(Debug)]
struct ControllerState {
    tasks: Vec<Task>,
    tab: TaskStatus,
    sort_mode: SortMode,
    is_loading: bool,
    last_error: Option<TaskLifecycleError>,
    next_seq: u64,
    writes: HashMap<TaskId, WriteState>,
    pending_edits: HashMap<TaskId, Vec<TaskEdit>>,
    edit_generation: HashMap<TaskId, u64>,
    unsynced: HashSet<TaskId>,
    local_only: HashSet<TaskId>,
    purging: HashSet<TaskId>,
}

impl ControllerState {
    fn new(sort_mode: SortMode) -> Self {
        Self {
            tasks: Vec::new(),
            tab: TaskStatus::Active,
            sort_mode,
            is_loading: false,
            last_error: None,
            next_seq: 0,
            writes: HashMap::new(),
            pending_edits: HashMap::new(),
            edit_generation: HashMap::new(),
            unsynced: HashSet::new(),
            local_only: HashSet::new(),
            purging: HashSet::new(),
        }
    }

    fn find(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id() == task_id)
    }

    fn find_mut(&mut self, task_id: TaskId) -> TaskLifecycleResult<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|task| task.id() == task_id)
            .ok_or(TaskLifecycleError::UnknownTask(task_id))
    }

    /// Records a new write as the latest for `task_id`.
    fn issue_write(&mut self, task_id: TaskId) -> u64 {
        self.next_seq += 1;
        let seq = self.next_seq;
        self.writes.insert(
            task_id,
            WriteState {
                seq,
                phase: WritePhase::Applied,
            },
        );
        seq
    }

    fn is_latest(&self, task_id: TaskId, seq: u64) -> bool {
        self.writes
            .get(&task_id)
            .is_some_and(|write| write.seq == seq)
    }

    fn settle_phase(&mut self, task_id: TaskId, seq: u64, phase: WritePhase) {
        if let Some(write) = self.writes.get_mut(&task_id)
            && write.seq == seq
        {
            write.phase = phase;
        }
    }

    /// Returns whether a local-only task is waiting on its create.
    fn create_in_flight(&self, task_id: TaskId) -> bool {
        self.local_only.contains(&task_id)
            && self
                .writes
                .get(&task_id)
                .is_some_and(|write| write.phase == WritePhase::Applied)
    }

    /// Returns whether the local copy must win over remote emissions.
    fn is_protected(&self, task_id: TaskId) -> bool {
        self.writes
            .get(&task_id)
            .is_some_and(|write| write.phase == WritePhase::Applied)
            || self.pending_edits.contains_key(&task_id)
            || self.unsynced.contains(&task_id)
            || self.local_only.contains(&task_id)
    }

    /// Drops every record of a task that is gone for good.
    fn forget(&mut self, task_id: TaskId) {
        self.tasks.retain(|task| task.id() != task_id);
        self.writes.remove(&task_id);
        self.pending_edits.remove(&task_id);
        self.edit_generation.remove(&task_id);
        self.unsynced.remove(&task_id);
        self.local_only.remove(&task_id);
    }

    /// Moves a local-only record to the identifier the store assigned.
    fn rekey(&mut self, local_id: TaskId, stored_id: TaskId) {
        self.tasks
            .retain(|task| task.id() != stored_id || task.id() == local_id);
        if let Some(task) = self.tasks.iter_mut().find(|task| task.id() == local_id) {
            task.reassign_id(stored_id);
        }
        if let Some(write) = self.writes.remove(&local_id) {
            self.writes.insert(stored_id, write);
        }
        if let Some(edits) = self.pending_edits.remove(&local_id) {
            self.pending_edits.insert(stored_id, edits);
        }
        if let Some(generation) = self.edit_generation.remove(&local_id) {
            self.edit_generation.insert(stored_id, generation);
        }
        if self.unsynced.remove(&local_id) {
            self.unsynced.insert(stored_id);
        }
    }

    fn selectable_ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks
            .iter()
            .filter(|task| task.status().is_selectable())
            .map(Task::id)
    }

    fn snapshot(&self) -> TaskListSnapshot {
        TaskListSnapshot {
            tasks: self.tasks.clone(),
            is_loading: self.is_loading,
            last_error: self.last_error.clone(),
            tab: self.tab,
            sort_mode: self.sort_mode,
        }
    }
}

struct ControllerInner<G, C> {
    gateway: Arc<G>,
    clock: Arc<C>,
    selection: SelectionSynchronizer,
    config: TaskListConfig,
    state: Mutex<ControllerState>,
    snapshots: watch::Sender<TaskListSnapshot>,
}

/// Task lifecycle orchestration for one list session.
///
/// Writes are spawned on the Tokio runtime; every method that issues a
/// write must be called from within a runtime.
pub struct TaskLifecycleController<G, C>
where
    G: TaskGateway + 'static,
    C: Clock + Send + Sync + 'static,
{
    inner: Arc<ControllerInner<G, C>>,
}

impl<G, C> Clone for TaskLifecycleController<G, C>
where
    G: TaskGateway + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G, C> TaskLifecycleController<G, C>
where
    G: TaskGateway + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a controller with an empty collection.
    ///
    /// An invalid configuration is logged; swipes then use the default
    /// commit threshold.
    #[must_use]
    pub fn new(
        gateway: Arc<G>,
        clock: Arc<C>,
        selection: SelectionSynchronizer,
        config: TaskListConfig,
    ) -> Self {
        if let Err(err) = config.validate() {
            warn!(error = %err, "invalid task list configuration");
        }
        let state = ControllerState::new(config.default_sort);
        let (snapshots, _) = watch::channel(state.snapshot());
        Self {
            inner: Arc::new(ControllerInner {
                gateway,
                clock,
                selection,
                config,
                state: Mutex::new(state),
                snapshots,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes `state` and prunes the selection to its eligible tasks.
    fn commit(&self, state: &ControllerState) {
        self.inner.selection.retain_eligible(state.selectable_ids());
        let snapshot = state.snapshot();
        self.inner.snapshots.send_modify(|current| *current = snapshot);
    }

    /// Returns the shared selection.
    #[must_use]
    pub fn selection(&self) -> &SelectionSynchronizer {
        &self.inner.selection
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &TaskListConfig {
        &self.inner.config
    }

    /// Returns the current view state.
    #[must_use]
    pub fn snapshot(&self) -> TaskListSnapshot {
        self.inner.snapshots.borrow().clone()
    }

    /// Subscribes to view state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TaskListSnapshot> {
        self.inner.snapshots.subscribe()
    }

    /// Returns the loaded copy of a task.
    #[must_use]
    pub fn task(&self, task_id: TaskId) -> Option<Task> {
        self.lock().find(task_id).cloned()
    }

    /// Returns whether a task carries edits the store has not accepted.
    #[must_use]
    pub fn is_unsynced(&self, task_id: TaskId) -> bool {
        self.lock().unsynced.contains(&task_id)
    }

    /// Returns whether a task exists only locally after a failed create.
    #[must_use]
    pub fn is_local_only(&self, task_id: TaskId) -> bool {
        self.lock().local_only.contains(&task_id)
    }

    /// Clears the surfaced error.
    pub fn dismiss_error(&self) {
        let mut state = self.lock();
        if state.last_error.take().is_some() {
            self.commit(&state);
        }
    }

    /// Switches the browsed tab. Moving to the active tab clears the
    /// selection.
    pub fn set_tab(&self, tab: TaskStatus) {
        let mut state = self.lock();
        state.tab = tab;
        self.inner.selection.on_tab_changed(tab);
        self.commit(&state);
    }

    /// Changes the ordering of the browsed tab.
    pub fn set_sort_mode(&self, sort_mode: SortMode) {
        let mut state = self.lock();
        state.sort_mode = sort_mode;
        self.commit(&state);
    }

    /// Returns the rows of the current tab, in display order.
    #[must_use]
    pub fn visible_tasks(&self) -> Vec<Task> {
        let state = self.lock();
        view(&state.tasks, state.tab, state.sort_mode)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Selects every visible row of the current tab.
    ///
    /// Does nothing on the active tab. Returns how many rows were added.
    #[must_use]
    pub fn select_all_visible(&self) -> usize {
        let state = self.lock();
        if !state.tab.is_selectable() {
            return 0;
        }
        let visible = visible_ids(&state.tasks, state.tab, state.sort_mode);
        self.inner.selection.select_all(visible)
    }

    /// Creates a task from a draft and persists it.
    ///
    /// The task is appended locally as active before the store answers.
    /// If the store rejects it, the record stays flagged local-only and the
    /// error is surfaced; it is not retried automatically.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] for an invalid draft; such a
    /// draft never reaches the gateway.
    pub fn create(&self, draft: TaskDraft) -> TaskLifecycleResult<PendingWrite> {
        draft.validate()?;
        let task = Task::from_draft(draft, &*self.inner.clock);
        let task_id = task.id();
        let seq = {
            let mut state = self.lock();
            state.tasks.push(task.clone());
            state.local_only.insert(task_id);
            let seq = state.issue_write(task_id);
            self.commit(&state);
            seq
        };
        debug!(task_id = %task_id, "task created locally");
        Ok(self.spawn_write(task_id, seq, WriteKind::Create(Box::new(task))))
    }

    /// Sends a local-only task to the store again.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::UnknownTask`] when the task is not
    /// loaded.
    pub fn retry_create(&self, task_id: TaskId) -> TaskLifecycleResult<PendingWrite> {
        let (seq, task) = {
            let mut state = self.lock();
            let task = state.find_mut(task_id)?.clone();
            if !state.local_only.contains(&task_id) || state.create_in_flight(task_id) {
                return Ok(PendingWrite::unchanged(task_id));
            }
            state.pending_edits.remove(&task_id);
            (state.issue_write(task_id), task)
        };
        debug!(task_id = %task_id, "retrying task creation");
        Ok(self.spawn_write(task_id, seq, WriteKind::Create(Box::new(task))))
    }

    /// Drops a local-only task without contacting the store.
    ///
    /// Returns whether the task was discarded. Stored tasks, and tasks whose
    /// create is still in flight, are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::UnknownTask`] when the task is not
    /// loaded.
    pub fn discard_local(&self, task_id: TaskId) -> TaskLifecycleResult<bool> {
        let mut state = self.lock();
        state.find_mut(task_id)?;
        if !state.local_only.contains(&task_id) || state.create_in_flight(task_id) {
            return Ok(false);
        }
        state.forget(task_id);
        self.commit(&state);
        Ok(true)
    }

    /// Applies a field edit locally and queues it for persistence.
    ///
    /// Edits are persisted by [`Self::flush_edits`], or automatically after
    /// the configured debounce period.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::UnknownTask`] when the task is not
    /// loaded.
    pub fn update_field(&self, task_id: TaskId, edit: TaskEdit) -> TaskLifecycleResult<()> {
        let generation = {
            let mut state = self.lock();
            state.find_mut(task_id)?.apply_edit(&edit);
            state.pending_edits.entry(task_id).or_default().push(edit);
            let counter = state.edit_generation.entry(task_id).or_insert(0);
            *counter += 1;
            let generation = *counter;
            self.commit(&state);
            generation
        };
        if let Some(delay) = self.inner.config.edit_debounce {
            self.schedule_flush(task_id, generation, delay);
        }
        Ok(())
    }

    fn schedule_flush(&self, task_id: TaskId, generation: u64, delay: Duration) {
        let controller = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let latest = controller.lock().edit_generation.get(&task_id).copied();
            if latest != Some(generation) {
                return;
            }
            if let Err(err) = controller.flush_edits(task_id) {
                debug!(task_id = %task_id, error = %err, "debounced flush skipped");
            }
        });
    }

    /// Persists the queued edits of a task.
    ///
    /// A failed write keeps the local values, re-queues the edits and marks
    /// the task unsynced. Edits to a task whose create is in flight stay
    /// queued and are sent once the store holds it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::UnknownTask`] when the task is not
    /// loaded.
    pub fn flush_edits(&self, task_id: TaskId) -> TaskLifecycleResult<PendingWrite> {
        let (seq, edits) = {
            let mut state = self.lock();
            state.find_mut(task_id)?;
            if state.local_only.contains(&task_id) {
                if !state.create_in_flight(task_id)
                    && state.pending_edits.remove(&task_id).is_some()
                {
                    // The whole record, edits included, goes out on retry_create.
                    self.commit(&state);
                }
                return Ok(PendingWrite::unchanged(task_id));
            }
            let Some(edits) = state.pending_edits.remove(&task_id) else {
                return Ok(PendingWrite::unchanged(task_id));
            };
            (state.issue_write(task_id), edits)
        };
        debug!(task_id = %task_id, edits = edits.len(), "flushing task edits");
        Ok(self.spawn_write(task_id, seq, WriteKind::Edits(edits)))
    }

    /// Retries every task whose edits have not been accepted.
    #[must_use]
    pub fn retry_unsynced(&self) -> Vec<PendingWrite> {
        let ids: Vec<TaskId> = self.lock().unsynced.iter().copied().collect();
        ids.into_iter()
            .filter_map(|task_id| match self.flush_edits(task_id) {
                Ok(pending) => Some(pending),
                Err(err) => {
                    warn!(task_id = %task_id, error = %err, "unsynced task could not be retried");
                    None
                }
            })
            .collect()
    }

    /// Moves a task to `target` optimistically and persists the change.
    ///
    /// A request for the current status is a no-op. If the store rejects
    /// the change, the previous status is restored and the error surfaced,
    /// unless a newer write for the task was issued in the meantime.
    ///
    /// A task the store does not hold yet only changes locally: a failed
    /// create sends the new status with [`Self::retry_create`], and a create
    /// still in flight is followed by a status write once it settles.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::UnknownTask`] when the task is not
    /// loaded, and [`TaskLifecycleError::Domain`] when the move is not a
    /// permitted lifecycle transition.
    pub fn transition_status(
        &self,
        task_id: TaskId,
        target: TaskStatus,
    ) -> TaskLifecycleResult<PendingWrite> {
        self.apply_status(task_id, target, TaskStatus::can_transition_to)
    }

    fn apply_status(
        &self,
        task_id: TaskId,
        target: TaskStatus,
        permitted: impl FnOnce(TaskStatus, TaskStatus) -> bool,
    ) -> TaskLifecycleResult<PendingWrite> {
        let (seq, previous) = {
            let mut state = self.lock();
            let task = state.find_mut(task_id)?;
            let previous = task.status();
            if previous == target {
                return Ok(PendingWrite::unchanged(task_id));
            }
            if !permitted(previous, target) {
                return Err(TaskDomainError::InvalidStatusTransition {
                    task_id,
                    from: previous,
                    to: target,
                }
                .into());
            }
            task.set_status(target);
            if state.local_only.contains(&task_id) {
                self.commit(&state);
                debug!(task_id = %task_id, from = %previous, to = %target, "status kept locally until the task is stored");
                return Ok(PendingWrite::unchanged(task_id));
            }
            let seq = state.issue_write(task_id);
            self.commit(&state);
            (seq, previous)
        };
        debug!(task_id = %task_id, from = %previous, to = %target, seq, "status applied optimistically");
        Ok(self.spawn_write(task_id, seq, WriteKind::Status { previous, target }))
    }

    /// Permanently deletes a task.
    ///
    /// The record is removed at once and put back at its old position if
    /// the store refuses. A task already missing from the store counts as
    /// deleted. A local-only task is dropped without contacting the store.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::UnknownTask`] when the task is not
    /// loaded, and [`TaskLifecycleError::CreateInFlight`] while the store is
    /// still creating it.
    pub fn purge(&self, task_id: TaskId) -> TaskLifecycleResult<PendingWrite> {
        let (seq, position, task) = {
            let mut state = self.lock();
            let position = state
                .tasks
                .iter()
                .position(|task| task.id() == task_id)
                .ok_or(TaskLifecycleError::UnknownTask(task_id))?;
            if state.create_in_flight(task_id) {
                return Err(TaskLifecycleError::CreateInFlight(task_id));
            }
            let task = state.tasks.remove(position);
            if state.local_only.contains(&task_id) {
                state.forget(task_id);
                self.commit(&state);
                return Ok(PendingWrite::ready(task_id, WriteOutcome::Confirmed));
            }
            state.pending_edits.remove(&task_id);
            state.unsynced.remove(&task_id);
            state.purging.insert(task_id);
            let seq = state.issue_write(task_id);
            self.commit(&state);
            (seq, position, task)
        };
        debug!(task_id = %task_id, "task purged optimistically");
        Ok(self.spawn_write(
            task_id,
            seq,
            WriteKind::Purge {
                position,
                task: Box::new(task),
            },
        ))
    }

    /// Deletes each of `task_ids` independently.
    ///
    /// Active and completed tasks move to the deleted tab; tasks already on
    /// the deleted tab are purged. The operation is not atomic: every item
    /// reports its own result. The selection is cleared once all writes are
    /// issued.
    #[must_use]
    pub fn delete_selected(
        &self,
        task_ids: impl IntoIterator<Item = TaskId>,
    ) -> BulkDeleteOutcome {
        let outcome: BulkDeleteOutcome = task_ids
            .into_iter()
            .map(|task_id| (task_id, self.delete_one(task_id)))
            .collect();
        self.inner.selection.clear();
        info!(count = outcome.len(), "bulk delete issued");
        outcome
    }

    /// Deletes the current selection. See [`Self::delete_selected`].
    #[must_use]
    pub fn delete_selected_ids(&self) -> BulkDeleteOutcome {
        self.delete_selected(self.inner.selection.selected())
    }

    fn delete_one(&self, task_id: TaskId) -> TaskLifecycleResult<PendingWrite> {
        let status = self
            .lock()
            .find(task_id)
            .map(Task::status)
            .ok_or(TaskLifecycleError::UnknownTask(task_id))?;
        match status {
            TaskStatus::Deleted => self.purge(task_id),
            // Bulk delete also retires completed tasks, which the swipe
            // lifecycle does not allow directly.
            TaskStatus::Active | TaskStatus::Completed => {
                self.apply_status(task_id, TaskStatus::Deleted, |_, _| true)
            }
        }
    }

    /// Subscribes to the owner's tasks and merges every emission.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Subscription`] when the gateway refuses
    /// the subscription; the error is also surfaced in the snapshot.
    #[instrument(skip_all, fields(owner = %owner))]
    pub async fn observe_remote(&self, owner: &UserId) -> TaskLifecycleResult<RemoteSubscription> {
        self.set_loading(true);
        let mut stream = self
            .inner
            .gateway
            .subscribe(owner)
            .await
            .map_err(|err| self.subscription_failed(err))?;
        info!("remote task subscription started");
        let controller = self.clone();
        let subscriber = owner.clone();
        let listener = tokio::spawn(async move {
            while let Some(emission) = stream.recv().await {
                match emission {
                    Ok(tasks) => controller.merge_remote(tasks),
                    Err(err) => {
                        controller.subscription_failed(err);
                    }
                }
            }
            info!(owner = %subscriber, "remote task subscription ended");
        });
        Ok(RemoteSubscription { listener })
    }

    fn set_loading(&self, is_loading: bool) {
        let mut state = self.lock();
        state.is_loading = is_loading;
        self.commit(&state);
    }

    fn subscription_failed(&self, err: TaskGatewayError) -> TaskLifecycleError {
        warn!(error = %err, "task subscription error");
        let error = TaskLifecycleError::Subscription(err);
        let mut state = self.lock();
        state.is_loading = false;
        state.last_error = Some(error.clone());
        self.commit(&state);
        error
    }

    /// Replaces the collection with a remote emission.
    ///
    /// Protected tasks keep their local copy; unprotected tasks missing
    /// from the emission are pruned.
    fn merge_remote(&self, remote: Vec<Task>) {
        let mut state = self.lock();
        let mut seen = HashSet::with_capacity(remote.len());
        let mut merged = Vec::with_capacity(remote.len());
        for remote_task in remote {
            let task_id = remote_task.id();
            if state.purging.contains(&task_id) || !seen.insert(task_id) {
                continue;
            }
            let local = state
                .find(task_id)
                .filter(|_| state.is_protected(task_id))
                .cloned();
            merged.push(local.unwrap_or(remote_task));
        }
        for local in &state.tasks {
            if !seen.contains(&local.id()) && state.is_protected(local.id()) {
                merged.push(local.clone());
            }
        }
        let kept: HashSet<TaskId> = merged.iter().map(Task::id).collect();
        let pruned: Vec<TaskId> = state
            .tasks
            .iter()
            .map(Task::id)
            .filter(|task_id| !kept.contains(task_id))
            .collect();
        state.tasks = merged;
        for task_id in pruned {
            debug!(task_id = %task_id, "task removed remotely");
            state.forget(task_id);
        }
        state.is_loading = false;
        self.commit(&state);
    }

    fn spawn_write(&self, task_id: TaskId, seq: u64, kind: WriteKind) -> PendingWrite {
        let controller = self.clone();
        let handle = tokio::spawn(async move {
            let result = controller.call_gateway(task_id, kind.request()).await;
            controller.settle(task_id, seq, kind, result)
        });
        PendingWrite {
            task_id,
            state: PendingState::Spawned(handle),
        }
    }

    /// Runs one gateway call detached, bounded by the write timeout.
    ///
    /// A call that outlives the timeout keeps running; only its result is
    /// ignored.
    async fn call_gateway(
        &self,
        task_id: TaskId,
        request: GatewayRequest,
    ) -> TaskLifecycleResult<Option<TaskId>> {
        let gateway = Arc::clone(&self.inner.gateway);
        let timeout = self.inner.config.write_timeout;
        let call = tokio::spawn(async move {
            match request {
                GatewayRequest::Create { owner, task } => {
                    gateway.create(&owner, &task).await.map(Some)
                }
                GatewayRequest::Update(patch) => gateway.update(task_id, &patch).await.map(|()| None),
                GatewayRequest::Delete => gateway.delete(task_id).await.map(|()| None),
            }
        });
        match tokio::time::timeout(timeout, call).await {
            Ok(Ok(result)) => result.map_err(Into::into),
            Ok(Err(join_error)) => {
                warn!(task_id = %task_id, error = %join_error, "gateway call aborted");
                Err(TaskLifecycleError::WriteAborted(task_id))
            }
            Err(_) => {
                warn!(task_id = %task_id, ?timeout, "gateway call timed out");
                Err(TaskLifecycleError::WriteTimedOut { task_id, timeout })
            }
        }
    }

    /// Reconciles a completed write with the collection.
    fn settle(
        &self,
        task_id: TaskId,
        seq: u64,
        kind: WriteKind,
        result: TaskLifecycleResult<Option<TaskId>>,
    ) -> WriteOutcome {
        let mut state = self.lock();
        let outcome = match kind {
            WriteKind::Create(sent) => {
                let outcome = settle_create(&mut state, task_id, seq, result);
                if let WriteOutcome::Created(stored_id) = &outcome {
                    self.send_changes_made_during_create(&mut state, *stored_id, sent.status());
                }
                outcome
            }
            WriteKind::Status { previous, target } => {
                settle_status(&mut state, task_id, seq, (previous, target), result)
            }
            WriteKind::Edits(edits) => settle_edits(&mut state, task_id, seq, edits, result),
            WriteKind::Purge { position, task } => {
                settle_purge(&mut state, task_id, position, *task, result)
            }
        };
        self.commit(&state);
        outcome
    }

    /// Persists the status and edits a task picked up while its create was
    /// in flight.
    fn send_changes_made_during_create(
        &self,
        state: &mut ControllerState,
        task_id: TaskId,
        sent: TaskStatus,
    ) {
        let Some(current) = state.find(task_id).map(Task::status) else {
            return;
        };
        if current != sent {
            let seq = state.issue_write(task_id);
            debug!(task_id = %task_id, from = %sent, to = %current, seq, "sending status changed during create");
            drop(self.spawn_write(
                task_id,
                seq,
                WriteKind::Status {
                    previous: sent,
                    target: current,
                },
            ));
        }
        if let Some(edits) = state.pending_edits.remove(&task_id) {
            let seq = state.issue_write(task_id);
            debug!(task_id = %task_id, edits = edits.len(), seq, "sending edits made during create");
            drop(self.spawn_write(task_id, seq, WriteKind::Edits(edits)));
        }
    }
}

fn settle_create(
    state: &mut ControllerState,
    task_id: TaskId,
    seq: u64,
    result: TaskLifecycleResult<Option<TaskId>>,
) -> WriteOutcome {
    if state.find(task_id).is_none() {
        // Discarded while the create was in flight.
        return WriteOutcome::Superseded;
    }
    match result {
        Ok(stored) => {
            let stored_id = stored.unwrap_or(task_id);
            state.local_only.remove(&task_id);
            state.settle_phase(task_id, seq, WritePhase::Confirmed);
            if stored_id != task_id {
                state.rekey(task_id, stored_id);
            }
            info!(task_id = %stored_id, "task stored");
            WriteOutcome::Created(stored_id)
        }
        Err(err) => {
            warn!(task_id = %task_id, error = %err, "task creation failed; kept locally");
            state.settle_phase(task_id, seq, WritePhase::Unsynced);
            state.last_error = Some(err.clone());
            WriteOutcome::LocalOnly(err)
        }
    }
}

fn settle_status(
    state: &mut ControllerState,
    task_id: TaskId,
    seq: u64,
    (previous, target): (TaskStatus, TaskStatus),
    result: TaskLifecycleResult<Option<TaskId>>,
) -> WriteOutcome {
    if !state.is_latest(task_id, seq) {
        debug!(task_id = %task_id, seq, "stale status completion discarded");
        return WriteOutcome::Superseded;
    }
    match result {
        Ok(_) => {
            state.settle_phase(task_id, seq, WritePhase::Confirmed);
            WriteOutcome::Confirmed
        }
        Err(TaskLifecycleError::Gateway(TaskGatewayError::NotFound(_))) => {
            info!(task_id = %task_id, "task missing remotely; pruned");
            state.forget(task_id);
            WriteOutcome::Pruned
        }
        Err(err) => {
            warn!(task_id = %task_id, from = %target, to = %previous, error = %err, "status change reverted");
            if let Ok(task) = state.find_mut(task_id)
                && task.status() == target
            {
                task.set_status(previous);
            }
            state.settle_phase(task_id, seq, WritePhase::Reverted);
            state.last_error = Some(err.clone());
            WriteOutcome::Reverted(err)
        }
    }
}

fn settle_edits(
    state: &mut ControllerState,
    task_id: TaskId,
    seq: u64,
    edits: Vec<TaskEdit>,
    result: TaskLifecycleResult<Option<TaskId>>,
) -> WriteOutcome {
    let latest = state.is_latest(task_id, seq);
    match result {
        Ok(_) => {
            state.settle_phase(task_id, seq, WritePhase::Confirmed);
            if !state.pending_edits.contains_key(&task_id) {
                state.unsynced.remove(&task_id);
            }
            WriteOutcome::Confirmed
        }
        Err(TaskLifecycleError::Gateway(TaskGatewayError::NotFound(_))) if latest => {
            info!(task_id = %task_id, "task missing remotely; pruned");
            state.forget(task_id);
            WriteOutcome::Pruned
        }
        Err(err) => {
            if state.find(task_id).is_none() {
                return WriteOutcome::Superseded;
            }
            warn!(task_id = %task_id, error = %err, "task edits not persisted; kept locally");
            let queued = state.pending_edits.entry(task_id).or_default();
            let newer = std::mem::replace(queued, edits);
            queued.extend(newer);
            state.unsynced.insert(task_id);
            state.settle_phase(task_id, seq, WritePhase::Unsynced);
            state.last_error = Some(err.clone());
            WriteOutcome::Unsynced(err)
        }
    }
}

fn settle_purge(
    state: &mut ControllerState,
    task_id: TaskId,
    position: usize,
    task: Task,
    result: TaskLifecycleResult<Option<TaskId>>,
) -> WriteOutcome {
    state.purging.remove(&task_id);
    match result {
        Ok(_) | Err(TaskLifecycleError::Gateway(TaskGatewayError::NotFound(_))) => {
            state.writes.remove(&task_id);
            state.edit_generation.remove(&task_id);
            info!(task_id = %task_id, "task purged");
            WriteOutcome::Confirmed
        }
        Err(err) => {
            warn!(task_id = %task_id, error = %err, "purge failed; task restored");
            if state.find(task_id).is_none() {
                let index = position.min(state.tasks.len());
                state.tasks.insert(index, task);
            }
            state.writes.remove(&task_id);
            state.last_error = Some(err.clone());
            WriteOutcome::Reverted(err)
        }
    }
}
