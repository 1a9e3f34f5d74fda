//! Shared test helpers for in-memory gateway integration tests.

use chrono::DateTime;
use eyre::OptionExt;
use mockable::DefaultClock;
use rstest::fixture;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use taskdeck::task::{
    adapters::memory::InMemoryTaskGateway,
    domain::{PersistedTaskData, Task, TaskId, TaskStatus, UserId},
    services::{
        RemoteSubscription, SelectionSynchronizer, TaskLifecycleController, TaskListConfig,
        TaskListSnapshot,
    },
};

/// Controller type used by the integration tests.
pub type TestController = TaskLifecycleController<InMemoryTaskGateway, DefaultClock>;

const BASE_TIMESTAMP: i64 = 1_704_099_600;

/// Provides a fresh in-memory gateway for each test.
#[fixture]
pub fn gateway() -> InMemoryTaskGateway {
    InMemoryTaskGateway::new()
}

/// Returns the user owning every test task.
///
/// # Panics
///
/// Panics if the literal identifier is rejected.
#[must_use]
pub fn owner() -> UserId {
    UserId::new("owner-1").expect("valid user id")
}

/// Builds a stored task created `minutes` after a fixed base time.
///
/// # Panics
///
/// Panics if the timestamp is out of range.
#[must_use]
pub fn stored(title: &str, status: TaskStatus, minutes: i64) -> Task {
    Task::from_persisted(PersistedTaskData {
        id: TaskId::new(),
        title: title.to_owned(),
        description: format!("{title} description"),
        owner: owner(),
        assignees: BTreeSet::new(),
        status,
        due_date: None,
        due_time: None,
        color: None,
        image_uri: None,
        location: None,
        location_name: None,
        created_at: DateTime::from_timestamp(BASE_TIMESTAMP + minutes * 60, 0)
            .expect("timestamp in range"),
        reminder_lead: None,
    })
}

/// Seeds `tasks`, opens a controller over `gateway` and waits for the first
/// emission.
///
/// # Errors
///
/// Returns an error if seeding, subscribing or loading fails.
pub async fn open(
    gateway: &InMemoryTaskGateway,
    tasks: Vec<Task>,
    config: TaskListConfig,
) -> eyre::Result<(TestController, RemoteSubscription)> {
    let expected = tasks.len();
    gateway.seed(&owner(), tasks)?;
    let controller = TaskLifecycleController::new(
        Arc::new(gateway.clone()),
        Arc::new(DefaultClock),
        SelectionSynchronizer::new(),
        config,
    );
    let subscription = controller.observe_remote(&owner()).await?;
    wait_for(&controller, |snapshot| {
        !snapshot.is_loading && snapshot.tasks.len() == expected
    })
    .await?;
    Ok((controller, subscription))
}

/// Waits until a published snapshot satisfies `condition`.
///
/// # Errors
///
/// Returns an error if no such snapshot is published within two seconds.
pub async fn wait_for(
    controller: &TestController,
    condition: impl FnMut(&TaskListSnapshot) -> bool,
) -> eyre::Result<()> {
    let mut snapshots = controller.subscribe();
    tokio::time::timeout(Duration::from_secs(2), snapshots.wait_for(condition)).await??;
    Ok(())
}

/// Waits until the gateway has received `count` writes.
///
/// # Errors
///
/// Returns an error if the writes do not arrive within two seconds.
pub async fn wait_for_writes(gateway: &InMemoryTaskGateway, count: usize) -> eyre::Result<()> {
    tokio::time::timeout(Duration::from_secs(2), async {
        while gateway.writes_received()? < count {
            tokio::task::yield_now().await;
        }
        Ok::<(), eyre::Report>(())
    })
    .await?
}

/// Returns the loaded status of a task.
///
/// # Errors
///
/// Returns an error if the task is not loaded.
pub fn status_of(controller: &TestController, task_id: TaskId) -> eyre::Result<TaskStatus> {
    controller
        .task(task_id)
        .map(|task| task.status())
        .ok_or_eyre("task is not loaded")
}
