//! In-memory integration tests for task lifecycle operations.

use super::helpers::{gateway, open, owner, status_of, stored, wait_for, wait_for_writes};
use eyre::{OptionExt, ensure};
use rstest::rstest;
use std::time::Duration;
use taskdeck::task::{
    adapters::memory::InMemoryTaskGateway,
    domain::{Task, TaskDraft, TaskEdit, TaskId, TaskStatus},
    services::{TaskLifecycleError, TaskListConfig, WriteOutcome},
};

fn stored_status(gateway: &InMemoryTaskGateway, task_id: TaskId) -> eyre::Result<TaskStatus> {
    gateway
        .stored(task_id)?
        .map(|task| task.status())
        .ok_or_eyre("task missing from store")
}

async fn wait_for_stored(
    gateway: &InMemoryTaskGateway,
    task_id: TaskId,
    mut condition: impl FnMut(&Task) -> bool,
) -> eyre::Result<()> {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if gateway.stored(task_id)?.is_some_and(|task| condition(&task)) {
                return Ok::<(), eyre::Report>(());
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await?
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn transition_is_persisted_and_echoed_back(gateway: InMemoryTaskGateway) -> eyre::Result<()> {
    let active = stored("Pay rent", TaskStatus::Active, 0);
    let task_id = active.id();
    let (controller, _subscription) = open(&gateway, vec![active], TaskListConfig::default()).await?;

    let outcome = controller
        .transition_status(task_id, TaskStatus::Completed)?
        .settled()
        .await;

    ensure!(matches!(outcome, WriteOutcome::Confirmed));
    ensure!(stored_status(&gateway, task_id)? == TaskStatus::Completed);
    ensure!(status_of(&controller, task_id)? == TaskStatus::Completed);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn timed_out_write_reverts_but_keeps_running(
    gateway: InMemoryTaskGateway,
) -> eyre::Result<()> {
    let active = stored("Slow network", TaskStatus::Active, 0);
    let task_id = active.id();
    let config = TaskListConfig::default().with_write_timeout(Duration::from_millis(50));
    let (controller, _subscription) = open(&gateway, vec![active], config).await?;
    gateway.hold_writes()?;

    let outcome = controller
        .transition_status(task_id, TaskStatus::Completed)?
        .settled()
        .await;

    ensure!(matches!(
        outcome,
        WriteOutcome::Reverted(TaskLifecycleError::WriteTimedOut { .. })
    ));
    ensure!(status_of(&controller, task_id)? == TaskStatus::Active);

    gateway.open_writes()?;
    wait_for(&controller, |snapshot| {
        snapshot
            .tasks
            .iter()
            .any(|task| task.id() == task_id && task.status() == TaskStatus::Completed)
    })
    .await?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn partial_bulk_delete_failure_reverts_only_failed_item(
    gateway: InMemoryTaskGateway,
) -> eyre::Result<()> {
    let tasks = vec![
        stored("one", TaskStatus::Completed, 0),
        stored("two", TaskStatus::Completed, 1),
        stored("three", TaskStatus::Completed, 2),
    ];
    let (controller, _subscription) = open(&gateway, tasks, TaskListConfig::default()).await?;
    controller.set_tab(TaskStatus::Completed);
    ensure!(controller.select_all_visible() == 3);
    gateway.fail_next_writes(1)?;

    let outcomes = controller.delete_selected_ids();
    ensure!(controller.selection().is_empty());

    let mut reverted = Vec::new();
    for (task_id, result) in outcomes {
        match result?.settled().await {
            WriteOutcome::Confirmed => {
                ensure!(stored_status(&gateway, task_id)? == TaskStatus::Deleted);
            }
            WriteOutcome::Reverted(_) => reverted.push(task_id),
            other => eyre::bail!("unexpected outcome {other:?}"),
        }
    }

    ensure!(reverted.len() == 1);
    let failed = reverted.first().copied().ok_or_eyre("one reverted item")?;
    ensure!(status_of(&controller, failed)? == TaskStatus::Completed);
    ensure!(controller.snapshot().last_error.is_some());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn bulk_delete_on_deleted_tab_purges_from_store(
    gateway: InMemoryTaskGateway,
) -> eyre::Result<()> {
    let tasks = vec![
        stored("old", TaskStatus::Deleted, 0),
        stored("older", TaskStatus::Deleted, 1),
        stored("keep", TaskStatus::Active, 2),
    ];
    let (controller, _subscription) = open(&gateway, tasks, TaskListConfig::default()).await?;
    controller.set_tab(TaskStatus::Deleted);
    ensure!(controller.select_all_visible() == 2);

    for (task_id, result) in controller.delete_selected_ids() {
        ensure!(matches!(result?.settled().await, WriteOutcome::Confirmed));
        ensure!(gateway.stored(task_id)?.is_none());
        ensure!(controller.task(task_id).is_none());
    }
    ensure!(controller.snapshot().tasks.len() == 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn created_task_is_stored_under_server_id(gateway: InMemoryTaskGateway) -> eyre::Result<()> {
    let (controller, _subscription) = open(&gateway, Vec::new(), TaskListConfig::default()).await?;
    gateway.assign_server_ids()?;

    let pending = controller.create(TaskDraft::new(owner(), "Renew passport", "Photos"))?;
    let local_id = pending.task_id();
    let WriteOutcome::Created(stored_id) = pending.settled().await else {
        eyre::bail!("create was not confirmed");
    };

    ensure!(stored_id != local_id);
    ensure!(gateway.stored(stored_id)?.is_some());
    wait_for(&controller, |snapshot| {
        snapshot.tasks.len() == 1 && snapshot.tasks.iter().all(|task| task.id() == stored_id)
    })
    .await?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn debounced_edits_reach_the_store(gateway: InMemoryTaskGateway) -> eyre::Result<()> {
    let active = stored("Shoping", TaskStatus::Active, 0);
    let task_id = active.id();
    let config = TaskListConfig::default().with_edit_debounce(Some(Duration::from_millis(20)));
    let (controller, _subscription) = open(&gateway, vec![active], config).await?;

    controller.update_field(task_id, TaskEdit::Title("Shopping".to_owned()))?;

    wait_for_stored(&gateway, task_id, |task| task.title() == "Shopping").await

}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn local_only_task_survives_remote_emissions(
    gateway: InMemoryTaskGateway,
) -> eyre::Result<()> {
    let existing = stored("existing", TaskStatus::Active, 0);
    let (controller, _subscription) =
        open(&gateway, vec![existing], TaskListConfig::default()).await?;
    gateway.fail_next_writes(1)?;

    let pending = controller.create(TaskDraft::new(owner(), "Offline", "Created on a train"))?;
    let local_id = pending.task_id();
    ensure!(matches!(pending.settled().await, WriteOutcome::LocalOnly(_)));

    gateway.seed(&owner(), vec![stored("remote", TaskStatus::Active, 5)])?;
    wait_for(&controller, |snapshot| snapshot.tasks.len() == 3).await?;
    ensure!(controller.is_local_only(local_id));
    ensure!(controller.task(local_id).is_some());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn local_only_status_change_waits_for_retry_create(
    gateway: InMemoryTaskGateway,
) -> eyre::Result<()> {
    let (controller, _subscription) = open(&gateway, Vec::new(), TaskListConfig::default()).await?;
    gateway.fail_next_writes(1)?;
    let pending = controller.create(TaskDraft::new(owner(), "Offline", "Created on a train"))?;
    let local_id = pending.task_id();
    ensure!(matches!(pending.settled().await, WriteOutcome::LocalOnly(_)));

    let swiped = controller
        .transition_status(local_id, TaskStatus::Completed)?
        .settled()
        .await;

    ensure!(matches!(swiped, WriteOutcome::Unchanged));
    ensure!(status_of(&controller, local_id)? == TaskStatus::Completed);
    ensure!(controller.is_local_only(local_id));
    ensure!(gateway.writes_received()? == 1);

    let WriteOutcome::Created(stored_id) = controller.retry_create(local_id)?.settled().await
    else {
        eyre::bail!("retried create was not confirmed");
    };
    ensure!(stored_status(&gateway, stored_id)? == TaskStatus::Completed);
    ensure!(status_of(&controller, stored_id)? == TaskStatus::Completed);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn purge_is_refused_while_create_is_in_flight(
    gateway: InMemoryTaskGateway,
) -> eyre::Result<()> {
    let (controller, _subscription) = open(&gateway, Vec::new(), TaskListConfig::default()).await?;
    gateway.hold_writes()?;
    let pending = controller.create(TaskDraft::new(owner(), "Slow", "Still uploading"))?;
    let local_id = pending.task_id();
    wait_for_writes(&gateway, 1).await?;

    let refused = controller.purge(local_id);

    ensure!(matches!(refused, Err(TaskLifecycleError::CreateInFlight(id)) if id == local_id));
    ensure!(controller.task(local_id).is_some());

    gateway.open_writes()?;
    ensure!(matches!(pending.settled().await, WriteOutcome::Created(_)));
    ensure!(gateway.stored(local_id)?.is_some());

    ensure!(matches!(
        controller.purge(local_id)?.settled().await,
        WriteOutcome::Confirmed
    ));
    ensure!(gateway.stored(local_id)?.is_none());
    wait_for(&controller, |snapshot| snapshot.tasks.is_empty()).await?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn changes_made_during_create_follow_it_to_the_store(
    gateway: InMemoryTaskGateway,
) -> eyre::Result<()> {
    let (controller, _subscription) = open(&gateway, Vec::new(), TaskListConfig::default()).await?;
    gateway.hold_writes()?;
    let pending = controller.create(TaskDraft::new(owner(), "Draft", "Quick note"))?;
    let local_id = pending.task_id();
    wait_for_writes(&gateway, 1).await?;

    let swiped = controller
        .transition_status(local_id, TaskStatus::Completed)?
        .settled()
        .await;
    controller.update_field(local_id, TaskEdit::Title("Final".to_owned()))?;
    let flushed = controller.flush_edits(local_id)?;

    ensure!(matches!(swiped, WriteOutcome::Unchanged));
    ensure!(flushed.is_unchanged());
    ensure!(status_of(&controller, local_id)? == TaskStatus::Completed);

    gateway.open_writes()?;
    ensure!(matches!(pending.settled().await, WriteOutcome::Created(_)));
    wait_for_stored(&gateway, local_id, |task| {
        task.status() == TaskStatus::Completed && task.title() == "Final"
    })
    .await?;
    ensure!(status_of(&controller, local_id)? == TaskStatus::Completed);
    Ok(())
}
