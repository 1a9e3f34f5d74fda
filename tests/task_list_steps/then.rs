//! Then steps for task list BDD scenarios.

use super::world::{TaskListWorld, run_async};
use eyre::{OptionExt, ensure};
use rstest_bdd_macros::then;
use taskdeck::task::{
    domain::{ScreenRoute, Task, TaskStatus},
    services::WriteOutcome,
};

fn settle_release(world: &mut TaskListWorld) -> eyre::Result<Option<WriteOutcome>> {
    let release = world
        .last_release
        .take()
        .ok_or_eyre("missing swipe release in scenario world")?;
    Ok(match release? {
        Some(pending) => Some(run_async(pending.settled())),
        None => None,
    })
}

#[then("the write settles as confirmed")]
fn write_confirmed(world: &mut TaskListWorld) -> Result<(), eyre::Report> {
    let outcome = settle_release(world)?;
    ensure!(
        matches!(outcome, Some(WriteOutcome::Confirmed)),
        "expected a confirmed write, got {outcome:?}"
    );
    Ok(())
}

#[then("the write settles as reverted")]
fn write_reverted(world: &mut TaskListWorld) -> Result<(), eyre::Report> {
    let outcome = settle_release(world)?;
    ensure!(
        matches!(outcome, Some(WriteOutcome::Reverted(_))),
        "expected a reverted write, got {outcome:?}"
    );
    Ok(())
}

#[then("no write is issued")]
fn no_write_issued(world: &mut TaskListWorld) -> Result<(), eyre::Report> {
    ensure!(settle_release(world)?.is_none(), "the swipe committed");
    ensure!(world.gateway.writes_received()? == 0);
    Ok(())
}

#[then(r#"the task "{title}" is "{status}""#)]
fn task_has_status(world: &TaskListWorld, title: String, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())?;
    let task_id = world.task_id(&title)?;
    let actual = world
        .screen
        .controller()
        .task(task_id)
        .map(|task| task.status())
        .ok_or_eyre("task is not loaded")?;
    ensure!(actual == expected, "expected {expected}, found {actual}");
    Ok(())
}

#[then(r#"the store holds "{title}" as "{status}""#)]
fn store_holds(world: &TaskListWorld, title: String, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())?;
    let stored = world
        .gateway
        .stored(world.seeded_id(&title)?)?
        .ok_or_eyre("task missing from store")?;
    ensure!(stored.status() == expected);
    Ok(())
}

#[then(r#"the store no longer holds "{title}""#)]
fn store_no_longer_holds(world: &TaskListWorld, title: String) -> Result<(), eyre::Report> {
    let task_id = world.seeded_id(&title)?;
    ensure!(world.gateway.stored(task_id)?.is_none());
    ensure!(world.screen.controller().task(task_id).is_none());
    Ok(())
}

#[then("an error is shown")]
fn error_is_shown(world: &TaskListWorld) -> Result<(), eyre::Report> {
    ensure!(world.screen.controller().snapshot().last_error.is_some());
    Ok(())
}

#[then("{count:usize} rows are selected")]
fn rows_selected(world: &TaskListWorld, count: usize) -> Result<(), eyre::Report> {
    let selected = world.screen.selection_count();
    ensure!(selected == count, "expected {count} selected rows, found {selected}");
    Ok(())
}

#[then("the selection is empty")]
fn selection_empty(world: &TaskListWorld) -> Result<(), eyre::Report> {
    ensure!(world.screen.selection_count() == 0);
    Ok(())
}

fn count_outcomes(world: &TaskListWorld, predicate: fn(&WriteOutcome) -> bool) -> usize {
    world
        .outcomes
        .iter()
        .filter(|(_, outcome)| predicate(outcome))
        .count()
}

#[then("{count:usize} deletes settle as confirmed")]
fn deletes_confirmed(world: &TaskListWorld, count: usize) -> Result<(), eyre::Report> {
    let confirmed = count_outcomes(world, |outcome| matches!(outcome, WriteOutcome::Confirmed));
    ensure!(confirmed == count, "expected {count} confirmed deletes, found {confirmed}");
    Ok(())
}

#[then("{count:usize} delete settles as reverted")]
fn deletes_reverted(world: &TaskListWorld, count: usize) -> Result<(), eyre::Report> {
    let reverted = count_outcomes(world, |outcome| matches!(outcome, WriteOutcome::Reverted(_)));
    ensure!(reverted == count, "expected {count} reverted deletes, found {reverted}");
    Ok(())
}

#[then(r#"the rows read "{titles}""#)]
fn rows_read(world: &TaskListWorld, titles: String) -> Result<(), eyre::Report> {
    let rows: Vec<String> = world
        .screen
        .visible_tasks()
        .iter()
        .map(Task::title)
        .map(str::to_owned)
        .collect();
    let expected: Vec<String> = titles.split(", ").map(str::to_owned).collect();
    ensure!(rows == expected, "expected rows {expected:?}, found {rows:?}");
    Ok(())
}

#[then(r#"the editor for "{title}" is requested"#)]
fn editor_requested(world: &TaskListWorld, title: String) -> Result<(), eyre::Report> {
    let task_id = world.task_id(&title)?;
    ensure!(world.navigator.last_route() == Some(ScreenRoute::edit(task_id)));
    ensure!(
        world
            .navigator
            .opened()
            .last()
            .is_some_and(|route| route == &format!("EditTaskScreen?taskId={task_id}"))
    );
    Ok(())
}

#[then(r#"the route "{route}" is requested"#)]
fn route_requested(world: &TaskListWorld, route: String) -> Result<(), eyre::Report> {
    ensure!(world.navigator.opened().last() == Some(&route));
    Ok(())
}
