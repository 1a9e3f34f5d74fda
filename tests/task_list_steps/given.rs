//! Given steps for task list BDD scenarios.

use super::world::{TaskListWorld, run_async};
use chrono::DateTime;
use eyre::WrapErr;
use rstest_bdd_macros::given;
use std::collections::BTreeSet;
use taskdeck::task::domain::{PersistedTaskData, Task, TaskId, TaskStatus};

const BASE_TIMESTAMP: i64 = 1_704_099_600;

fn seed(world: &mut TaskListWorld, title: String, status: TaskStatus) -> eyre::Result<()> {
    let minutes = i64::try_from(world.seeded.len())?;
    let created_at = DateTime::from_timestamp(BASE_TIMESTAMP + minutes * 60, 0)
        .ok_or_else(|| eyre::eyre!("timestamp out of range"))?;
    let task = Task::from_persisted(PersistedTaskData {
        id: TaskId::new(),
        description: format!("{title} details"),
        title,
        owner: world.owner.clone(),
        assignees: BTreeSet::new(),
        status,
        due_date: None,
        due_time: None,
        color: None,
        image_uri: None,
        location: None,
        location_name: None,
        created_at,
        reminder_lead: None,
    });
    world.gateway.seed(&world.owner, [task.clone()])?;
    world.seeded.push(task);
    Ok(())
}

#[given(r#"an active task "{title}""#)]
fn active_task(world: &mut TaskListWorld, title: String) -> Result<(), eyre::Report> {
    seed(world, title, TaskStatus::Active)
}

#[given(r#"a completed task "{title}""#)]
fn completed_task(world: &mut TaskListWorld, title: String) -> Result<(), eyre::Report> {
    seed(world, title, TaskStatus::Completed)
}

#[given(r#"a deleted task "{title}""#)]
fn deleted_task(world: &mut TaskListWorld, title: String) -> Result<(), eyre::Report> {
    seed(world, title, TaskStatus::Deleted)
}

#[given("the task list is open")]
fn task_list_is_open(world: &mut TaskListWorld) -> Result<(), eyre::Report> {
    let subscription = run_async(world.screen.controller().observe_remote(&world.owner))
        .wrap_err("subscribe to the scenario store")?;
    world.subscription = Some(subscription);
    let expected = world.seeded.len();
    world.wait_for(|snapshot| !snapshot.is_loading && snapshot.tasks.len() == expected)
}

#[given(r#"the user browses the "{tab}" tab"#)]
fn user_browses_tab(world: &mut TaskListWorld, tab: String) -> Result<(), eyre::Report> {
    let tab = TaskStatus::try_from(tab.as_str())?;
    world.screen.select_tab(tab);
    Ok(())
}

#[given("the store rejects the next write")]
fn store_rejects_next_write(world: &mut TaskListWorld) -> Result<(), eyre::Report> {
    world.gateway.fail_next_writes(1)?;
    Ok(())
}
