//! When steps for task list BDD scenarios.

use super::world::{TaskListWorld, run_async};
use rstest_bdd_macros::when;

#[when(
    r#"the user swipes "{title}" {distance:u32} pixels {direction} on a {width:u32} pixel row"#
)]
fn user_swipes(
    world: &mut TaskListWorld,
    title: String,
    distance: u32,
    direction: String,
    width: u32,
) -> Result<(), eyre::Report> {
    let task_id = world.task_id(&title)?;
    let delta = match direction.as_str() {
        "left" => -f64::from(distance),
        "right" => f64::from(distance),
        other => eyre::bail!("unknown swipe direction {other}"),
    };
    world.screen.drag(task_id, delta);
    world.last_release = Some(world.screen.release(task_id, f64::from(width)));
    Ok(())
}

#[when("the user selects all rows")]
fn user_selects_all(world: &mut TaskListWorld) {
    let _added = world.screen.select_all();
}

#[when(r#"the user ticks "{title}""#)]
fn user_ticks(world: &mut TaskListWorld, title: String) -> Result<(), eyre::Report> {
    let task_id = world.task_id(&title)?;
    let _ticked = world.screen.toggle_selection(task_id, true);
    Ok(())
}

#[when("the user deletes the selection")]
fn user_deletes_selection(world: &mut TaskListWorld) -> Result<(), eyre::Report> {
    for (task_id, result) in world.screen.delete_selected() {
        let outcome = run_async(result?.settled());
        world.outcomes.push((task_id, outcome));
    }
    Ok(())
}

#[when(r#"the user chooses the sort "{label}""#)]
fn user_chooses_sort(world: &mut TaskListWorld, label: String) -> Result<(), eyre::Report> {
    if !world.screen.choose_sort(&label) {
        eyre::bail!("unknown sort option {label}");
    }
    Ok(())
}

#[when(r#"the user opens "{title}""#)]
fn user_opens(world: &mut TaskListWorld, title: String) -> Result<(), eyre::Report> {
    let task_id = world.task_id(&title)?;
    world.screen.open_task(task_id);
    Ok(())
}

#[when("the user taps add")]
fn user_taps_add(world: &mut TaskListWorld) {
    world.screen.add_task();
}
