//! Sort/filter pipeline deriving a tab's visible rows.

use crate::task::domain::{SortMode, Task, TaskId, TaskStatus};

/// Returns the tasks shown on `tab`, ordered by `sort_mode`.
///
/// Pure and restartable: the input is never reordered and the same inputs
/// always yield the same sequence. A task is included iff its status equals
/// the tab.
#[must_use]
pub fn view(tasks: &[Task], tab: TaskStatus, sort_mode: SortMode) -> Vec<&Task> {
    let mut visible: Vec<&Task> = tasks.iter().filter(|task| task.status() == tab).collect();
    visible.sort_by(|left, right| sort_mode.compare(left, right));
    visible
}

/// Returns the identifiers of [`view`], in display order.
#[must_use]
pub fn visible_ids(tasks: &[Task], tab: TaskStatus, sort_mode: SortMode) -> Vec<TaskId> {
    view(tasks, tab, sort_mode)
        .into_iter()
        .map(Task::id)
        .collect()
}
