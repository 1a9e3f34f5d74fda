//! Logical screen routes handed to the navigation collaborator.
//!
//! Routes render as `<ScreenName>?<key>=<value>`. An absent task identifier
//! is always written as the `-1` sentinel so downstream parsing never has to
//! special-case a missing key.

use super::{ParseRouteError, TaskId};
use std::fmt;
use std::str::FromStr;

/// Sentinel written for "no task selected".
pub const NO_SELECTION: &str = "-1";

/// Query key carrying a task identifier.
pub const TASK_ID_KEY: &str = "taskId";

const TASK_LIST_SCREEN: &str = "TaskListScreen";
const CREATE_TASK_SCREEN: &str = "CreateTaskScreen";
const EDIT_TASK_SCREEN: &str = "EditTaskScreen";
const SETTINGS_SCREEN: &str = "SettingsScreen";
const TASK_MAP_SCREEN: &str = "TaskMapScreen";

/// A screen the core can ask the host application to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenRoute {
    /// The tabbed task list.
    TaskList,
    /// The create form.
    CreateTask,
    /// The edit form for one task.
    EditTask {
        /// Task to edit; `None` encodes as the sentinel.
        task_id: Option<TaskId>,
    },
    /// Application settings.
    Settings,
    /// Map of task locations.
    TaskMap,
}

impl ScreenRoute {
    /// Route to the editor for `task_id`.
    #[must_use]
    pub const fn edit(task_id: TaskId) -> Self {
        Self::EditTask {
            task_id: Some(task_id),
        }
    }

    const fn screen_name(self) -> &'static str {
        match self {
            Self::TaskList => TASK_LIST_SCREEN,
            Self::CreateTask => CREATE_TASK_SCREEN,
            Self::EditTask { .. } => EDIT_TASK_SCREEN,
            Self::Settings => SETTINGS_SCREEN,
            Self::TaskMap => TASK_MAP_SCREEN,
        }
    }
}

impl fmt::Display for ScreenRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.screen_name())?;
        if let Self::EditTask { task_id } = self {
            match task_id {
                Some(id) => write!(f, "?{TASK_ID_KEY}={id}")?,
                None => write!(f, "?{TASK_ID_KEY}={NO_SELECTION}")?,
            }
        }
        Ok(())
    }
}

impl FromStr for ScreenRoute {
    type Err = ParseRouteError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (name, query) = value.split_once('?').unwrap_or((value, ""));
        match name {
            TASK_LIST_SCREEN => Ok(Self::TaskList),
            CREATE_TASK_SCREEN => Ok(Self::CreateTask),
            SETTINGS_SCREEN => Ok(Self::Settings),
            TASK_MAP_SCREEN => Ok(Self::TaskMap),
            EDIT_TASK_SCREEN => Ok(Self::EditTask {
                task_id: parse_task_id(query)?,
            }),
            _ => Err(ParseRouteError::UnknownScreen(name.to_owned())),
        }
    }
}

fn parse_task_id(query: &str) -> Result<Option<TaskId>, ParseRouteError> {
    let raw = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find_map(|(key, raw_value)| (key == TASK_ID_KEY).then_some(raw_value))
        .unwrap_or(NO_SELECTION);

    if raw == NO_SELECTION {
        return Ok(None);
    }
    raw.parse::<TaskId>()
        .map(Some)
        .map_err(|_| ParseRouteError::InvalidParameter {
            key: TASK_ID_KEY.to_owned(),
            value: raw.to_owned(),
        })
}
