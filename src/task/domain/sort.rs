//! Sort modes offered by the task list menu.

use super::{ParseSortModeError, Task};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Ordering applied to a tab's visible tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Oldest first.
    #[default]
    CreatedAsc,
    /// Newest first.
    CreatedDesc,
    /// Title A-Z.
    TitleAsc,
    /// Title Z-A.
    TitleDesc,
    /// Earliest due first; undated last.
    DueAsc,
    /// Latest due first; undated last.
    DueDesc,
}

impl SortMode {
    /// All sort modes in menu order.
    pub const ALL: [Self; 6] = [
        Self::CreatedAsc,
        Self::CreatedDesc,
        Self::TitleAsc,
        Self::TitleDesc,
        Self::DueAsc,
        Self::DueDesc,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAsc => "created_asc",
            Self::CreatedDesc => "created_desc",
            Self::TitleAsc => "title_asc",
            Self::TitleDesc => "title_desc",
            Self::DueAsc => "due_asc",
            Self::DueDesc => "due_desc",
        }
    }

    /// Returns the menu label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CreatedAsc => "Sort by Date Created (Asc)",
            Self::CreatedDesc => "Sort by Date Created (Desc)",
            Self::TitleAsc => "Sort by Title (A-Z)",
            Self::TitleDesc => "Sort by Title (Z-A)",
            Self::DueAsc => "Sort by Due Date (Asc)",
            Self::DueDesc => "Sort by Due Date (Desc)",
        }
    }

    /// Resolves a menu label back to its mode.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.label() == label)
    }

    /// Compares two tasks under this mode.
    ///
    /// The ordering is total: equal keys fall back to the task identifier.
    #[must_use]
    pub fn compare(self, left: &Task, right: &Task) -> Ordering {
        let primary = match self {
            Self::CreatedAsc => left.created_at().cmp(&right.created_at()),
            Self::CreatedDesc => right.created_at().cmp(&left.created_at()),
            Self::TitleAsc => compare_titles(left, right),
            Self::TitleDesc => compare_titles(right, left),
            Self::DueAsc => compare_due(left, right, false),
            Self::DueDesc => compare_due(left, right, true),
        };
        primary.then_with(|| left.id().cmp(&right.id()))
    }
}

impl TryFrom<&str> for SortMode {
    type Error = ParseSortModeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| ParseSortModeError(value.to_owned()))
    }
}

fn compare_titles(left: &Task, right: &Task) -> Ordering {
    left.title()
        .to_lowercase()
        .cmp(&right.title().to_lowercase())
        .then_with(|| left.title().cmp(right.title()))
}

/// Undated tasks sort after dated ones regardless of direction.
fn compare_due(left: &Task, right: &Task, descending: bool) -> Ordering {
    match (left.due_moment(), right.due_moment()) {
        (Some(a), Some(b)) if descending => b.cmp(&a),
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
