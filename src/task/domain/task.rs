//! Task record and lifecycle status types.

use super::{GeoLocation, ParseTaskStatusError, TaskDraft, TaskEdit, TaskId, UserId};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

/// Conventional reminder lead time offered by task editors (one hour).
pub const DEFAULT_REMINDER_LEAD: Duration = Duration::from_secs(60 * 60);

/// Task lifecycle status.
///
/// Each status also names the tab a task is browsed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task is open and shown on the primary tab.
    Active,
    /// Task has been completed.
    Completed,
    /// Task has been moved to the deleted tab (soft delete).
    Deleted,
}

impl TaskStatus {
    /// All statuses in tab order.
    pub const ALL: [Self; 3] = [Self::Active, Self::Completed, Self::Deleted];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Deleted => "deleted",
        }
    }

    /// Returns whether a direct move to `target` is permitted.
    ///
    /// Only `Active <-> Completed` and `Active <-> Deleted` are valid; the
    /// terminal statuses never move into each other directly.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Active, Self::Completed | Self::Deleted)
                | (Self::Completed | Self::Deleted, Self::Active)
        )
    }

    /// Returns whether tasks with this status may be multi-selected.
    #[must_use]
    pub const fn is_selectable(self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "deleted" => Ok(Self::Deleted),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// A single task owned by a user.
///
/// Selection is tracked outside the record, keyed by [`TaskId`], so a record
/// can be replaced freely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    title: String,
    description: String,
    owner: UserId,
    assignees: BTreeSet<UserId>,
    status: TaskStatus,
    due_date: Option<NaiveDate>,
    due_time: Option<NaiveTime>,
    color: Option<u32>,
    image_uri: Option<String>,
    location: Option<GeoLocation>,
    location_name: Option<String>,
    created_at: DateTime<Utc>,
    reminder_lead: Option<Duration>,
}

/// Parameter object for reconstructing a stored task.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedTaskData {
    /// Stored task identifier.
    pub id: TaskId,
    /// Stored title.
    pub title: String,
    /// Stored description.
    pub description: String,
    /// Owning user.
    pub owner: UserId,
    /// Assigned users.
    pub assignees: BTreeSet<UserId>,
    /// Stored lifecycle status.
    pub status: TaskStatus,
    /// Due date, if any.
    pub due_date: Option<NaiveDate>,
    /// Due time of day, if any.
    pub due_time: Option<NaiveTime>,
    /// Accent color as packed ARGB.
    pub color: Option<u32>,
    /// Opaque image reference.
    pub image_uri: Option<String>,
    /// Coordinates, if any.
    pub location: Option<GeoLocation>,
    /// Human-readable location name.
    pub location_name: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Reminder lead time before the due moment.
    pub reminder_lead: Option<Duration>,
}

impl Task {
    /// Creates a new active task from a validated draft.
    #[must_use]
    pub fn from_draft(draft: TaskDraft, clock: &impl Clock) -> Self {
        let parts = draft.into_parts();
        Self {
            id: TaskId::new(),
            title: parts.title,
            description: parts.description,
            owner: parts.owner,
            assignees: parts.assignees,
            status: TaskStatus::Active,
            due_date: parts.due_date,
            due_time: parts.due_time,
            color: parts.color,
            image_uri: parts.image_uri,
            location: parts.location,
            location_name: parts.location_name,
            created_at: clock.utc(),
            reminder_lead: parts.reminder_lead,
        }
    }

    /// Reconstructs a task from stored data.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            owner: data.owner,
            assignees: data.assignees,
            status: data.status,
            due_date: data.due_date,
            due_time: data.due_time,
            color: data.color,
            image_uri: data.image_uri,
            location: data.location,
            location_name: data.location_name,
            created_at: data.created_at,
            reminder_lead: data.reminder_lead,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the owning user.
    #[must_use]
    pub const fn owner(&self) -> &UserId {
        &self.owner
    }

    /// Returns the assigned users.
    #[must_use]
    pub const fn assignees(&self) -> &BTreeSet<UserId> {
        &self.assignees
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the due date, if any.
    #[must_use]
    pub const fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    /// Returns the due time of day, if any.
    #[must_use]
    pub const fn due_time(&self) -> Option<NaiveTime> {
        self.due_time
    }

    /// Returns the accent color, if any.
    #[must_use]
    pub const fn color(&self) -> Option<u32> {
        self.color
    }

    /// Returns the image reference, if any.
    #[must_use]
    pub fn image_uri(&self) -> Option<&str> {
        self.image_uri.as_deref()
    }

    /// Returns the coordinates, if any.
    #[must_use]
    pub const fn location(&self) -> Option<GeoLocation> {
        self.location
    }

    /// Returns the location name, if any.
    #[must_use]
    pub fn location_name(&self) -> Option<&str> {
        self.location_name.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the reminder lead time, if any.
    #[must_use]
    pub const fn reminder_lead(&self) -> Option<Duration> {
        self.reminder_lead
    }

    /// Returns the combined due moment.
    ///
    /// A due date without a time resolves to the start of that day.
    #[must_use]
    pub fn due_moment(&self) -> Option<NaiveDateTime> {
        self.due_date
            .map(|date| date.and_time(self.due_time.unwrap_or(NaiveTime::MIN)))
    }

    /// Returns the moment a reminder should fire, if both a due moment and a
    /// lead time are set.
    #[must_use]
    pub fn reminder_at(&self) -> Option<NaiveDateTime> {
        let lead = TimeDelta::from_std(self.reminder_lead?).ok()?;
        self.due_moment()?.checked_sub_signed(lead)
    }

    /// Renders the due date and time for list rows, e.g.
    /// `Tue, 2 May 2023 16:52`.
    #[must_use]
    pub fn due_label(&self) -> String {
        let Some(date) = self.due_date else {
            return String::new();
        };
        let date_label = date.format("%a, %-d %b %Y").to_string();
        match self.due_time {
            Some(time) => format!("{date_label} {}", time.format("%H:%M")),
            None => date_label,
        }
    }

    /// Applies a field edit in place.
    pub fn apply_edit(&mut self, edit: &TaskEdit) {
        match edit {
            TaskEdit::Title(title) => self.title.clone_from(title),
            TaskEdit::Description(description) => self.description.clone_from(description),
            TaskEdit::DueDate(due_date) => self.due_date = *due_date,
            TaskEdit::DueTime(due_time) => self.due_time = *due_time,
            TaskEdit::Color(color) => self.color = *color,
            TaskEdit::ImageUri(image_uri) => self.image_uri.clone_from(image_uri),
            TaskEdit::Location { location, name } => {
                self.location = *location;
                self.location_name.clone_from(name);
            }
            TaskEdit::ReminderLead(lead) => self.reminder_lead = *lead,
            TaskEdit::Assignees(assignees) => self.assignees.clone_from(assignees),
        }
    }

    /// Overwrites the status without lifecycle validation.
    ///
    /// Used when applying a status already accepted elsewhere (optimistic
    /// writes, reverts, stored patches).
    pub(crate) const fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
    }

    /// Replaces the identifier with the one the store assigned.
    pub(crate) const fn reassign_id(&mut self, id: TaskId) {
        self.id = id;
    }
}
