//! Creation input and field edits for task records.

use super::{GeoLocation, TaskDomainError, UserId};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Partial task supplied by the create form.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    owner: UserId,
    title: String,
    description: String,
    assignees: BTreeSet<UserId>,
    due_date: Option<NaiveDate>,
    due_time: Option<NaiveTime>,
    color: Option<u32>,
    image_uri: Option<String>,
    location: Option<GeoLocation>,
    location_name: Option<String>,
    reminder_lead: Option<Duration>,
}

/// Validated draft fields handed to [`super::Task::from_draft`].
pub(crate) struct DraftParts {
    pub(crate) owner: UserId,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) assignees: BTreeSet<UserId>,
    pub(crate) due_date: Option<NaiveDate>,
    pub(crate) due_time: Option<NaiveTime>,
    pub(crate) color: Option<u32>,
    pub(crate) image_uri: Option<String>,
    pub(crate) location: Option<GeoLocation>,
    pub(crate) location_name: Option<String>,
    pub(crate) reminder_lead: Option<Duration>,
}

impl TaskDraft {
    /// Creates a draft with the required fields.
    #[must_use]
    pub fn new(owner: UserId, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            owner,
            title: title.into(),
            description: description.into(),
            assignees: BTreeSet::new(),
            due_date: None,
            due_time: None,
            color: None,
            image_uri: None,
            location: None,
            location_name: None,
            reminder_lead: None,
        }
    }

    /// Sets the assigned users.
    #[must_use]
    pub fn with_assignees(mut self, assignees: impl IntoIterator<Item = UserId>) -> Self {
        self.assignees = assignees.into_iter().collect();
        self
    }

    /// Sets the due date.
    #[must_use]
    pub const fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    /// Sets the due time of day.
    #[must_use]
    pub const fn with_due_time(mut self, due_time: NaiveTime) -> Self {
        self.due_time = Some(due_time);
        self
    }

    /// Sets the accent color.
    #[must_use]
    pub const fn with_color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    /// Sets the image reference.
    #[must_use]
    pub fn with_image_uri(mut self, image_uri: impl Into<String>) -> Self {
        self.image_uri = Some(image_uri.into());
        self
    }

    /// Sets the coordinates and their display name.
    #[must_use]
    pub fn with_location(mut self, location: GeoLocation, name: impl Into<String>) -> Self {
        self.location = Some(location);
        self.location_name = Some(name.into());
        self
    }

    /// Sets the reminder lead time.
    #[must_use]
    pub const fn with_reminder_lead(mut self, lead: Duration) -> Self {
        self.reminder_lead = Some(lead);
        self
    }

    /// Returns the owning user.
    #[must_use]
    pub const fn owner(&self) -> &UserId {
        &self.owner
    }

    /// Checks that the draft can become a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] or
    /// [`TaskDomainError::EmptyDescription`] when either field is blank.
    pub fn validate(&self) -> Result<(), TaskDomainError> {
        if self.title.trim().is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        if self.description.trim().is_empty() {
            return Err(TaskDomainError::EmptyDescription);
        }
        Ok(())
    }

    pub(crate) fn into_parts(self) -> DraftParts {
        DraftParts {
            owner: self.owner,
            title: self.title,
            description: self.description,
            assignees: self.assignees,
            due_date: self.due_date,
            due_time: self.due_time,
            color: self.color,
            image_uri: self.image_uri,
            location: self.location,
            location_name: self.location_name,
            reminder_lead: self.reminder_lead,
        }
    }
}

/// A single field mutation applied by the edit screen.
///
/// Edits are not validated: the title may be blank mid-typing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum TaskEdit {
    /// Replaces the title.
    Title(String),
    /// Replaces the description.
    Description(String),
    /// Sets or clears the due date.
    DueDate(Option<NaiveDate>),
    /// Sets or clears the due time.
    DueTime(Option<NaiveTime>),
    /// Sets or clears the accent color.
    Color(Option<u32>),
    /// Sets or clears the image reference.
    ImageUri(Option<String>),
    /// Sets or clears the coordinates and their name.
    Location {
        /// New coordinates.
        location: Option<GeoLocation>,
        /// New display name.
        name: Option<String>,
    },
    /// Sets or clears the reminder lead time.
    ReminderLead(Option<Duration>),
    /// Replaces the assigned users.
    Assignees(BTreeSet<UserId>),
}
