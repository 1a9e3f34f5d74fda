//! Identifier and validated scalar types for the task domain.

use super::TaskDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for a task record.
///
/// Identifiers are assigned once at creation and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new random task identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a task identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for TaskId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = TaskDomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| TaskDomainError::InvalidTaskId(value.to_owned()))
    }
}

/// Identifier of a user who owns or is assigned to tasks.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a validated user identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidUserId`] when the value is empty or
    /// contains whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() || normalized.chars().any(char::is_whitespace) {
            return Err(TaskDomainError::InvalidUserId(raw));
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Geographic coordinates attached to a task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    latitude: f64,
    longitude: f64,
}

impl GeoLocation {
    /// Creates validated coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidLocation`] when either coordinate is
    /// not finite or lies outside `[-90, 90]` / `[-180, 180]`.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, TaskDomainError> {
        let valid_latitude = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
        let valid_longitude = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);
        if !valid_latitude || !valid_longitude {
            return Err(TaskDomainError::InvalidLocation {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Returns the latitude in degrees.
    #[must_use]
    pub const fn latitude(self) -> f64 {
        self.latitude
    }

    /// Returns the longitude in degrees.
    #[must_use]
    pub const fn longitude(self) -> f64 {
        self.longitude
    }
}
