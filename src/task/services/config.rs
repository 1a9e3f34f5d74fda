//! Tunables for the task list controller and swipe gestures.

use super::swipe::{SwipeConfig, SwipePolarity};
use crate::task::domain::SortMode;
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use thiserror::Error;

/// Default time after which an unsettled write counts as failed.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default fraction of the item width a drag must cover to commit.
pub const DEFAULT_COMMIT_THRESHOLD: f64 = 0.6;

/// Configuration for the task list.
///
/// Deserializes from JSON with durations given in milliseconds; every field
/// is optional and falls back to [`TaskListConfig::default`].
///
/// # Examples
///
/// ```
/// use taskdeck::task::services::TaskListConfig;
///
/// let config = TaskListConfig::from_json_str(r#"{ "commit_threshold": 0.5 }"#)
///     .expect("valid config");
/// assert_eq!(config.write_timeout, std::time::Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaskListConfig {
    /// Time after which an unsettled gateway write counts as failed.
    #[serde(rename = "write_timeout_ms", deserialize_with = "duration_from_millis")]
    pub write_timeout: Duration,
    /// Fraction of the item width a drag must cover to commit, in `(0, 1]`.
    pub commit_threshold: f64,
    /// Which side completes and which side deletes on the active tab.
    pub swipe_polarity: SwipePolarity,
    /// Sort mode applied when the list opens.
    pub default_sort: SortMode,
    /// Quiet period after the last edit before pending edits are persisted.
    ///
    /// `None` leaves persistence to explicit flushes.
    #[serde(
        rename = "edit_debounce_ms",
        deserialize_with = "optional_duration_from_millis"
    )]
    pub edit_debounce: Option<Duration>,
}

impl Default for TaskListConfig {
    fn default() -> Self {
        Self {
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            commit_threshold: DEFAULT_COMMIT_THRESHOLD,
            swipe_polarity: SwipePolarity::default(),
            default_sort: SortMode::default(),
            edit_debounce: None,
        }
    }
}

impl TaskListConfig {
    /// Creates a configuration for interactive editing, persisting edits
    /// half a second after the last keystroke.
    #[must_use]
    pub fn interactive() -> Self {
        Self {
            edit_debounce: Some(Duration::from_millis(500)),
            ..Self::default()
        }
    }

    /// Sets the write timeout.
    #[must_use]
    pub const fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Sets the swipe commit threshold. The value is checked by
    /// [`Self::validate`], not here.
    #[must_use]
    pub const fn with_commit_threshold(mut self, threshold: f64) -> Self {
        self.commit_threshold = threshold;
        self
    }

    /// Sets the swipe polarity.
    #[must_use]
    pub const fn with_swipe_polarity(mut self, polarity: SwipePolarity) -> Self {
        self.swipe_polarity = polarity;
        self
    }

    /// Sets the initial sort mode.
    #[must_use]
    pub const fn with_default_sort(mut self, sort_mode: SortMode) -> Self {
        self.default_sort = sort_mode;
        self
    }

    /// Sets the edit debounce period.
    #[must_use]
    pub const fn with_edit_debounce(mut self, debounce: Option<Duration>) -> Self {
        self.edit_debounce = debounce;
        self
    }

    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`TaskListConfigError::Parse`] for malformed JSON or unknown
    /// fields, and the [`TaskListConfig::validate`] errors otherwise.
    pub fn from_json_str(json: &str) -> Result<Self, TaskListConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`TaskListConfigError::InvalidCommitThreshold`] unless the
    /// threshold lies in `(0, 1]`, and [`TaskListConfigError::ZeroWriteTimeout`]
    /// for a zero timeout.
    pub fn validate(&self) -> Result<(), TaskListConfigError> {
        let threshold = self.commit_threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(TaskListConfigError::InvalidCommitThreshold(threshold));
        }
        if self.write_timeout.is_zero() {
            return Err(TaskListConfigError::ZeroWriteTimeout);
        }
        Ok(())
    }

    /// Returns the swipe settings derived from this configuration.
    #[must_use]
    pub const fn swipe(&self) -> SwipeConfig {
        SwipeConfig {
            commit_threshold: self.commit_threshold,
            polarity: self.swipe_polarity,
        }
    }
}

/// Errors raised while loading a [`TaskListConfig`].
#[derive(Debug, Error)]
pub enum TaskListConfigError {
    /// Commit threshold outside `(0, 1]`.
    #[error("commit threshold must lie in (0, 1], got {0}")]
    InvalidCommitThreshold(f64),

    /// Write timeout of zero.
    #[error("write timeout must be greater than zero")]
    ZeroWriteTimeout,

    /// Malformed configuration document.
    #[error("invalid task list configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

fn duration_from_millis<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(deserializer).map(Duration::from_millis)
}

fn optional_duration_from_millis<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<u64>::deserialize(deserializer).map(|millis| millis.map(Duration::from_millis))
}
