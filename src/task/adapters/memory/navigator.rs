//! Navigator that records requested routes.

use crate::task::{domain::ScreenRoute, ports::Navigator};
use std::sync::{Arc, Mutex, PoisonError};

/// Navigator adapter that keeps every opened route in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    opened: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    /// Creates a navigator with no recorded routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the raw routes opened so far.
    #[must_use]
    pub fn opened(&self) -> Vec<String> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the most recent route, parsed.
    ///
    /// Routes that do not parse are skipped.
    #[must_use]
    pub fn last_route(&self) -> Option<ScreenRoute> {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .rev()
            .find_map(|route| route.parse().ok())
    }
}

impl Navigator for RecordingNavigator {
    fn open_screen(&self, route: &str) {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route.to_owned());
    }
}
