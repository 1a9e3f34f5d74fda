//! Navigation port consumed as a callback by the task list.

use crate::task::domain::ScreenRoute;

/// Opens screens in the host application.
pub trait Navigator: Send + Sync {
    /// Opens the screen encoded by `route` (`<ScreenName>?<key>=<value>`).
    fn open_screen(&self, route: &str);

    /// Opens a typed route.
    fn open(&self, route: ScreenRoute) {
        self.open_screen(&route.to_string());
    }
}
