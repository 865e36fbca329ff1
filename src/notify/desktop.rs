//! Desktop notifications through the platform notification service

use notify_rust::Notification;
use tracing::debug;

use focuschain_protocol::APP_NAME;

use super::{Notifier, NotifyError, Permission};

const ICON: &str = "alarm-clock";

/// Notifier backed by the desktop notification daemon
#[derive(Debug, Default)]
pub struct DesktopNotifier {
    permission: Permission,
}

impl DesktopNotifier {
    pub fn new(permission: Permission) -> Self {
        Self { permission }
    }
}

impl Notifier for DesktopNotifier {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn set_permission(&mut self, permission: Permission) {
        self.permission = permission;
    }

    fn notify(&mut self, title: &str, body: &str) -> Result<(), NotifyError> {
        Notification::new()
            .summary(title)
            .body(body)
            .appname(APP_NAME)
            .icon(ICON)
            .show()
            .map(drop)
            .map_err(|e| NotifyError::Desktop(e.to_string()))?;
        debug!(%body, "desktop notification shown");
        Ok(())
    }
}
