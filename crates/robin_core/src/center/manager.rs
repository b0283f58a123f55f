use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::NotificationCenter;
use crate::blocking;
use crate::error::Result;
use crate::notification::RobinNotification;

/// Access to notifications the system has already delivered.
pub struct NotificationCenterManager {
    center: Arc<dyn NotificationCenter>,
    timeout: Duration,
}

impl NotificationCenterManager {
    pub fn new(center: Arc<dyn NotificationCenter>, timeout: Duration) -> Self {
        Self { center, timeout }
    }

    /// Delivered notifications still shown by the system. Blocks until the
    /// center answers.
    pub fn all_delivered(&self) -> Result<Vec<RobinNotification>> {
        let delivered = blocking::wait_for("get_delivered", self.timeout, |completion| {
            self.center.get_delivered(completion)
        })?;
        Ok(delivered.iter().map(RobinNotification::from_delivered).collect())
    }

    pub fn remove_delivered(&self, notification: &RobinNotification) {
        self.remove_delivered_with_identifier(notification.identifier());
    }

    pub fn remove_delivered_with_identifier(&self, identifier: &str) {
        debug!(%identifier, "removing delivered notification");
        self.center.remove_delivered(&[identifier.to_string()]);
    }

    pub fn remove_all_delivered(&self) {
        debug!("removing all delivered notifications");
        self.center.remove_all_delivered();
    }
}
