use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::RobinNotification;

/// Notifications scheduled together under one identifier. The identifier is
/// written into every member's thread identifier, which is also how the
/// system groups them visually.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RobinNotificationGroup {
    identifier: String,
    notifications: Vec<RobinNotification>,
}

impl RobinNotificationGroup {
    pub fn new(notifications: Vec<RobinNotification>) -> Self {
        Self::with_identifier(Uuid::new_v4().to_string(), notifications)
    }

    pub fn with_identifier(
        identifier: impl Into<String>,
        mut notifications: Vec<RobinNotification>,
    ) -> Self {
        let identifier = identifier.into();
        for notification in &mut notifications {
            notification.thread_identifier = Some(identifier.clone());
        }
        Self {
            identifier,
            notifications,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn notifications(&self) -> &[RobinNotification] {
        &self.notifications
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    pub fn into_notifications(self) -> Vec<RobinNotification> {
        self.notifications
    }

    pub(crate) fn notifications_mut(&mut self) -> &mut [RobinNotification] {
        &mut self.notifications
    }
}
