//! The notification center the library schedules against.
//!
//! The operating system owns the pending and delivered notification stores;
//! this module only describes the shape of that service. Each platform API
//! generation gets exactly one [`NotificationCenter`] adapter, and everything
//! above it is written once against the trait.

pub mod manager;
pub mod memory;

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::codec::DateComponents;
use crate::error::Result;
#[cfg(feature = "location")]
use crate::notification::trigger::Region;
use crate::notification::{NotificationSound, UserInfo};
use crate::settings::{AuthorizationOptions, SystemNotificationSettings};

/// Callback invoked by the center once an asynchronous call finishes.
pub type Completion<T> = Box<dyn FnOnce(T) + Send + 'static>;

/// Platform notification center. Retrieval calls are asynchronous and report
/// through their completion, possibly on another thread.
pub trait NotificationCenter: Send + Sync {
    fn request_authorization(&self, options: AuthorizationOptions, completion: Completion<Result<bool>>);

    fn get_settings(&self, completion: Completion<SystemNotificationSettings>);

    fn add(&self, request: NotificationRequest, completion: Option<Completion<Result<()>>>);

    fn get_pending_requests(&self, completion: Completion<Vec<NotificationRequest>>);

    fn remove_pending_requests(&self, identifiers: &[String]);

    fn remove_all_pending_requests(&self);

    fn get_delivered(&self, completion: Completion<Vec<DeliveredNotification>>);

    fn remove_delivered(&self, identifiers: &[String]);

    fn remove_all_delivered(&self);
}

/// Content as the center stores it. Absent text fields are empty strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    pub sound: NotificationSound,
    pub badge: Option<u32>,
    pub user_info: UserInfo,
    pub thread_identifier: String,
    pub category_identifier: String,
}

/// The center's own trigger representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum SystemTrigger {
    /// Fires whenever the local time matches every present component.
    Calendar {
        date_components: DateComponents,
        repeats: bool,
    },
    TimeInterval {
        interval: Duration,
        repeats: bool,
    },
    #[cfg(feature = "location")]
    Location { region: Region, repeats: bool },
}

impl SystemTrigger {
    pub fn repeats(&self) -> bool {
        match self {
            SystemTrigger::Calendar { repeats, .. } | SystemTrigger::TimeInterval { repeats, .. } => *repeats,
            #[cfg(feature = "location")]
            SystemTrigger::Location { repeats, .. } => *repeats,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationRequest {
    pub identifier: String,
    pub content: NotificationContent,
    pub trigger: Option<SystemTrigger>,
}

/// A notification the system has already shown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveredNotification {
    pub date: DateTime<Utc>,
    pub request: NotificationRequest,
}

/// Common view over pending requests and delivered notifications.
pub trait SystemNotification {
    fn identifier(&self) -> &str;
    fn content(&self) -> &NotificationContent;
    fn trigger(&self) -> Option<&SystemTrigger>;
    /// When the system showed the notification, if it has.
    fn delivery_date(&self) -> Option<DateTime<Utc>> {
        None
    }
}

impl SystemNotification for NotificationRequest {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn content(&self) -> &NotificationContent {
        &self.content
    }

    fn trigger(&self) -> Option<&SystemTrigger> {
        self.trigger.as_ref()
    }
}

impl SystemNotification for DeliveredNotification {
    fn identifier(&self) -> &str {
        &self.request.identifier
    }

    fn content(&self) -> &NotificationContent {
        &self.request.content
    }

    fn trigger(&self) -> Option<&SystemTrigger> {
        self.request.trigger.as_ref()
    }

    fn delivery_date(&self) -> Option<DateTime<Utc>> {
        Some(self.date)
    }
}
