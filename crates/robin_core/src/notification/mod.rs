pub mod group;
pub mod trigger;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::config::keys;
use crate::date;

use self::trigger::{NotificationTrigger, Repeats};

/// Free-form data attached to a notification. Values survive a round trip
/// through the notification center, so they are kept as JSON.
pub type UserInfo = BTreeMap<String, Value>;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum NotificationSound {
    #[default]
    Default,
    Named(String),
}

impl NotificationSound {
    pub fn named(name: impl Into<String>) -> Self {
        let name = name.into();
        if name == keys::DEFAULT_SOUND_NAME {
            NotificationSound::Default
        } else {
            NotificationSound::Named(name)
        }
    }

    pub fn name(&self) -> &str {
        match self {
            NotificationSound::Default => keys::DEFAULT_SOUND_NAME,
            NotificationSound::Named(name) => name,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, NotificationSound::Default)
    }

    pub fn is_valid(&self) -> bool {
        match self {
            NotificationSound::Default => true,
            NotificationSound::Named(name) => !name.trim().is_empty(),
        }
    }
}

/// A local notification as the caller sees it.
///
/// Two notifications are equal when their identifiers are equal; every other
/// field is ignored for equality and hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobinNotification {
    identifier: String,
    pub body: String,
    pub title: Option<String>,
    trigger: NotificationTrigger,
    user_info: UserInfo,
    pub badge: Option<u32>,
    pub sound: NotificationSound,
    pub thread_identifier: Option<String>,
    pub category_identifier: Option<String>,
    scheduled: bool,
    delivered: bool,
    delivery_date: Option<DateTime<Utc>>,
}

impl RobinNotification {
    /// A notification with a generated identifier that fires in an hour.
    pub fn new(body: impl Into<String>) -> Self {
        Self::with_identifier(
            Uuid::new_v4().to_string(),
            body,
            NotificationTrigger::date(date::next_hours(1), Repeats::None),
        )
    }

    pub fn with_identifier(
        identifier: impl Into<String>,
        body: impl Into<String>,
        trigger: NotificationTrigger,
    ) -> Self {
        let identifier = identifier.into();
        let mut user_info = UserInfo::new();
        user_info.insert(keys::IDENTIFIER.to_string(), Value::from(identifier.clone()));
        let mut notification = Self {
            identifier,
            body: body.into(),
            title: None,
            trigger: NotificationTrigger::interval(Default::default(), false),
            user_info,
            badge: None,
            sound: NotificationSound::Default,
            thread_identifier: None,
            category_identifier: None,
            scheduled: false,
            delivered: false,
            delivery_date: None,
        };
        notification.set_trigger(trigger);
        notification
    }

    pub fn with_trigger(mut self, trigger: NotificationTrigger) -> Self {
        self.set_trigger(trigger);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_badge(mut self, badge: u32) -> Self {
        self.badge = Some(badge);
        self
    }

    pub fn with_sound(mut self, sound: NotificationSound) -> Self {
        self.sound = sound;
        self
    }

    pub fn with_category(mut self, category_identifier: impl Into<String>) -> Self {
        self.category_identifier = Some(category_identifier.into());
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn trigger(&self) -> &NotificationTrigger {
        &self.trigger
    }

    /// Replaces the trigger. Date triggers lose sub-minute precision and their
    /// date is stashed in the user info so it can be recovered after the
    /// notification center strips the repeat-irrelevant date components.
    pub fn set_trigger(&mut self, trigger: NotificationTrigger) {
        let trigger = trigger.truncated();
        if let Some(date) = trigger.fire_date() {
            self.stash_date(date);
        }
        self.trigger = trigger;
    }

    pub fn fire_date(&self) -> Option<NaiveDateTime> {
        self.trigger.fire_date()
    }

    pub fn user_info(&self) -> &UserInfo {
        &self.user_info
    }

    /// Sets a user info value. Reserved keys are owned by the library and
    /// silently left untouched.
    pub fn set_user_info(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        if keys::is_reserved(&key) {
            debug!(%key, "ignoring write to reserved user info key");
            return;
        }
        self.user_info.insert(key, value.into());
    }

    pub fn remove_user_info(&mut self, key: &str) -> Option<Value> {
        if keys::is_reserved(key) {
            debug!(%key, "ignoring removal of reserved user info key");
            return None;
        }
        self.user_info.remove(key)
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    pub fn is_delivered(&self) -> bool {
        self.delivered
    }

    pub fn delivery_date(&self) -> Option<DateTime<Utc>> {
        self.delivery_date
    }

    /// Orders two date-triggered notifications by fire date. Returns `None`
    /// when either trigger is not a date.
    pub fn cmp_fire_date(&self, other: &Self) -> Option<Ordering> {
        Some(self.fire_date()?.cmp(&other.fire_date()?))
    }

    pub(crate) fn stashed_date(&self) -> Option<NaiveDateTime> {
        self.user_info
            .get(keys::DATE)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub(crate) fn set_scheduled(&mut self, scheduled: bool) {
        self.scheduled = scheduled;
    }

    pub(crate) fn mark_delivered(&mut self, delivery_date: DateTime<Utc>) {
        self.delivered = true;
        self.delivery_date = Some(delivery_date);
    }

    /// Copies system-held user info verbatim, reserved keys included.
    pub(crate) fn restore_user_info(&mut self, user_info: &UserInfo) {
        for (key, value) in user_info {
            self.user_info.insert(key.clone(), value.clone());
        }
    }

    fn stash_date(&mut self, date: NaiveDateTime) {
        if let Ok(value) = serde_json::to_value(date) {
            self.user_info.insert(keys::DATE.to_string(), value);
        }
    }
}

impl PartialEq for RobinNotification {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for RobinNotification {}

impl Hash for RobinNotification {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
    }
}

/// Sorts date-triggered notifications by ascending fire date; other triggers
/// keep their relative order at the end.
pub fn sort_by_fire_date(notifications: &mut [RobinNotification]) {
    notifications.sort_by(|a, b| match (a.fire_date(), b.fire_date()) {
        (Some(lhs), Some(rhs)) => lhs.cmp(&rhs),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

impl fmt::Display for RobinNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "RobinNotification: {}", self.identifier)?;
        if let Some(title) = &self.title {
            writeln!(f, "\tTitle: {title}")?;
        }
        if let Some(thread) = &self.thread_identifier {
            writeln!(f, "\tThread identifier: {thread}")?;
        }
        writeln!(f, "\tBody: {}", self.body)?;
        match &self.trigger {
            NotificationTrigger::Date { date, repeats } => {
                writeln!(f, "\tFires at: {date}")?;
                writeln!(f, "\tRepeats every: {repeats}")?;
            }
            NotificationTrigger::Interval { interval, repeats } => {
                writeln!(f, "\tFires after: {}s", interval.as_secs_f64())?;
                writeln!(f, "\tRepeating: {repeats}")?;
            }
            #[cfg(feature = "location")]
            NotificationTrigger::Location { region, repeats } => {
                writeln!(f, "\tFires around: {region}")?;
                writeln!(f, "\tRepeating: {repeats}")?;
            }
        }
        writeln!(
            f,
            "\tUser info: {}",
            serde_json::to_string(&self.user_info).unwrap_or_default()
        )?;
        if let Some(badge) = self.badge {
            writeln!(f, "\tBadge: {badge}")?;
        }
        writeln!(f, "\tSound name: {}", self.sound.name())?;
        writeln!(f, "\tScheduled: {}", self.scheduled)?;
        write!(f, "\tDelivered: {}", self.delivered)?;
        if let Some(delivery_date) = self.delivery_date {
            write!(f, "\n\tDelivered on: {delivery_date}")?;
        }
        Ok(())
    }
}
