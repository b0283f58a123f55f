//! Conversion between [`RobinNotification`] and the center's request shape.
//!
//! Calendar triggers are stored by the center as partial date components. A
//! repeating trigger only keeps the components that matter for its
//! recurrence, so the year, month or day of the original fire date is lost.
//! The original date is stashed in the notification's user info when the
//! trigger is set and replayed here when decoding. This mirrors how the
//! platform behaves and is required to hand callers back the trigger they
//! scheduled.

use std::time::Duration;

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::center::{
    DeliveredNotification, NotificationContent, NotificationRequest, SystemNotification,
    SystemTrigger,
};
use crate::date::{self, calendar_weekday, DateOffset};
use crate::notification::trigger::{NotificationTrigger, Repeats};
use crate::notification::RobinNotification;

/// Calendar components a trigger matches against. `weekday` counts from
/// Sunday = 1.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DateComponents {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub weekday: Option<u32>,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
    pub second: Option<u32>,
}

impl DateComponents {
    /// Components matching `date` at the granularity `repeats` needs. Each
    /// shorter cadence keeps a subset of the longer one's fields.
    pub fn from_date(date: NaiveDateTime, repeats: Repeats) -> Self {
        let mut components = DateComponents::default();
        match repeats {
            Repeats::None => {
                components.year = Some(date.year());
                components.month = Some(date.month());
                components.day = Some(date.day());
                components.hour = Some(date.hour());
                components.minute = Some(date.minute());
            }
            Repeats::Month => {
                components.day = Some(date.day());
                components.hour = Some(date.hour());
                components.minute = Some(date.minute());
            }
            Repeats::Week | Repeats::Day | Repeats::Hour => {
                if repeats == Repeats::Week {
                    components.weekday = Some(calendar_weekday(date));
                }
                if matches!(repeats, Repeats::Week | Repeats::Day) {
                    components.hour = Some(date.hour());
                }
                components.minute = Some(date.minute());
            }
        }
        components.second = Some(0);
        components
    }

    /// Infers the cadence from which fields are present, most specific first.
    /// Anything unrecognised is treated as a one-shot trigger.
    pub fn repeats(&self) -> Repeats {
        let has = |field: Option<u32>| field.is_some();
        if self.year.is_some()
            && has(self.month)
            && has(self.day)
            && has(self.hour)
            && has(self.minute)
        {
            Repeats::None
        } else if has(self.day) && has(self.hour) && has(self.minute) {
            Repeats::Month
        } else if has(self.weekday) && has(self.hour) && has(self.minute) && has(self.second) {
            Repeats::Week
        } else if has(self.hour) && has(self.minute) && has(self.second) {
            Repeats::Day
        } else if has(self.minute) && has(self.second) {
            Repeats::Hour
        } else {
            debug!(components = ?self, "components match no cadence; treating as one-shot");
            Repeats::None
        }
    }

    /// Resolves to a concrete date, filling the fields a repeating trigger
    /// dropped from `original` (or the current moment when nothing was
    /// stashed). Monthly copies year and month; weekly and daily copy the
    /// day as well; hourly also copies the hour.
    pub fn reconstruct(&self, repeats: Repeats, original: Option<NaiveDateTime>) -> NaiveDateTime {
        let base = original.unwrap_or_else(date::now);
        let mut filled = *self;
        match repeats {
            Repeats::None => {}
            Repeats::Month => {
                filled.year = Some(base.year());
                filled.month = Some(base.month());
            }
            Repeats::Week | Repeats::Day => {
                filled.year = Some(base.year());
                filled.month = Some(base.month());
                filled.day = Some(base.day());
            }
            Repeats::Hour => {
                filled.year = Some(base.year());
                filled.month = Some(base.month());
                filled.day = Some(base.day());
                filled.hour = Some(base.hour());
            }
        }
        filled.resolve(base).unwrap_or_else(|| {
            warn!(components = ?filled, "unresolvable date components; using base date");
            base.truncate_seconds()
        })
    }

    /// Lenient resolution: out-of-range fields roll over into the next unit
    /// (the 31st of a 30-day month is the 1st of the next). Missing date
    /// fields come from `fallback`, missing time fields are zero. The weekday
    /// is ignored once a day is known.
    fn resolve(&self, fallback: NaiveDateTime) -> Option<NaiveDateTime> {
        let year = self.year.unwrap_or_else(|| fallback.year());
        let month = self.month.unwrap_or_else(|| fallback.month());
        let day = self.day.unwrap_or_else(|| fallback.day());
        let date = NaiveDate::from_ymd_opt(year, 1, 1)?
            .checked_add_months(Months::new(month.checked_sub(1)?))?
            .checked_add_days(Days::new(u64::from(day.checked_sub(1)?)))?;
        let offset = TimeDelta::try_hours(i64::from(self.hour.unwrap_or(0)))?
            + TimeDelta::try_minutes(i64::from(self.minute.unwrap_or(0)))?
            + TimeDelta::try_seconds(i64::from(self.second.unwrap_or(0)))?;
        date.and_time(NaiveTime::MIN).checked_add_signed(offset)
    }
}

/// Encodes a trigger into the center's representation.
pub fn encode_trigger(trigger: &NotificationTrigger) -> SystemTrigger {
    match trigger {
        NotificationTrigger::Date { date, repeats } => SystemTrigger::Calendar {
            date_components: DateComponents::from_date(*date, *repeats),
            repeats: repeats.is_repeating(),
        },
        NotificationTrigger::Interval { interval, repeats } => SystemTrigger::TimeInterval {
            interval: *interval,
            repeats: *repeats,
        },
        #[cfg(feature = "location")]
        NotificationTrigger::Location { region, repeats } => SystemTrigger::Location {
            region: region.clone(),
            repeats: *repeats,
        },
    }
}

/// Decodes the center's trigger. `original` is the stashed fire date used to
/// restore components a repeating calendar trigger no longer carries.
pub fn decode_trigger(trigger: &SystemTrigger, original: Option<NaiveDateTime>) -> NotificationTrigger {
    match trigger {
        SystemTrigger::Calendar {
            date_components, ..
        } => {
            let repeats = date_components.repeats();
            let date = date_components.reconstruct(repeats, original);
            NotificationTrigger::date(date, repeats)
        }
        SystemTrigger::TimeInterval { interval, repeats } => {
            NotificationTrigger::interval(*interval, *repeats)
        }
        #[cfg(feature = "location")]
        SystemTrigger::Location { region, repeats } => {
            NotificationTrigger::location(region.clone(), *repeats)
        }
    }
}

impl RobinNotification {
    /// The request handed to the center when scheduling.
    pub fn notification_request(&self) -> NotificationRequest {
        NotificationRequest {
            identifier: self.identifier().to_string(),
            content: NotificationContent {
                title: self.title.clone().unwrap_or_default(),
                body: self.body.clone(),
                sound: self.sound.clone(),
                badge: self.badge,
                user_info: self.user_info().clone(),
                thread_identifier: self.thread_identifier.clone().unwrap_or_default(),
                category_identifier: self.category_identifier.clone().unwrap_or_default(),
            },
            trigger: Some(encode_trigger(self.trigger())),
        }
    }

    /// Rebuilds a scheduled notification from a pending request.
    pub fn from_request(request: &NotificationRequest) -> Self {
        let mut notification = Self::from_system(request);
        notification.set_scheduled(true);
        notification
    }

    /// Rebuilds a delivered notification.
    pub fn from_delivered(delivered: &DeliveredNotification) -> Self {
        let mut notification = Self::from_system(delivered);
        notification.mark_delivered(delivered.date);
        notification
    }

    fn from_system(entry: &impl SystemNotification) -> Self {
        let content = entry.content();
        let mut notification = Self::with_identifier(
            entry.identifier(),
            content.body.clone(),
            NotificationTrigger::interval(Duration::ZERO, false),
        );
        notification.restore_user_info(&content.user_info);

        let trigger = match entry.trigger() {
            Some(trigger) => decode_trigger(trigger, notification.stashed_date()),
            None => placeholder(entry),
        };
        notification.set_trigger(trigger);

        if !content.title.trim().is_empty() {
            notification.title = Some(content.title.clone());
        }
        notification.badge = content.badge;
        notification.sound = content.sound.clone();
        notification.thread_identifier = non_empty(&content.thread_identifier);
        notification.category_identifier = non_empty(&content.category_identifier);
        notification
    }
}

/// Trigger for entries the center holds without one: such requests fire
/// immediately, so the delivery date (or now) is the best fire date.
fn placeholder(entry: &impl SystemNotification) -> NotificationTrigger {
    let date = entry
        .delivery_date()
        .map(|delivered| delivered.with_timezone(&chrono::Local).naive_local())
        .unwrap_or_else(date::now);
    NotificationTrigger::date(date, Repeats::None)
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
