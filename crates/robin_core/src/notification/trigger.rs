use std::fmt;
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::date::DateOffset;

/// How often a date-triggered notification repeats.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Repeats {
    #[default]
    None,
    Hour,
    Day,
    Week,
    Month,
}

impl Repeats {
    pub fn as_str(&self) -> &'static str {
        match self {
            Repeats::None => "None",
            Repeats::Hour => "Hour",
            Repeats::Day => "Day",
            Repeats::Week => "Week",
            Repeats::Month => "Month",
        }
    }

    pub fn is_repeating(&self) -> bool {
        !matches!(self, Repeats::None)
    }
}

impl fmt::Display for Repeats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Circular geographic region watched for entry or exit.
#[cfg(feature = "location")]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Region {
    pub identifier: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Radius in meters.
    pub radius: f64,
    pub notify_on_entry: bool,
    pub notify_on_exit: bool,
}

#[cfg(feature = "location")]
impl Region {
    pub fn new(identifier: impl Into<String>, latitude: f64, longitude: f64, radius: f64) -> Self {
        Self {
            identifier: identifier.into(),
            latitude,
            longitude,
            radius,
            notify_on_entry: true,
            notify_on_exit: false,
        }
    }
}

#[cfg(feature = "location")]
impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:.5}, {:.5}) radius {}m",
            self.identifier, self.latitude, self.longitude, self.radius
        )
    }
}

/// What causes a notification to fire. Equality is structural within a
/// variant; triggers of different kinds never compare equal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum NotificationTrigger {
    Date {
        date: NaiveDateTime,
        repeats: Repeats,
    },
    Interval {
        interval: Duration,
        repeats: bool,
    },
    #[cfg(feature = "location")]
    Location { region: Region, repeats: bool },
}

impl NotificationTrigger {
    pub fn date(date: NaiveDateTime, repeats: Repeats) -> Self {
        NotificationTrigger::Date { date, repeats }
    }

    pub fn interval(interval: Duration, repeats: bool) -> Self {
        NotificationTrigger::Interval { interval, repeats }
    }

    #[cfg(feature = "location")]
    pub fn location(region: Region, repeats: bool) -> Self {
        NotificationTrigger::Location { region, repeats }
    }

    pub fn fire_date(&self) -> Option<NaiveDateTime> {
        match self {
            NotificationTrigger::Date { date, .. } => Some(*date),
            _ => None,
        }
    }

    pub fn repeats(&self) -> bool {
        match self {
            NotificationTrigger::Date { repeats, .. } => repeats.is_repeating(),
            NotificationTrigger::Interval { repeats, .. } => *repeats,
            #[cfg(feature = "location")]
            NotificationTrigger::Location { repeats, .. } => *repeats,
        }
    }

    /// Date triggers only carry minute precision.
    pub(crate) fn truncated(self) -> Self {
        match self {
            NotificationTrigger::Date { date, repeats } => NotificationTrigger::Date {
                date: date.truncate_seconds(),
                repeats,
            },
            other => other,
        }
    }
}
