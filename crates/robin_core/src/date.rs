//! Wall-clock date helpers used when building triggers.
//!
//! Calendar triggers match local wall-clock components, so every date here is a
//! [`NaiveDateTime`] in the device's local time.

use chrono::{Datelike, Duration, Local, Months, NaiveDateTime, NaiveTime, Timelike};

pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Offsets a date by calendar units. Negative amounts move backwards.
pub trait DateOffset: Sized {
    fn next_minutes(self, minutes: i64) -> Self;
    fn next_hours(self, hours: i64) -> Self;
    fn next_days(self, days: i64) -> Self;
    fn next_weeks(self, weeks: i64) -> Self;
    fn next_months(self, months: i64) -> Self;
    fn next_years(self, years: i64) -> Self;
    /// Drops seconds and sub-second precision.
    fn truncate_seconds(self) -> Self;
}

impl DateOffset for NaiveDateTime {
    fn next_minutes(self, minutes: i64) -> Self {
        shift(self, Duration::try_minutes(minutes), minutes)
    }

    fn next_hours(self, hours: i64) -> Self {
        shift(self, Duration::try_hours(hours), hours)
    }

    fn next_days(self, days: i64) -> Self {
        shift(self, Duration::try_days(days), days)
    }

    fn next_weeks(self, weeks: i64) -> Self {
        shift(self, Duration::try_weeks(weeks), weeks)
    }

    fn next_months(self, months: i64) -> Self {
        shift_months(self, months)
    }

    fn next_years(self, years: i64) -> Self {
        shift_months(self, years.saturating_mul(12))
    }

    fn truncate_seconds(self) -> Self {
        self.with_second(0)
            .and_then(|date| date.with_nanosecond(0))
            .unwrap_or(self)
    }
}

pub fn next_minutes(minutes: i64) -> NaiveDateTime {
    now().next_minutes(minutes)
}

pub fn next_hours(hours: i64) -> NaiveDateTime {
    now().next_hours(hours)
}

pub fn next_days(days: i64) -> NaiveDateTime {
    now().next_days(days)
}

pub fn next_weeks(weeks: i64) -> NaiveDateTime {
    now().next_weeks(weeks)
}

pub fn next_months(months: i64) -> NaiveDateTime {
    now().next_months(months)
}

pub fn next_years(years: i64) -> NaiveDateTime {
    now().next_years(years)
}

/// Today's date at `time` (HHMM) shifted by `offset` minutes, moved to
/// tomorrow when that moment has already passed.
pub fn date_with_time(time: i64, offset: i64) -> NaiveDateTime {
    date_with_time_from(now(), time, offset)
}

pub fn date_with_time_from(reference: NaiveDateTime, time: i64, offset: i64) -> NaiveDateTime {
    let minutes = (time / 100 + offset / 60) * 60 + time % 100 + offset % 60;
    let date = reference.date().and_time(NaiveTime::MIN).next_minutes(minutes);
    if date < reference {
        date.next_days(1)
    } else {
        date
    }
}

fn shift(date: NaiveDateTime, delta: Option<Duration>, amount: i64) -> NaiveDateTime {
    delta
        .and_then(|delta| date.checked_add_signed(delta))
        .unwrap_or(if amount >= 0 {
            NaiveDateTime::MAX
        } else {
            NaiveDateTime::MIN
        })
}

fn shift_months(date: NaiveDateTime, months: i64) -> NaiveDateTime {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).unwrap_or(u32::MAX));
    let shifted = if months >= 0 {
        date.checked_add_months(magnitude)
    } else {
        date.checked_sub_months(magnitude)
    };
    shifted.unwrap_or(if months >= 0 {
        NaiveDateTime::MAX
    } else {
        NaiveDateTime::MIN
    })
}

/// Weekday numbered the way calendar components number it: Sunday is 1.
pub fn calendar_weekday(date: NaiveDateTime) -> u32 {
    date.weekday().number_from_sunday()
}
