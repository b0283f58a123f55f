use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Local;
use parking_lot::Mutex;
use robin_core::date::{self, DateOffset};
use robin_core::settings::{AuthorizationOptions, AuthorizationStatus, SettingState, SystemNotificationSettings};
use robin_core::{
    MemoryNotificationCenter, NotificationSound, NotificationTrigger, Repeats, Robin, RobinConfig,
    RobinNotification, RobinNotificationGroup,
};
use tracing::{debug, info, warn};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub(crate) robin: RobinConfig,
    pub(crate) samples: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the preview settings through `lookup`. Invalid values are
    /// logged and replaced by their defaults one key at a time.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self {
            robin: RobinConfig::from_lookup(&lookup),
            ..Self::default()
        };
        if let Some(samples) = lookup("ROBIN_PREVIEW_SAMPLES") {
            match samples.trim().parse::<usize>() {
                Ok(value) => config.samples = value,
                Err(_) => warn!(value = %samples, "ignoring invalid ROBIN_PREVIEW_SAMPLES"),
            }
        }
        config
    }

    pub fn with_samples(mut self, samples: usize) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_robin(mut self, robin: RobinConfig) -> Self {
        self.robin = robin;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            robin: RobinConfig::default(),
            samples: 3,
        }
    }
}

/// Outcome of one preview run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreviewReport {
    pub scheduled: usize,
    pub rejected: usize,
    pub delivered: usize,
    pub group_scheduled: bool,
}

/// Schedules a set of sample notifications against an in-memory center and
/// reports what the scheduler accepted.
pub fn preview(config: &AppConfig) -> Result<PreviewReport> {
    let center = Arc::new(MemoryNotificationCenter::with_settings(SystemNotificationSettings {
        authorization_status: AuthorizationStatus::Authorized,
        alert: SettingState::Enabled,
        sound: SettingState::Enabled,
        badge: SettingState::Enabled,
        ..Default::default()
    }));
    let robin = Robin::builder()
        .with_notification_center(center.clone())
        .with_config(config.robin.clone())
        .build()
        .context("unable to build notification scheduler")?;

    let granted: Arc<Mutex<Option<robin_core::Result<bool>>>> = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&granted);
    robin.settings().request_authorization(
        AuthorizationOptions::ALERT | AuthorizationOptions::SOUND | AuthorizationOptions::BADGE,
        move |result| *slot.lock() = Some(result),
    );
    let granted = granted
        .lock()
        .take()
        .context("authorization request was never answered")?
        .context("authorization refused")?;
    info!(granted, status = ?robin.settings().authorization_status(), "authorization");

    let scheduler = robin.scheduler();
    let mut report = PreviewReport {
        scheduled: 0,
        rejected: 0,
        delivered: 0,
        group_scheduled: false,
    };

    for mut notification in samples(config.samples) {
        match scheduler.schedule(&mut notification) {
            Some(scheduled) => {
                debug!(identifier = %scheduled.identifier(), "sample scheduled");
                report.scheduled += 1;
            }
            None => {
                warn!(identifier = %notification.identifier(), "sample rejected");
                report.rejected += 1;
            }
        }
    }

    let mut group = RobinNotificationGroup::with_identifier(
        "preview-medication",
        vec![
            RobinNotification::new("Morning dose")
                .with_trigger(NotificationTrigger::date(date::date_with_time(800, 0), Repeats::Day)),
            RobinNotification::new("Evening dose")
                .with_trigger(NotificationTrigger::date(date::date_with_time(2000, 0), Repeats::Day)),
        ],
    );
    report.group_scheduled = scheduler.schedule_group(&mut group).is_some();
    if report.group_scheduled {
        report.scheduled += group.len();
    } else {
        report.rejected += group.len();
    }

    scheduler
        .log_scheduled()
        .context("unable to list scheduled notifications")?;

    if let Some(first) = scheduler.scheduled()?.first() {
        center.deliver(first.identifier());
    }
    let delivered = robin
        .manager()
        .all_delivered()
        .context("unable to list delivered notifications")?;
    for notification in &delivered {
        info!(identifier = %notification.identifier(), body = %notification.body, "delivered");
    }
    report.delivered = delivered.len();
    Ok(report)
}

pub fn run(config: AppConfig) -> Result<()> {
    let started = Local::now();
    let report = preview(&config)?;
    println!(
        "Robin preview at {}: {} scheduled, {} rejected, {} delivered (capacity {})",
        started.format("%Y-%m-%d %H:%M"),
        report.scheduled,
        report.rejected,
        report.delivered,
        config.robin.effective_capacity()
    );
    Ok(())
}

fn samples(count: usize) -> Vec<RobinNotification> {
    (0..count)
        .map(|i| {
            let trigger = match i % 3 {
                0 => NotificationTrigger::date(
                    date::next_days(1).truncate_seconds(),
                    Repeats::None,
                ),
                1 => NotificationTrigger::date(date::next_weeks(1), Repeats::Week),
                _ => NotificationTrigger::interval(Duration::from_secs(15 * 60), false),
            };
            RobinNotification::new(format!("Sample notification {}", i + 1))
                .with_title("Robin preview")
                .with_sound(NotificationSound::Default)
                .with_trigger(trigger)
        })
        .collect()
}
