use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Timelike;
use parking_lot::Mutex;
use robin_core::actions::{NotificationResponse, SystemNotificationResponse, DEFAULT_ACTION_IDENTIFIER};
use robin_core::center::NotificationCenter;
use robin_core::date::{self, DateOffset};
use robin_core::settings::{AuthorizationOptions, AuthorizationStatus, SettingState, SettingsOptions, SystemNotificationSettings};
use robin_core::{
    MemoryNotificationCenter, NotificationTrigger, Repeats, Robin, RobinConfig, RobinError,
    RobinNotification, RobinNotificationGroup,
};

fn robin_with(max: usize) -> (Arc<MemoryNotificationCenter>, Robin) {
    let center = Arc::new(MemoryNotificationCenter::new());
    let config = RobinConfig::default()
        .with_maximum_allowed_notifications(max)
        .with_query_timeout(Duration::from_millis(200));
    let robin = Robin::builder()
        .with_notification_center(center.clone())
        .with_config(config)
        .build()
        .expect("build robin");
    (center, robin)
}

fn identifiers(robin: &Robin) -> Vec<String> {
    let mut ids: Vec<String> = robin
        .scheduler()
        .scheduled()
        .expect("scheduled")
        .iter()
        .map(|n| n.identifier().to_string())
        .collect();
    ids.sort();
    ids
}

fn record(identifier: &str, body: &str) -> RobinNotification {
    RobinNotification::with_identifier(
        identifier,
        body,
        NotificationTrigger::date(date::next_days(1), Repeats::None),
    )
}

#[test]
fn capacity_scenario_with_two_slots() {
    let (_center, robin) = robin_with(2);
    let scheduler = robin.scheduler();

    let mut a = record("a", "a");
    let mut b = record("b", "b");
    let mut c = record("c", "c");

    assert!(scheduler.schedule(&mut a).is_some());
    assert!(scheduler.schedule(&mut b).is_some());
    assert_eq!(scheduler.scheduled_count().expect("count"), 2);

    assert!(scheduler.schedule(&mut c).is_none());
    assert!(!c.is_scheduled());

    scheduler.cancel(&mut a);
    assert!(!a.is_scheduled());
    assert!(scheduler.schedule(&mut c).is_some());
    assert_eq!(scheduler.scheduled_count().expect("count"), 2);
    assert_eq!(identifiers(&robin), vec!["b", "c"]);
}

#[test]
fn default_configuration_stops_at_sixty() {
    let center = Arc::new(MemoryNotificationCenter::new());
    let robin = Robin::builder()
        .with_notification_center(center)
        .build()
        .expect("build robin");
    let scheduler = robin.scheduler();

    for i in 0..60 {
        let mut notification = RobinNotification::new(format!("notification {i}"));
        assert!(scheduler.schedule(&mut notification).is_some(), "slot {i}");
    }
    let mut overflow = RobinNotification::new("overflow");
    assert!(scheduler.schedule(&mut overflow).is_none());
    assert_eq!(scheduler.scheduled_count().expect("count"), 60);
}

#[test]
fn operator_maximum_above_system_ceiling_stops_at_sixty_four() {
    let (_center, robin) = robin_with(100);
    let scheduler = robin.scheduler();

    for i in 0..64 {
        let mut notification = RobinNotification::new(format!("notification {i}"));
        assert!(scheduler.schedule(&mut notification).is_some(), "slot {i}");
    }
    let mut overflow = RobinNotification::new("overflow");
    assert!(scheduler.schedule(&mut overflow).is_none());
    assert!(!overflow.is_scheduled());
    assert_eq!(scheduler.scheduled_count().expect("count"), 64);
}

#[test]
fn unbounded_query_timeout_schedules_normally() {
    let center = Arc::new(MemoryNotificationCenter::new());
    let robin = Robin::builder()
        .with_notification_center(center)
        .with_config(RobinConfig::default().with_query_timeout(Duration::MAX))
        .build()
        .expect("build robin");

    let mut notification = record("forever", "No deadline");
    assert!(robin.scheduler().schedule(&mut notification).is_some());
    assert_eq!(robin.scheduler().scheduled_count().expect("count"), 1);
    assert!(robin.manager().all_delivered().expect("delivered").is_empty());
    robin.settings().force_refresh().expect("refresh");
}

#[test]
fn cancelling_one_frees_exactly_one_slot() {
    let (_center, robin) = robin_with(3);
    let scheduler = robin.scheduler();
    let mut held: Vec<RobinNotification> = (0..3)
        .map(|i| RobinNotification::new(format!("#{i}")))
        .collect();
    for notification in &mut held {
        assert!(scheduler.schedule(notification).is_some());
    }

    scheduler.cancel(&mut held[1]);

    let mut first = RobinNotification::new("first");
    let mut second = RobinNotification::new("second");
    assert!(scheduler.schedule(&mut first).is_some());
    assert!(scheduler.schedule(&mut second).is_none());
}

#[test]
fn rescheduling_updates_pending_content() {
    let (_center, robin) = robin_with(5);
    let scheduler = robin.scheduler();
    let mut notification = record("standup", "Standup at ten");
    scheduler.schedule(&mut notification).expect("scheduled");

    notification.body = "Standup moved to eleven".to_string();
    notification.set_trigger(NotificationTrigger::date(
        date::date_with_time(1100, 1),
        Repeats::None,
    ));
    scheduler.reschedule(&mut notification).expect("rescheduled");

    let stored = scheduler
        .notification("standup")
        .expect("query")
        .expect("present");
    assert_eq!(stored.body, "Standup moved to eleven");
    assert_eq!(stored.fire_date(), notification.fire_date());
    assert_eq!(scheduler.scheduled_count().expect("count"), 1);
}

#[test]
fn group_is_all_or_nothing() {
    let (_center, robin) = robin_with(4);
    let scheduler = robin.scheduler();
    let mut filler = RobinNotification::new("filler");
    scheduler.schedule(&mut filler).expect("filler");
    let mut second_filler = RobinNotification::new("filler 2");
    scheduler.schedule(&mut second_filler).expect("filler 2");

    let mut group = RobinNotificationGroup::with_identifier(
        "meds",
        (0..3)
            .map(|i| RobinNotification::new(format!("dose {i}")))
            .collect(),
    );
    assert!(scheduler.schedule_group(&mut group).is_none());
    assert!(group.notifications().iter().all(|n| !n.is_scheduled()));
    assert_eq!(scheduler.scheduled_count().expect("count"), 2);

    scheduler.cancel(&mut filler);
    scheduler.cancel(&mut second_filler);
    assert!(scheduler.schedule_group(&mut group).is_some());
    assert!(group.notifications().iter().all(|n| n.is_scheduled()));

    let found = scheduler.group("meds").expect("query").expect("group");
    assert_eq!(found.len(), 3);
    assert!(found
        .notifications()
        .iter()
        .all(|n| n.thread_identifier.as_deref() == Some("meds")));
}

#[test]
fn missing_group_and_notification_are_none() {
    let (_center, robin) = robin_with(4);
    assert!(robin.scheduler().group("nope").expect("query").is_none());
    assert!(robin.scheduler().notification("nope").expect("query").is_none());
}

#[test]
fn cancelling_a_group_leaves_other_notifications() {
    let (_center, robin) = robin_with(10);
    let scheduler = robin.scheduler();
    let mut group = RobinNotificationGroup::with_identifier(
        "trip",
        vec![record("pack", "Pack"), record("leave", "Leave")],
    );
    scheduler.schedule_group(&mut group).expect("group");
    let mut other = record("other", "Other");
    scheduler.schedule(&mut other).expect("other");

    scheduler.cancel_group(&mut group).expect("cancel");
    assert!(group.notifications().iter().all(|n| !n.is_scheduled()));
    assert_eq!(identifiers(&robin), vec!["other"]);

    scheduler.cancel_all();
    assert_eq!(scheduler.scheduled_count().expect("count"), 0);
}

#[test]
fn scheduled_entries_keep_their_trigger() {
    let (_center, robin) = robin_with(10);
    let scheduler = robin.scheduler();
    let when = date::next_days(3)
        .with_second(42)
        .expect("valid second");

    for repeats in [Repeats::None, Repeats::Hour, Repeats::Day, Repeats::Week, Repeats::Month] {
        let mut notification = RobinNotification::with_identifier(
            repeats.as_str(),
            "repeating",
            NotificationTrigger::date(when, repeats),
        );
        scheduler.schedule(&mut notification).expect("scheduled");
    }

    for notification in scheduler.scheduled().expect("scheduled") {
        match notification.trigger() {
            NotificationTrigger::Date { date, repeats } => {
                assert_eq!(*date, when.truncate_seconds());
                assert_eq!(repeats.as_str(), notification.identifier());
            }
            other => panic!("unexpected trigger {other:?}"),
        }
        assert!(notification.is_scheduled());
        assert!(!notification.is_delivered());
    }
}

#[test]
fn delivered_notifications_are_decoded_and_removable() {
    let (center, robin) = robin_with(10);
    let mut notification = record("water", "Drink water").with_title("Hydrate");
    robin.scheduler().schedule(&mut notification).expect("scheduled");
    assert!(center.deliver("water"));

    let delivered = robin.manager().all_delivered().expect("delivered");
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0], notification);
    assert!(delivered[0].is_delivered());
    assert!(delivered[0].delivery_date().is_some());
    assert_eq!(delivered[0].title.as_deref(), Some("Hydrate"));
    assert_eq!(robin.scheduler().scheduled_count().expect("count"), 0);

    robin.manager().remove_delivered(&delivered[0]);
    assert!(robin.manager().all_delivered().expect("delivered").is_empty());
}

#[test]
fn settings_refresh_picks_up_changes() {
    let center = Arc::new(MemoryNotificationCenter::with_settings(SystemNotificationSettings {
        authorization_status: AuthorizationStatus::Denied,
        ..Default::default()
    }));
    let robin = Robin::builder()
        .with_notification_center(center.clone())
        .build()
        .expect("build robin");
    assert_eq!(robin.settings().authorization_status(), AuthorizationStatus::Denied);

    center.set_settings(SystemNotificationSettings {
        authorization_status: AuthorizationStatus::Authorized,
        badge: SettingState::Enabled,
        lock_screen: SettingState::Enabled,
        ..Default::default()
    });
    assert_eq!(robin.settings().authorization_status(), AuthorizationStatus::Denied);
    robin.settings().force_refresh().expect("refresh");
    assert_eq!(
        robin.settings().authorization_status(),
        AuthorizationStatus::Authorized
    );
    assert_eq!(
        robin.settings().enabled_settings(),
        SettingsOptions::BADGE | SettingsOptions::LOCK_SCREEN
    );
}

#[test]
fn authorization_errors_pass_through() {
    let (center, robin) = robin_with(1);
    center.deny_authorization("not allowed");
    let outcome = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&outcome);
    robin.settings().request_authorization(
        AuthorizationOptions::ALERT | AuthorizationOptions::BADGE,
        move |result| *sink.lock() = Some(result),
    );
    let outcome = outcome.lock().take().expect("completion called");
    assert!(matches!(outcome, Err(RobinError::Center(message)) if message == "not allowed"));
}

#[test]
fn unresponsive_center_times_out_instead_of_hanging() {
    let (center, robin) = robin_with(5);
    center.set_responsive(false);

    let err = robin.scheduler().scheduled().unwrap_err();
    assert!(matches!(
        err,
        RobinError::Timeout {
            operation: "get_pending_requests",
            ..
        }
    ));
    let mut notification = RobinNotification::new("late");
    assert!(robin.scheduler().schedule(&mut notification).is_none());
    assert!(!notification.is_scheduled());
    assert!(robin.manager().all_delivered().is_err());
}

#[test]
fn delegate_runs_registered_action() {
    let (center, robin) = robin_with(5);
    let mut notification = record("ping", "Ping");
    robin.scheduler().schedule(&mut notification).expect("scheduled");
    center.deliver("ping");

    let called = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&called);
    robin.actions().register(
        DEFAULT_ACTION_IDENTIFIER,
        Arc::new(move |response: &NotificationResponse| {
            assert_eq!(response.notification.identifier(), "ping");
            flag.store(true, Ordering::SeqCst);
        }),
    );

    let delivered = {
        let slot = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&slot);
        center.get_delivered(Box::new(move |entries| *sink.lock() = entries));
        let entries = slot.lock().clone();
        entries
    };
    let mut completed = false;
    robin.delegate().did_receive_response(
        &SystemNotificationResponse {
            delivered: delivered[0].clone(),
            action_identifier: DEFAULT_ACTION_IDENTIFIER.to_string(),
            user_text: None,
        },
        || completed = true,
    );
    assert!(completed);
    assert!(called.load(Ordering::SeqCst));
}
