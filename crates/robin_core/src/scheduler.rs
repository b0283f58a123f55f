use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::blocking;
use crate::center::NotificationCenter;
use crate::config::RobinConfig;
use crate::error::Result;
use crate::notification::group::RobinNotificationGroup;
use crate::notification::RobinNotification;

/// Schedules notifications against the center while keeping the number of
/// pending notifications under the configured capacity.
///
/// The scheduler holds no state of its own: what is scheduled is always read
/// back from the center. Reads block until the center answers (bounded by
/// [`RobinConfig::query_timeout`]), so they must be called from a thread that
/// may block. The center is shared with other callers and the system itself,
/// so a count read here can be stale by the time it is acted on.
pub struct RobinScheduler {
    center: Arc<dyn NotificationCenter>,
    config: RobinConfig,
}

impl RobinScheduler {
    pub fn new(center: Arc<dyn NotificationCenter>, config: RobinConfig) -> Self {
        Self { center, config }
    }

    pub fn config(&self) -> &RobinConfig {
        &self.config
    }

    /// Schedules `notification` if a slot is free. Already scheduled
    /// notifications are returned untouched. Returns `None`, leaving the
    /// notification unscheduled, when no slot is free or the pending count
    /// could not be read.
    #[instrument(skip(self, notification), fields(identifier = %notification.identifier()))]
    pub fn schedule<'a>(
        &self,
        notification: &'a mut RobinNotification,
    ) -> Option<&'a mut RobinNotification> {
        if notification.is_scheduled() {
            debug!("notification already scheduled");
            return Some(notification);
        }
        let free = self.free_slots()?;
        if free == 0 {
            info!(capacity = self.config.effective_capacity(), "no free notification slot");
            return None;
        }
        self.submit(notification);
        debug!(free_slots = free - 1, "notification scheduled");
        Some(notification)
    }

    /// Schedules every member of `group`, or none of them when fewer slots
    /// are free than the group has members.
    #[instrument(skip(self, group), fields(group = %group.identifier(), size = group.len()))]
    pub fn schedule_group<'a>(
        &self,
        group: &'a mut RobinNotificationGroup,
    ) -> Option<&'a mut RobinNotificationGroup> {
        let free = self.free_slots()?;
        if free < group.len() {
            info!(free_slots = free, "not enough free slots for group");
            return None;
        }
        for notification in group.notifications_mut() {
            if !notification.is_scheduled() {
                self.submit(notification);
            }
        }
        debug!("group scheduled");
        Some(group)
    }

    /// Cancels by identifier and schedules again, whether or not the
    /// notification was scheduled before.
    pub fn reschedule<'a>(
        &self,
        notification: &'a mut RobinNotification,
    ) -> Option<&'a mut RobinNotification> {
        self.cancel_with_identifier(notification.identifier());
        notification.set_scheduled(false);
        self.schedule(notification)
    }

    pub fn cancel(&self, notification: &mut RobinNotification) {
        if !notification.is_scheduled() {
            return;
        }
        self.cancel_with_identifier(notification.identifier());
        notification.set_scheduled(false);
    }

    /// Removes pending requests with `identifier`. Notifications held by the
    /// caller keep their scheduled flag; prefer [`RobinScheduler::cancel`]
    /// when holding one.
    pub fn cancel_with_identifier(&self, identifier: &str) {
        debug!(%identifier, "cancelling notification");
        self.center.remove_pending_requests(&[identifier.to_string()]);
    }

    /// Cancels every scheduled member of `group` and clears the members'
    /// scheduled flags.
    pub fn cancel_group(&self, group: &mut RobinNotificationGroup) -> Result<()> {
        self.cancel_group_with_identifier(group.identifier())?;
        for notification in group.notifications_mut() {
            notification.set_scheduled(false);
        }
        Ok(())
    }

    pub fn cancel_group_with_identifier(&self, identifier: &str) -> Result<()> {
        let mut members = self.scheduled_in_thread(identifier)?;
        debug!(group = %identifier, members = members.len(), "cancelling group");
        for notification in &mut members {
            self.cancel(notification);
        }
        Ok(())
    }

    pub fn cancel_all(&self) {
        debug!("cancelling all notifications");
        self.center.remove_all_pending_requests();
    }

    pub fn notification(&self, identifier: &str) -> Result<Option<RobinNotification>> {
        Ok(self
            .scheduled()?
            .into_iter()
            .find(|notification| notification.identifier() == identifier))
    }

    /// The scheduled notifications sharing thread `identifier`, or `None`
    /// when there are none.
    pub fn group(&self, identifier: &str) -> Result<Option<RobinNotificationGroup>> {
        let members = self.scheduled_in_thread(identifier)?;
        if members.is_empty() {
            return Ok(None);
        }
        Ok(Some(RobinNotificationGroup::with_identifier(
            identifier, members,
        )))
    }

    /// Every pending notification, decoded from the center.
    pub fn scheduled(&self) -> Result<Vec<RobinNotification>> {
        let requests = blocking::wait_for(
            "get_pending_requests",
            self.config.query_timeout,
            |completion| self.center.get_pending_requests(completion),
        )?;
        Ok(requests.iter().map(RobinNotification::from_request).collect())
    }

    pub fn scheduled_count(&self) -> Result<usize> {
        Ok(self.scheduled()?.len())
    }

    /// Logs every scheduled notification. Meant for development.
    pub fn log_scheduled(&self) -> Result<()> {
        let notifications = self.scheduled()?;
        if notifications.is_empty() {
            info!("there are no scheduled notifications");
        }
        for notification in &notifications {
            info!("{notification}");
        }
        Ok(())
    }

    fn scheduled_in_thread(&self, identifier: &str) -> Result<Vec<RobinNotification>> {
        Ok(self
            .scheduled()?
            .into_iter()
            .filter(|notification| notification.thread_identifier.as_deref() == Some(identifier))
            .collect())
    }

    fn free_slots(&self) -> Option<usize> {
        match self.scheduled_count() {
            Ok(count) => Some(self.config.effective_capacity().saturating_sub(count)),
            Err(err) => {
                warn!(%err, "unable to count scheduled notifications");
                None
            }
        }
    }

    fn submit(&self, notification: &mut RobinNotification) {
        let identifier = notification.identifier().to_string();
        self.center.add(
            notification.notification_request(),
            Some(Box::new(move |result| {
                if let Err(err) = result {
                    warn!(%identifier, %err, "notification center rejected request");
                }
            })),
        );
        notification.set_scheduled(true);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::center::memory::MemoryNotificationCenter;

    fn scheduler(max: usize) -> (Arc<MemoryNotificationCenter>, RobinScheduler) {
        let center = Arc::new(MemoryNotificationCenter::new());
        let config = RobinConfig::default()
            .with_maximum_allowed_notifications(max)
            .with_query_timeout(Duration::from_millis(100));
        let scheduler = RobinScheduler::new(center.clone(), config);
        (center, scheduler)
    }

    #[test]
    fn schedule_flips_flag_and_submits() {
        let (center, scheduler) = scheduler(4);
        let mut notification = RobinNotification::new("This is a test notification");
        let scheduled = scheduler.schedule(&mut notification).expect("scheduled");
        assert!(scheduled.is_scheduled());
        assert!(notification.is_scheduled());
        assert_eq!(center.pending_identifiers(), vec![notification.identifier()]);
        assert_eq!(scheduler.scheduled_count().unwrap(), 1);
    }

    #[test]
    fn scheduling_twice_is_a_no_op() {
        let (_center, scheduler) = scheduler(4);
        let mut notification = RobinNotification::new("twice");
        scheduler.schedule(&mut notification).expect("first");
        let again = scheduler.schedule(&mut notification).expect("second");
        assert!(again.is_scheduled());
        assert_eq!(scheduler.scheduled_count().unwrap(), 1);
    }

    #[test]
    fn rejects_past_capacity() {
        let (_center, scheduler) = scheduler(3);
        for i in 0..3 {
            let mut notification = RobinNotification::new(format!("#{i}"));
            assert!(scheduler.schedule(&mut notification).is_some());
        }
        let mut overflow = RobinNotification::new("This is an overflow notification");
        assert!(scheduler.schedule(&mut overflow).is_none());
        assert!(!overflow.is_scheduled());
        assert_eq!(scheduler.scheduled_count().unwrap(), 3);
    }

    #[test]
    fn reschedule_tolerates_unscheduled_notification() {
        let (_center, scheduler) = scheduler(2);
        let mut notification = RobinNotification::new("never scheduled");
        assert!(scheduler.reschedule(&mut notification).is_some());
        assert_eq!(scheduler.scheduled_count().unwrap(), 1);
    }

    #[test]
    fn cancel_by_identifier_keeps_caller_flag() {
        let (_center, scheduler) = scheduler(2);
        let mut notification = RobinNotification::new("by id");
        scheduler.schedule(&mut notification);
        scheduler.cancel_with_identifier(notification.identifier());
        assert!(notification.is_scheduled());
        assert_eq!(scheduler.scheduled_count().unwrap(), 0);
    }

    #[test]
    fn cancel_unscheduled_is_a_no_op() {
        let (center, scheduler) = scheduler(2);
        let mut scheduled = RobinNotification::with_identifier(
            "shared",
            "scheduled",
            crate::NotificationTrigger::interval(Duration::from_secs(60), false),
        );
        scheduler.schedule(&mut scheduled);
        let mut stranger = RobinNotification::with_identifier(
            "shared",
            "never scheduled",
            crate::NotificationTrigger::interval(Duration::from_secs(60), false),
        );
        scheduler.cancel(&mut stranger);
        assert_eq!(center.pending_identifiers(), vec!["shared"]);
    }

    #[test]
    fn unresponsive_center_rejects_schedule_and_reports_timeout() {
        let (center, scheduler) = scheduler(2);
        center.set_responsive(false);
        let mut notification = RobinNotification::new("stuck");
        assert!(scheduler.schedule(&mut notification).is_none());
        assert!(!notification.is_scheduled());
        assert!(matches!(
            scheduler.scheduled(),
            Err(crate::RobinError::Timeout { .. })
        ));
    }
}
