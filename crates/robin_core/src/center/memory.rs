use chrono::Utc;
use parking_lot::Mutex;
use tracing::debug;

use super::{Completion, DeliveredNotification, NotificationCenter, NotificationRequest};
use crate::error::{Result, RobinError};
use crate::settings::{AuthorizationOptions, SystemNotificationSettings};

/// Notification center kept entirely in memory.
///
/// Used as the reference adapter in tests and previews. Completions run
/// synchronously on the calling thread unless the center is made
/// unresponsive, in which case they are dropped without being called.
#[derive(Default)]
pub struct MemoryNotificationCenter {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    pending: Vec<NotificationRequest>,
    delivered: Vec<DeliveredNotification>,
    settings: SystemNotificationSettings,
    denial: Option<String>,
    unresponsive: bool,
}

impl MemoryNotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: SystemNotificationSettings) -> Self {
        let center = Self::default();
        center.state.lock().settings = settings;
        center
    }

    pub fn set_settings(&self, settings: SystemNotificationSettings) {
        self.state.lock().settings = settings;
    }

    /// Makes authorization requests fail with `message`.
    pub fn deny_authorization(&self, message: impl Into<String>) {
        self.state.lock().denial = Some(message.into());
    }

    /// An unresponsive center never invokes completions.
    pub fn set_responsive(&self, responsive: bool) {
        self.state.lock().unresponsive = !responsive;
    }

    pub fn pending_identifiers(&self) -> Vec<String> {
        self.state
            .lock()
            .pending
            .iter()
            .map(|request| request.identifier.clone())
            .collect()
    }

    /// Simulates the system firing a pending request. Non-repeating requests
    /// leave the pending list.
    pub fn deliver(&self, identifier: &str) -> bool {
        let mut state = self.state.lock();
        let Some(index) = state
            .pending
            .iter()
            .position(|request| request.identifier == identifier)
        else {
            return false;
        };
        let repeats = state.pending[index]
            .trigger
            .as_ref()
            .map(|trigger| trigger.repeats())
            .unwrap_or(false);
        let request = if repeats {
            state.pending[index].clone()
        } else {
            state.pending.remove(index)
        };
        state
            .delivered
            .retain(|delivered| delivered.request.identifier != identifier);
        state.delivered.push(DeliveredNotification {
            date: Utc::now(),
            request,
        });
        debug!(%identifier, repeats, "delivered notification");
        true
    }

    fn respond<T>(&self, completion: Completion<T>, value: impl FnOnce(&MemoryState) -> T) {
        let outcome = {
            let state = self.state.lock();
            if state.unresponsive {
                None
            } else {
                Some(value(&state))
            }
        };
        if let Some(outcome) = outcome {
            completion(outcome);
        }
    }
}

impl NotificationCenter for MemoryNotificationCenter {
    fn request_authorization(&self, _options: AuthorizationOptions, completion: Completion<Result<bool>>) {
        self.respond(completion, |state| match &state.denial {
            Some(message) => Err(RobinError::Center(message.clone())),
            None => Ok(true),
        });
    }

    fn get_settings(&self, completion: Completion<SystemNotificationSettings>) {
        self.respond(completion, |state| state.settings.clone());
    }

    fn add(&self, request: NotificationRequest, completion: Option<Completion<Result<()>>>) {
        {
            let mut state = self.state.lock();
            let existing = state
                .pending
                .iter()
                .position(|pending| pending.identifier == request.identifier);
            match existing {
                Some(index) => state.pending[index] = request,
                None => state.pending.push(request),
            }
        }
        if let Some(completion) = completion {
            self.respond(completion, |_| Ok(()));
        }
    }

    fn get_pending_requests(&self, completion: Completion<Vec<NotificationRequest>>) {
        self.respond(completion, |state| state.pending.clone());
    }

    fn remove_pending_requests(&self, identifiers: &[String]) {
        self.state
            .lock()
            .pending
            .retain(|request| !identifiers.contains(&request.identifier));
    }

    fn remove_all_pending_requests(&self) {
        self.state.lock().pending.clear();
    }

    fn get_delivered(&self, completion: Completion<Vec<DeliveredNotification>>) {
        self.respond(completion, |state| state.delivered.clone());
    }

    fn remove_delivered(&self, identifiers: &[String]) {
        self.state
            .lock()
            .delivered
            .retain(|delivered| !identifiers.contains(&delivered.request.identifier));
    }

    fn remove_all_delivered(&self) {
        self.state.lock().delivered.clear();
    }
}
