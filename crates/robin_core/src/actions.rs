//! Handlers for actions the user takes on a delivered notification.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, instrument};

use crate::center::DeliveredNotification;
use crate::notification::RobinNotification;

/// Identifier the system reports when the notification itself was tapped.
pub const DEFAULT_ACTION_IDENTIFIER: &str = "com.apple.UNNotificationDefaultActionIdentifier";
/// Identifier the system reports when the notification was dismissed.
pub const DISMISS_ACTION_IDENTIFIER: &str = "com.apple.UNNotificationDismissActionIdentifier";

/// A user's response as handed to an [`ActionHandler`].
#[derive(Debug, Clone)]
pub struct NotificationResponse {
    pub notification: RobinNotification,
    pub action_identifier: String,
    /// Text typed by the user for text-input actions.
    pub user_text: Option<String>,
}

pub trait ActionHandler: Send + Sync {
    fn handle(&self, response: &NotificationResponse);
}

impl<F> ActionHandler for F
where
    F: Fn(&NotificationResponse) + Send + Sync,
{
    fn handle(&self, response: &NotificationResponse) {
        self(response)
    }
}

/// Maps action identifiers to their handlers.
#[derive(Default)]
pub struct ActionRegistrar {
    handlers: RwLock<HashMap<String, Arc<dyn ActionHandler>>>,
}

impl ActionRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `identifier`, replacing any earlier one.
    pub fn register(&self, identifier: impl Into<String>, handler: Arc<dyn ActionHandler>) {
        let identifier = identifier.into();
        debug!(%identifier, "registering action handler");
        self.handlers.write().insert(identifier, handler);
    }

    pub fn deregister(&self, identifier: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.write().remove(identifier)
    }

    pub fn action(&self, identifier: &str) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.read().get(identifier).cloned()
    }
}

/// A response as the system reports it.
#[derive(Debug, Clone)]
pub struct SystemNotificationResponse {
    pub delivered: DeliveredNotification,
    pub action_identifier: String,
    pub user_text: Option<String>,
}

/// Receives the system's response callbacks and dispatches them to the
/// registered handlers.
pub struct NotificationDelegate {
    registrar: Arc<ActionRegistrar>,
}

impl NotificationDelegate {
    pub fn new(registrar: Arc<ActionRegistrar>) -> Self {
        Self { registrar }
    }

    /// Runs the handler registered for the response's action, if any. The
    /// system's `completion` is always called, after the handler returns.
    #[instrument(skip_all, fields(action = %response.action_identifier))]
    pub fn did_receive_response(
        &self,
        response: &SystemNotificationResponse,
        completion: impl FnOnce(),
    ) {
        let _done = CallOnDrop(Some(completion));
        let Some(handler) = self.registrar.action(&response.action_identifier) else {
            debug!("no handler registered for action");
            return;
        };
        let response = NotificationResponse {
            notification: RobinNotification::from_delivered(&response.delivered),
            action_identifier: response.action_identifier.clone(),
            user_text: response.user_text.clone(),
        };
        handler.handle(&response);
    }
}

struct CallOnDrop<F: FnOnce()>(Option<F>);

impl<F: FnOnce()> Drop for CallOnDrop<F> {
    fn drop(&mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}
