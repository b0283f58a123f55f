//! Synchronous waits over the center's callback-based calls.
//!
//! Every read presented by the scheduler, manager and settings is synchronous:
//! the calling thread blocks until the center invokes the completion. Callers
//! must therefore not invoke them from a context that cannot block (for
//! example the thread the center delivers its callbacks on). The wait is
//! bounded so a center that never answers surfaces as a timeout.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::warn;

use crate::center::Completion;
use crate::error::{Result, RobinError};

struct OneShot<T> {
    value: Mutex<Option<T>>,
    ready: Condvar,
}

impl<T> OneShot<T> {
    fn new() -> Self {
        Self {
            value: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    fn fulfil(&self, value: T) {
        let mut slot = self.value.lock();
        if slot.is_none() {
            *slot = Some(value);
            self.ready.notify_all();
        }
    }

    /// Waits up to `timeout`. A timeout too large to express as a deadline
    /// waits until the value arrives.
    fn wait(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now().checked_add(timeout);
        let mut slot = self.value.lock();
        while slot.is_none() {
            match deadline {
                Some(deadline) => {
                    if self.ready.wait_until(&mut slot, deadline).timed_out() {
                        break;
                    }
                }
                None => self.ready.wait(&mut slot),
            }
        }
        slot.take()
    }
}

/// Starts an asynchronous call through `start` and blocks until its
/// completion fires or `timeout` elapses.
pub(crate) fn wait_for<T, F>(operation: &'static str, timeout: Duration, start: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(Completion<T>),
{
    let shot = Arc::new(OneShot::new());
    let sender = Arc::clone(&shot);
    start(Box::new(move |value| sender.fulfil(value)));
    shot.wait(timeout).ok_or_else(|| {
        warn!(operation, waited_ms = %timeout.as_millis(), "notification center did not answer");
        RobinError::Timeout {
            operation,
            waited: timeout,
        }
    })
}
