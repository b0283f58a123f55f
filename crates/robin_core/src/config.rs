use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// The number of pending notifications the operating system keeps at once.
/// Anything scheduled past this ceiling is dropped by the system without notice,
/// so it is not configurable.
pub const MAXIMUM_ALLOWED_SYSTEM_NOTIFICATIONS: usize = 64;

/// Leaves four slots free below the system ceiling.
pub const DEFAULT_MAXIMUM_ALLOWED_NOTIFICATIONS: usize = 60;

pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Keys and values the library owns inside a notification's user info.
pub mod keys {
    /// Holds the canonical fire date of a date-triggered notification.
    pub const DATE: &str = "RobinNotificationDateKey";
    /// Holds the notification identifier.
    pub const IDENTIFIER: &str = "RobinNotificationIdentifierKey";
    /// Marks the platform's default notification sound.
    pub const DEFAULT_SOUND_NAME: &str = "RobinNotificationDefaultSound";

    pub fn is_reserved(key: &str) -> bool {
        key == DATE || key == IDENTIFIER
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobinConfig {
    /// Operator ceiling on pending notifications. Only ever lowers the
    /// effective capacity below [`MAXIMUM_ALLOWED_SYSTEM_NOTIFICATIONS`].
    pub maximum_allowed_notifications: usize,
    /// Upper bound for every blocking wait on the notification center.
    pub query_timeout: Duration,
}

impl RobinConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(max) = lookup("ROBIN_MAX_NOTIFICATIONS") {
            match max.trim().parse::<usize>() {
                Ok(value) if value > 0 => config.maximum_allowed_notifications = value,
                _ => warn!(value = %max, "ignoring invalid ROBIN_MAX_NOTIFICATIONS"),
            }
        }
        if let Some(timeout) = lookup("ROBIN_QUERY_TIMEOUT_MS") {
            match timeout.trim().parse::<u64>() {
                Ok(value) if value > 0 => config.query_timeout = Duration::from_millis(value),
                _ => warn!(value = %timeout, "ignoring invalid ROBIN_QUERY_TIMEOUT_MS"),
            }
        }
        if config.maximum_allowed_notifications > MAXIMUM_ALLOWED_SYSTEM_NOTIFICATIONS {
            info!(
                configured = config.maximum_allowed_notifications,
                ceiling = MAXIMUM_ALLOWED_SYSTEM_NOTIFICATIONS,
                "configured maximum exceeds the system ceiling; the ceiling applies"
            );
        }
        config
    }

    pub fn with_maximum_allowed_notifications(mut self, maximum: usize) -> Self {
        self.maximum_allowed_notifications = maximum;
        self
    }

    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Number of notifications that may be pending at once.
    pub fn effective_capacity(&self) -> usize {
        self.maximum_allowed_notifications
            .min(MAXIMUM_ALLOWED_SYSTEM_NOTIFICATIONS)
    }
}

impl Default for RobinConfig {
    fn default() -> Self {
        Self {
            maximum_allowed_notifications: DEFAULT_MAXIMUM_ALLOWED_NOTIFICATIONS,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn reads_overrides_from_lookup() {
        let config = RobinConfig::from_lookup(lookup(&[
            ("ROBIN_MAX_NOTIFICATIONS", " 12 "),
            ("ROBIN_QUERY_TIMEOUT_MS", "250"),
        ]));
        assert_eq!(config.maximum_allowed_notifications, 12);
        assert_eq!(config.query_timeout, Duration::from_millis(250));
    }

    #[test]
    fn ignores_unparsable_and_zero_values() {
        let config = RobinConfig::from_lookup(lookup(&[
            ("ROBIN_MAX_NOTIFICATIONS", "0"),
            ("ROBIN_QUERY_TIMEOUT_MS", "soon"),
        ]));
        assert_eq!(config, RobinConfig::default());
    }

    #[test]
    fn system_ceiling_caps_capacity() {
        let config = RobinConfig::default().with_maximum_allowed_notifications(500);
        assert_eq!(config.effective_capacity(), MAXIMUM_ALLOWED_SYSTEM_NOTIFICATIONS);
        let config = RobinConfig::default().with_maximum_allowed_notifications(2);
        assert_eq!(config.effective_capacity(), 2);
    }

    #[test]
    fn reserved_keys() {
        assert!(keys::is_reserved(keys::DATE));
        assert!(keys::is_reserved(keys::IDENTIFIER));
        assert!(!keys::is_reserved("Key"));
    }
}
