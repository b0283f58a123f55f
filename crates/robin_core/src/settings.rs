use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::blocking;
use crate::center::NotificationCenter;
use crate::error::Result;

macro_rules! option_set {
    ($(#[$meta:meta])* $name:ident { $($(#[$flag_meta:meta])* $flag:ident = $bit:expr,)* }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
        pub struct $name(u32);

        impl $name {
            $($(#[$flag_meta])* pub const $flag: Self = Self(1 << $bit);)*

            pub const fn empty() -> Self {
                Self(0)
            }

            pub const fn from_bits(bits: u32) -> Self {
                Self(bits)
            }

            pub const fn bits(&self) -> u32 {
                self.0
            }

            pub const fn is_empty(&self) -> bool {
                self.0 == 0
            }

            pub const fn contains(&self, other: Self) -> bool {
                self.0 & other.0 == other.0
            }

            pub fn insert(&mut self, other: Self) {
                self.0 |= other.0;
            }

            pub fn remove(&mut self, other: Self) {
                self.0 &= !other.0;
            }
        }

        impl BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: Self) {
                self.0 |= rhs.0;
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let mut set = f.debug_set();
                $(if self.contains(Self::$flag) {
                    set.entry(&stringify!($flag));
                })*
                set.finish()
            }
        }
    };
}

option_set! {
    /// Capabilities requested from the user when asking for authorization.
    AuthorizationOptions {
        BADGE = 0,
        SOUND = 1,
        ALERT = 2,
        CAR_PLAY = 3,
        CRITICAL_ALERT = 4,
        PROVIDES_APP_NOTIFICATION_SETTINGS = 5,
        PROVISIONAL = 6,
    }
}

option_set! {
    /// Notification features the user currently has enabled.
    SettingsOptions {
        BADGE = 0,
        SOUND = 1,
        ALERT = 2,
        NOTIFICATION_CENTER = 3,
        LOCK_SCREEN = 4,
        CRITICAL_ALERT = 5,
        CAR_PLAY = 6,
        ANNOUNCEMENT = 7,
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuthorizationStatus {
    #[default]
    NotDetermined,
    Denied,
    Authorized,
    Provisional,
    Ephemeral,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum AlertStyle {
    #[default]
    None,
    Banner,
    Alert,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum ShowPreviewsSetting {
    Always,
    WhenAuthenticated,
    #[default]
    Never,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum SettingState {
    #[default]
    NotSupported,
    Disabled,
    Enabled,
}

/// Settings exactly as the notification center reports them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SystemNotificationSettings {
    pub authorization_status: AuthorizationStatus,
    pub alert_style: AlertStyle,
    pub show_previews: ShowPreviewsSetting,
    pub badge: SettingState,
    pub sound: SettingState,
    pub alert: SettingState,
    pub notification_center: SettingState,
    pub lock_screen: SettingState,
    pub critical_alert: SettingState,
    pub car_play: SettingState,
    pub announcement: SettingState,
}

impl SystemNotificationSettings {
    pub fn enabled_settings(&self) -> SettingsOptions {
        [
            (self.badge, SettingsOptions::BADGE),
            (self.sound, SettingsOptions::SOUND),
            (self.alert, SettingsOptions::ALERT),
            (self.notification_center, SettingsOptions::NOTIFICATION_CENTER),
            (self.lock_screen, SettingsOptions::LOCK_SCREEN),
            (self.critical_alert, SettingsOptions::CRITICAL_ALERT),
            (self.car_play, SettingsOptions::CAR_PLAY),
            (self.announcement, SettingsOptions::ANNOUNCEMENT),
        ]
        .into_iter()
        .filter(|(state, _)| *state == SettingState::Enabled)
        .fold(SettingsOptions::empty(), |acc, (_, option)| acc | option)
    }
}

/// Condensed settings snapshot handed to callers.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationSettings {
    pub alert_style: AlertStyle,
    pub authorization_status: AuthorizationStatus,
    pub enabled_settings: SettingsOptions,
    pub show_previews: ShowPreviewsSetting,
}

impl From<&SystemNotificationSettings> for NotificationSettings {
    fn from(settings: &SystemNotificationSettings) -> Self {
        Self {
            alert_style: settings.alert_style,
            authorization_status: settings.authorization_status,
            enabled_settings: settings.enabled_settings(),
            show_previews: settings.show_previews,
        }
    }
}

/// Caches the app's notification settings. The cache is filled on
/// construction and whenever [`SettingsManager::force_refresh`] is called,
/// typically when the app returns to the foreground.
pub struct SettingsManager {
    center: Arc<dyn NotificationCenter>,
    timeout: Duration,
    settings: RwLock<NotificationSettings>,
}

impl SettingsManager {
    pub fn new(center: Arc<dyn NotificationCenter>, timeout: Duration) -> Self {
        let manager = Self {
            center,
            timeout,
            settings: RwLock::new(NotificationSettings::default()),
        };
        if let Err(err) = manager.force_refresh() {
            warn!(%err, "keeping default notification settings");
        }
        manager
    }

    pub fn snapshot(&self) -> NotificationSettings {
        *self.settings.read()
    }

    pub fn authorization_status(&self) -> AuthorizationStatus {
        self.settings.read().authorization_status
    }

    pub fn alert_style(&self) -> AlertStyle {
        self.settings.read().alert_style
    }

    pub fn show_previews(&self) -> ShowPreviewsSetting {
        self.settings.read().show_previews
    }

    pub fn enabled_settings(&self) -> SettingsOptions {
        self.settings.read().enabled_settings
    }

    /// Forwards to the center; its answer, including any error, reaches
    /// `completion` untouched.
    pub fn request_authorization(
        &self,
        options: AuthorizationOptions,
        completion: impl FnOnce(Result<bool>) + Send + 'static,
    ) {
        debug!(?options, "requesting notification authorization");
        self.center
            .request_authorization(options, Box::new(completion));
    }

    /// Blocks until the center reports its current settings.
    pub fn force_refresh(&self) -> Result<()> {
        let system = blocking::wait_for("get_settings", self.timeout, |completion| {
            self.center.get_settings(completion)
        })?;
        let settings = NotificationSettings::from(&system);
        debug!(?settings, "notification settings refreshed");
        *self.settings.write() = settings;
        Ok(())
    }
}
