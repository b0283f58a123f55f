use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::actions::{ActionRegistrar, NotificationDelegate};
use crate::center::manager::NotificationCenterManager;
use crate::center::NotificationCenter;
use crate::config::RobinConfig;
use crate::error::{Result, RobinError};
use crate::scheduler::RobinScheduler;
use crate::settings::SettingsManager;

/// Entry point tying the scheduler, the delivered manager, settings and
/// action handling to one notification center.
pub struct Robin {
    center: Arc<dyn NotificationCenter>,
    config: RobinConfig,
    scheduler: RobinScheduler,
    manager: NotificationCenterManager,
    settings: OnceCell<SettingsManager>,
    actions: Arc<ActionRegistrar>,
    delegate: NotificationDelegate,
}

pub struct RobinBuilder {
    center: Option<Arc<dyn NotificationCenter>>,
    config: RobinConfig,
}

impl RobinBuilder {
    pub fn new() -> Self {
        Self {
            center: None,
            config: RobinConfig::default(),
        }
    }

    pub fn with_notification_center(mut self, center: Arc<dyn NotificationCenter>) -> Self {
        self.center = Some(center);
        self
    }

    pub fn with_config(mut self, config: RobinConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<Robin> {
        let center = self.center.ok_or_else(|| {
            RobinError::InvalidConfig("a notification center is required".to_string())
        })?;
        let actions = Arc::new(ActionRegistrar::new());
        Ok(Robin {
            scheduler: RobinScheduler::new(Arc::clone(&center), self.config.clone()),
            manager: NotificationCenterManager::new(Arc::clone(&center), self.config.query_timeout),
            settings: OnceCell::new(),
            delegate: NotificationDelegate::new(Arc::clone(&actions)),
            actions,
            config: self.config,
            center,
        })
    }
}

impl Default for RobinBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Robin {
    pub fn builder() -> RobinBuilder {
        RobinBuilder::new()
    }

    pub fn config(&self) -> &RobinConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &RobinScheduler {
        &self.scheduler
    }

    pub fn manager(&self) -> &NotificationCenterManager {
        &self.manager
    }

    /// The settings cache, read from the center on first access.
    pub fn settings(&self) -> &SettingsManager {
        self.settings.get_or_init(|| {
            SettingsManager::new(Arc::clone(&self.center), self.config.query_timeout)
        })
    }

    pub fn actions(&self) -> &ActionRegistrar {
        &self.actions
    }

    /// Hand this to the platform so user responses reach the registered
    /// action handlers.
    pub fn delegate(&self) -> &NotificationDelegate {
        &self.delegate
    }
}
