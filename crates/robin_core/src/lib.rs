pub mod actions;
mod blocking;
pub mod center;
pub mod codec;
pub mod config;
pub mod date;
pub mod error;
pub mod notification;
pub mod robin;
pub mod scheduler;
pub mod settings;

pub use crate::center::{
    manager::NotificationCenterManager, memory::MemoryNotificationCenter, NotificationCenter,
};
pub use crate::config::RobinConfig;
pub use crate::error::{Result, RobinError};
pub use crate::notification::{
    group::RobinNotificationGroup,
    trigger::{NotificationTrigger, Repeats},
    NotificationSound, RobinNotification,
};
pub use crate::robin::{Robin, RobinBuilder};
pub use crate::scheduler::RobinScheduler;
