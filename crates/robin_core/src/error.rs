use std::time::Duration;

use thiserror::Error;

/// Errors surfaced by the library. Capacity rejections and lookups that find
/// nothing are not errors; they are reported as `None`.
#[derive(Debug, Error)]
pub enum RobinError {
    #[error("{operation} did not complete within {waited:?}")]
    Timeout {
        operation: &'static str,
        waited: Duration,
    },

    #[error("notification center error: {0}")]
    Center(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, RobinError>;
