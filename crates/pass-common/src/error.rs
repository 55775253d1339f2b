//! Error types for configuration and logging setup

use thiserror::Error;

/// Result type alias for pass-common operations
pub type Result<T> = std::result::Result<T, CommonError>;

/// Errors raised while configuring a PASS client or its logging
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid logging setting: {0}")]
    InvalidLogSetting(String),

    #[error("Failed to install log subscriber: {0}")]
    LoggingInit(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CommonError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid logging setting error
    pub fn invalid_log_setting(msg: impl Into<String>) -> Self {
        Self::InvalidLogSetting(msg.into())
    }
}
