//! Error types for the performance telemetry engine.

use thiserror::Error;

/// Result type alias for telemetry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for telemetry operations
#[derive(Debug, Error)]
pub enum Error {
    /// Rejected sample (non-finite value, empty name, unknown category or unit)
    #[error("Invalid metric: {0}")]
    InvalidMetric(String),

    /// Failure reported by a subscriber callback
    #[error("Subscriber error: {0}")]
    Subscriber(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}
