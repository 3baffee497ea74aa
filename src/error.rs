//! Error types for dot1xd

use thiserror::Error;

/// Unified error type for the 802.1X control daemon
#[derive(Debug, Error)]
pub enum Dot1xError {
    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Supplicant rejected or failed an operation
    #[error("Supplicant error: {0}")]
    Supplicant(String),

    /// Credential staging failed
    #[error("Credential staging failed: {0}")]
    Staging(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Service error (D-Bus registration, signal handling)
    #[error("Service error: {0}")]
    ServiceError(String),
}

pub type Dot1xResult<T> = Result<T, Dot1xError>;
