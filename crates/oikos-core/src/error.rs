//! Error types for the core library.

use crate::config::ConfigError;
use crate::form::ValidationError;
use crate::notify::NotifyError;
use thiserror::Error;

/// Errors that can fail a form submission.
///
/// Notification failures are not listed here: they are recorded on the
/// receipt instead of failing the request.
#[derive(Debug, Error)]
pub enum Error {
    /// The submitted form is incomplete or malformed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Writing a log file or the bookings file failed.
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A notification channel could not be set up.
    #[error("Notification setup error: {0}")]
    Notify(#[from] NotifyError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
