//! Error types shared across the frontier router.
//!
//! Configuration problems surface as `RouterError` at build time and prevent
//! startup. Per-item conditions (malformed URLs, failed resolutions) are not
//! errors: they are modeled as routing outcomes and never cross the stage
//! boundary as `Err`.

use thiserror::Error;

/// Errors raised while configuring or operating the router.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Invalid configuration detected while building the router.
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// A hostname could not be resolved to an IP address.
    #[error("failed to resolve host '{host}': {message}")]
    Resolution {
        /// Hostname that failed to resolve.
        host: String,
        /// Underlying resolver message.
        message: String,
    },

    /// Failure serializing or deserializing JSON.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Catch-all for unexpected conditions.
    #[error("{0}")]
    GeneralError(String),
}
