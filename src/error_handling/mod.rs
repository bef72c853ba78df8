//! Typed failure taxonomy.
//!
//! No collector or acquisition tier lets an error escape its boundary.
//! Instead every suppression point surfaces as an explicit [`Unavailable`]
//! variant, so callers can tell an unconfigured feature from a transient
//! network failure or corrupt data without parsing error strings.

use std::time::Duration;

use log::SetLoggerError;
use thiserror::Error;

/// Why a signal source or acquisition tier produced no data.
#[derive(Error, Debug)]
pub enum Unavailable {
    /// A credential or configuration value is absent. The feature is
    /// disabled, not broken; logged at info level and skipped.
    #[error("{0} not configured")]
    Unconfigured(&'static str),

    /// A DNS, HTTP, TLS, or download operation failed.
    #[error("network failure: {0}")]
    Network(String),

    /// An outbound call exceeded its deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// A local filesystem operation failed.
    #[error("i/o failure: {0}")]
    Io(String),

    /// A downloaded or cached artifact failed validation.
    #[error("corrupt data: {0}")]
    Corrupt(String),
}

/// Result alias used at every collector and acquisition boundary.
pub type SignalResult<T> = Result<T, Unavailable>;

/// Error types for process initialization failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] reqwest::Error),
}
