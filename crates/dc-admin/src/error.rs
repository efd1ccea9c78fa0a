//! Admin error types.
//!
//! Probe, test and persist results are reported as messages, never as
//! errors. [`AdminError`] covers the faults around them: an unreadable
//! configuration store, malformed persisted records.

use thiserror::Error;

/// Errors that can occur in the admin layer.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Configuration store error.
    #[error("Configuration store error: {0}")]
    Store(String),

    /// Configuration record not found.
    #[error("Configuration not found: {0}")]
    NotFound(String),

    /// Record could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AdminError {
    /// Creates a store error.
    #[must_use]
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(pid: impl Into<String>) -> Self {
        Self::NotFound(pid.into())
    }
}

/// Result type for admin operations.
pub type AdminResult<T> = Result<T, AdminError>;
