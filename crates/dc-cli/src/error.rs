//! CLI error types.

use thiserror::Error;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The properties file could not be read as JSON or TOML.
    #[error("invalid properties file {path}: {message}")]
    Properties {
        /// File that failed to parse.
        path: String,
        /// Parser message.
        message: String,
    },

    /// The operation ran and reported failure messages.
    #[error("operation reported failures")]
    ReportFailed,

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration store error.
    #[error(transparent)]
    Admin(#[from] dc_admin::AdminError),

    /// Engine configuration error.
    #[error(transparent)]
    Engine(#[from] dc_core::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
