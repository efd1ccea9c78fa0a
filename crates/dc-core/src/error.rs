//! Error handling for the directory console core.

use thiserror::Error;

/// Result type alias using the core error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_message() {
        let error = Error::config("DC_CONNECT_TIMEOUT_SECS must be a number");
        assert_eq!(
            error.to_string(),
            "configuration error: DC_CONNECT_TIMEOUT_SECS must be a number"
        );
    }
}
