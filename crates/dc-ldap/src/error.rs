//! LDAP-specific error types.
//!
//! ## Security Note
//!
//! Error messages must not leak sensitive information like
//! passwords or bind credentials.

use thiserror::Error;

/// LDAP-specific errors.
#[derive(Debug, Error)]
pub enum LdapError {
    /// Invalid configuration.
    #[error("LDAP configuration error: {0}")]
    Configuration(String),

    /// TLS context could not be prepared locally.
    #[error("LDAP TLS error: {0}")]
    Tls(String),

    /// Connection failed.
    #[error("LDAP connection failed: {0}")]
    Connection(String),

    /// Bind (authentication) failed.
    #[error("LDAP bind failed: {0}")]
    Bind(String),

    /// The transport has no client implementation for the SASL mechanism.
    #[error("bind mechanism not supported by this transport: {0}")]
    UnsupportedMechanism(&'static str),

    /// Search operation failed.
    #[error("LDAP search failed: {0}")]
    Search(String),

    /// I/O fault while reading a result stream.
    #[error("LDAP stream interrupted: {0}")]
    Stream(String),

    /// Timeout error.
    #[error("LDAP operation timed out")]
    Timeout,

    /// Underlying ldap3 error.
    #[error("LDAP error: {0}")]
    Ldap3(#[from] ldap3::LdapError),
}

impl LdapError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Creates a TLS error.
    #[must_use]
    pub fn tls(msg: impl Into<String>) -> Self {
        Self::Tls(msg.into())
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a bind error.
    #[must_use]
    pub fn bind(msg: impl Into<String>) -> Self {
        Self::Bind(msg.into())
    }

    /// Creates a search error.
    #[must_use]
    pub fn search(msg: impl Into<String>) -> Self {
        Self::Search(msg.into())
    }

    /// Checks if this is a local configuration fault (nothing was sent).
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Tls(_))
    }

    /// Checks if this is a connection-related error.
    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout)
    }

    /// Checks if this is an authentication error.
    #[must_use]
    pub const fn is_bind_error(&self) -> bool {
        matches!(self, Self::Bind(_) | Self::UnsupportedMechanism(_))
    }
}

/// Result type for LDAP operations.
pub type LdapResult<T> = Result<T, LdapError>;
