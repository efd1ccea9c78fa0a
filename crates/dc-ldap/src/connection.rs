//! Connection establishment.
//!
//! Opens one transport to a directory and classifies the result. A bad TLS
//! policy is reported as `cannotConfigure` before any socket is opened;
//! socket, DNS and handshake faults are `cannotConnect`. No retries.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use dc_core::{EngineConfig, TlsSettings};

use crate::config::Endpoint;
use crate::directory::{ConnectRequest, Connector, DirectorySession};
use crate::error::{LdapError, LdapResult};
use crate::outcome::Outcome;

/// TLS protocol versions that can be enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TlsVersion {
    /// TLS 1.0
    Tls10,
    /// TLS 1.1
    Tls11,
    /// TLS 1.2
    Tls12,
    /// TLS 1.3
    Tls13,
}

impl TlsVersion {
    /// Parses a protocol name such as `TLSv1.2`.
    pub fn parse(name: &str) -> LdapResult<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "TLSV1" | "TLSV1.0" => Ok(Self::Tls10),
            "TLSV1.1" => Ok(Self::Tls11),
            "TLSV1.2" => Ok(Self::Tls12),
            "TLSV1.3" => Ok(Self::Tls13),
            _ => Err(LdapError::config(format!("unsupported TLS protocol '{name}'"))),
        }
    }

    /// Returns the protocol name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tls10 => "TLSv1",
            Self::Tls11 => "TLSv1.1",
            Self::Tls12 => "TLSv1.2",
            Self::Tls13 => "TLSv1.3",
        }
    }
}

impl fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated TLS policy, derived from the process-wide [`TlsSettings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPolicy {
    /// Lowest enabled protocol. `None` keeps the platform default.
    pub min_protocol: Option<TlsVersion>,
    /// Highest enabled protocol. `None` keeps the platform default.
    pub max_protocol: Option<TlsVersion>,
    /// Enabled cipher suites. `None` keeps the platform default.
    pub cipher_suites: Option<Vec<String>>,
    /// Extra trusted CA certificates (PEM).
    pub trust_store_path: Option<PathBuf>,
    /// Whether to validate server certificates.
    pub validate_certificates: bool,
}

impl TlsPolicy {
    /// Validates the settings.
    ///
    /// Any malformed protocol or cipher-suite entry is a configuration error.
    pub fn from_settings(settings: &TlsSettings) -> LdapResult<Self> {
        let (min_protocol, max_protocol) = match &settings.protocols {
            None => (None, None),
            Some(names) => {
                if names.is_empty() {
                    return Err(LdapError::config("TLS protocol list is empty"));
                }
                let mut versions = names
                    .iter()
                    .map(|name| {
                        if name.trim().is_empty() {
                            Err(LdapError::config("TLS protocol list contains an empty entry"))
                        } else {
                            TlsVersion::parse(name)
                        }
                    })
                    .collect::<LdapResult<Vec<_>>>()?;
                versions.sort();
                (versions.first().copied(), versions.last().copied())
            }
        };

        if let Some(suites) = &settings.cipher_suites {
            if suites.is_empty() {
                return Err(LdapError::config("cipher suite list is empty"));
            }
            for suite in suites {
                validate_cipher_suite(suite)?;
            }
        }

        Ok(Self {
            min_protocol,
            max_protocol,
            cipher_suites: settings.cipher_suites.clone(),
            trust_store_path: settings.trust_store_path.clone(),
            validate_certificates: settings.validate_certificates,
        })
    }
}

fn validate_cipher_suite(suite: &str) -> LdapResult<()> {
    if suite.is_empty() {
        return Err(LdapError::config("cipher suite list contains an empty entry"));
    }
    let well_formed = (suite.starts_with("TLS_") || suite.starts_with("SSL_"))
        && suite
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
    if well_formed {
        Ok(())
    } else {
        Err(LdapError::config(format!("malformed cipher suite name '{suite}'")))
    }
}

/// Opens directory connections and reports typed outcomes.
#[derive(Clone)]
pub struct ConnectionEstablisher {
    connector: Arc<dyn Connector>,
    tls: TlsSettings,
    connect_timeout: Duration,
    operation_timeout: Duration,
}

impl ConnectionEstablisher {
    /// Creates an establisher with default timeouts.
    #[must_use]
    pub fn new(connector: Arc<dyn Connector>, tls: TlsSettings) -> Self {
        let defaults = EngineConfig::default();
        Self {
            connector,
            tls,
            connect_timeout: defaults.connect_timeout,
            operation_timeout: defaults.operation_timeout,
        }
    }

    /// Creates an establisher from the engine configuration.
    #[must_use]
    pub fn from_config(connector: Arc<dyn Connector>, config: &EngineConfig) -> Self {
        Self {
            connector,
            tls: config.tls.clone(),
            connect_timeout: config.connect_timeout,
            operation_timeout: config.operation_timeout,
        }
    }

    /// Overrides both timeouts.
    #[must_use]
    pub const fn with_timeouts(mut self, connect: Duration, operation: Duration) -> Self {
        self.connect_timeout = connect;
        self.operation_timeout = operation;
        self
    }

    /// Returns the TLS settings this establisher was built with.
    #[must_use]
    pub const fn tls_settings(&self) -> &TlsSettings {
        &self.tls
    }

    /// Opens one connection to `endpoint`.
    pub async fn connect(&self, endpoint: &Endpoint) -> Outcome<Box<dyn DirectorySession>> {
        let policy = match TlsPolicy::from_settings(&self.tls) {
            Ok(policy) => policy,
            Err(e) => {
                tracing::warn!(
                    host = %endpoint.host,
                    port = endpoint.port,
                    encryption = %endpoint.encryption,
                    error = %e,
                    "TLS policy rejected, not connecting"
                );
                return Outcome::CannotConfigure;
            }
        };

        let request = ConnectRequest {
            endpoint,
            tls: &policy,
            connect_timeout: self.connect_timeout,
            operation_timeout: self.operation_timeout,
        };

        let result = match tokio::time::timeout(self.connect_timeout, self.connector.connect(request)).await {
            Ok(result) => result,
            Err(_) => Err(LdapError::Timeout),
        };

        match result {
            Ok(session) => {
                tracing::debug!(
                    host = %endpoint.host,
                    port = endpoint.port,
                    encryption = %endpoint.encryption,
                    "Connected to directory"
                );
                Outcome::SuccessfulConnection(session)
            }
            Err(e) if e.is_configuration_error() => {
                tracing::warn!(host = %endpoint.host, error = %e, "TLS setup failed");
                Outcome::CannotConfigure
            }
            Err(e) => {
                tracing::info!(
                    host = %endpoint.host,
                    port = endpoint.port,
                    encryption = %endpoint.encryption,
                    error = %e,
                    "Cannot connect to directory"
                );
                Outcome::CannotConnect
            }
        }
    }
}

impl fmt::Debug for ConnectionEstablisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionEstablisher")
            .field("tls", &self.tls)
            .field("connect_timeout", &self.connect_timeout)
            .field("operation_timeout", &self.operation_timeout)
            .finish_non_exhaustive()
    }
}
