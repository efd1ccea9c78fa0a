//! Engine configuration.
//!
//! Configuration is loaded from environment variables with sensible defaults.
//! The TLS lists are kept exactly as supplied: a malformed list is not an
//! error here, it surfaces as a `cannotConfigure` outcome on the first
//! connection attempt.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Enabled cipher suites (comma-separated).
pub const ENV_TLS_CIPHER_SUITES: &str = "DC_TLS_CIPHER_SUITES";
/// Enabled TLS protocols (comma-separated).
pub const ENV_TLS_PROTOCOLS: &str = "DC_TLS_PROTOCOLS";
/// PEM bundle of extra trust roots.
pub const ENV_TLS_TRUST_STORE: &str = "DC_TLS_TRUST_STORE";
/// Whether server certificates are validated.
pub const ENV_TLS_VALIDATE_CERTIFICATES: &str = "DC_TLS_VALIDATE_CERTIFICATES";
/// Connect timeout in seconds.
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "DC_CONNECT_TIMEOUT_SECS";
/// Per-operation timeout in seconds.
pub const ENV_OPERATION_TIMEOUT_SECS: &str = "DC_OPERATION_TIMEOUT_SECS";
/// Installation home directory.
pub const ENV_HOME: &str = "DC_HOME";

/// TLS settings shared by every directory connection in the process.
///
/// Read once at startup and handed to the connection establisher; nothing
/// consults the environment at connect time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsSettings {
    /// Enabled cipher suites. `None` keeps the platform defaults.
    pub cipher_suites: Option<Vec<String>>,

    /// Enabled protocol versions (`TLSv1.2`, ...). `None` keeps the defaults.
    pub protocols: Option<Vec<String>>,

    /// Extra trusted CA certificates (PEM).
    pub trust_store_path: Option<PathBuf>,

    /// Whether to validate server certificates.
    /// Should always be true in production.
    pub validate_certificates: bool,
}

impl Default for TlsSettings {
    fn default() -> Self {
        Self {
            cipher_suites: None,
            protocols: None,
            trust_store_path: None,
            validate_certificates: true,
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// TLS settings.
    pub tls: TlsSettings,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Timeout for a single bind or search operation.
    pub operation_timeout: Duration,

    /// Installation home. Attribute-mapping files are written below it.
    pub home_dir: PathBuf,
}

impl EngineConfig {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let tls = TlsSettings {
            cipher_suites: lookup(ENV_TLS_CIPHER_SUITES).map(|v| split_list(&v)),
            protocols: lookup(ENV_TLS_PROTOCOLS).map(|v| split_list(&v)),
            trust_store_path: lookup(ENV_TLS_TRUST_STORE)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            validate_certificates: lookup(ENV_TLS_VALIDATE_CERTIFICATES)
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),
        };

        let connect_timeout = parse_secs(&lookup, ENV_CONNECT_TIMEOUT_SECS)?
            .unwrap_or(defaults.connect_timeout);
        let operation_timeout = parse_secs(&lookup, ENV_OPERATION_TIMEOUT_SECS)?
            .unwrap_or(defaults.operation_timeout);

        let home_dir = lookup(ENV_HOME)
            .filter(|v| !v.trim().is_empty())
            .map_or(defaults.home_dir, PathBuf::from);

        Ok(Self {
            tls,
            connect_timeout,
            operation_timeout,
            home_dir,
        })
    }

    /// Creates a configuration for testing.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            connect_timeout: Duration::from_secs(2),
            operation_timeout: Duration::from_secs(5),
            ..Self::default()
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tls: TlsSettings::default(),
            connect_timeout: Duration::from_secs(5),
            operation_timeout: Duration::from_secs(30),
            home_dir: PathBuf::from("."),
        }
    }
}

/// Splits a comma-separated list, trimming whitespace but keeping empty
/// entries so that a malformed list stays detectable downstream.
fn split_list(value: &str) -> Vec<String> {
    value.split(',').map(|s| s.trim().to_string()).collect()
}

fn parse_secs<F>(lookup: &F, key: &str) -> Result<Option<Duration>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| Error::config(format!("{key} must be a whole number of seconds, got '{raw}'"))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.operation_timeout, Duration::from_secs(30));
        assert!(config.tls.cipher_suites.is_none());
        assert!(config.tls.protocols.is_none());
        assert!(config.tls.validate_certificates);
        assert_eq!(config.home_dir, PathBuf::from("."));
    }

    #[test]
    fn reads_tls_lists() {
        let config = EngineConfig::from_lookup(lookup(&[
            (ENV_TLS_CIPHER_SUITES, "TLS_AES_128_GCM_SHA256, TLS_AES_256_GCM_SHA384"),
            (ENV_TLS_PROTOCOLS, "TLSv1.2,TLSv1.3"),
            (ENV_TLS_VALIDATE_CERTIFICATES, "false"),
        ]))
        .unwrap();

        assert_eq!(
            config.tls.cipher_suites,
            Some(vec![
                "TLS_AES_128_GCM_SHA256".to_string(),
                "TLS_AES_256_GCM_SHA384".to_string()
            ])
        );
        assert_eq!(
            config.tls.protocols,
            Some(vec!["TLSv1.2".to_string(), "TLSv1.3".to_string()])
        );
        assert!(!config.tls.validate_certificates);
    }

    #[test]
    fn keeps_malformed_lists_for_later() {
        let config =
            EngineConfig::from_lookup(lookup(&[(ENV_TLS_CIPHER_SUITES, "TLS_A,,TLS_B")])).unwrap();

        assert_eq!(config.tls.cipher_suites.map(|c| c.len()), Some(3));
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        let result = EngineConfig::from_lookup(lookup(&[(ENV_CONNECT_TIMEOUT_SECS, "soon")]));

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn explicit_timeouts_and_home() {
        let config = EngineConfig::from_lookup(lookup(&[
            (ENV_CONNECT_TIMEOUT_SECS, "3"),
            (ENV_OPERATION_TIMEOUT_SECS, "12"),
            (ENV_HOME, "/opt/console"),
        ]))
        .unwrap();

        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.operation_timeout, Duration::from_secs(12));
        assert_eq!(config.home_dir, PathBuf::from("/opt/console"));
    }
}
