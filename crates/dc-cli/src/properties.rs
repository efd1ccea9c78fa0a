//! Directory configuration files.
//!
//! A properties file is a flat JSON object or TOML table using the same
//! camelCase keys as the handler, e.g.:
//!
//! ```toml
//! hostName = "ldap.example.com"
//! port = 636
//! encryptionMethod = "tls"
//! bindUserDn = "cn=admin,dc=example,dc=com"
//! bindUserPassword = "secret"
//! ```

use std::path::Path;

use dc_admin::ConfigurationMessage;
use dc_ldap::DirectoryConnectionConfig;
use serde_json::{Map, Value};

use crate::error::{CliError, CliResult};

/// Reads a properties file. Files ending in `.toml` are TOML, others JSON.
pub fn read_properties(path: &Path) -> CliResult<Map<String, Value>> {
    let content = std::fs::read_to_string(path)?;
    let invalid = |message: String| CliError::Properties {
        path: path.display().to_string(),
        message,
    };

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    if is_toml {
        toml::from_str(&content).map_err(|e| invalid(e.to_string()))
    } else {
        serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))
    }
}

/// Builds the directory configuration from properties.
///
/// A value that does not fit its field becomes one `FAILURE` message.
pub fn parse_config(properties: Map<String, Value>) -> Result<DirectoryConnectionConfig, ConfigurationMessage> {
    DirectoryConnectionConfig::from_properties(properties).map_err(|e| ConfigurationMessage::failure(e.to_string()))
}
