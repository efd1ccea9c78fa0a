//! Existing configuration listing.

use dc_admin::LdapConfigurationHandler;
use dc_ldap::DirectoryConnectionConfig;
use serde::Serialize;
use tabled::Tabled;

use crate::config::OutputFormat;
use crate::error::CliResult;
use crate::output;

/// Login configuration row for display.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct ConfigurationRow {
    /// Record id.
    #[tabled(rename = "Service PID")]
    pub service_pid: String,
    /// Connection URL.
    #[tabled(rename = "URL")]
    pub url: String,
    /// Bind user.
    #[tabled(rename = "Bind User")]
    pub bind_user_dn: String,
    /// User base.
    #[tabled(rename = "User Base")]
    pub base_user_dn: String,
    /// Group base.
    #[tabled(rename = "Group Base")]
    pub base_group_dn: String,
}

impl From<DirectoryConnectionConfig> for ConfigurationRow {
    fn from(config: DirectoryConnectionConfig) -> Self {
        let mut url = config.ldap_url().unwrap_or_default();
        if config.is_start_tls() {
            url.push_str(" (STARTTLS)");
        }
        Self {
            service_pid: config.service_pid.unwrap_or_default(),
            url,
            bind_user_dn: config.bind_user_dn.unwrap_or_default(),
            base_user_dn: config.base_user_dn.unwrap_or_default(),
            base_group_dn: config.base_group_dn.unwrap_or_default(),
        }
    }
}

/// Lists existing login configurations.
pub async fn run_list(handler: &LdapConfigurationHandler, format: OutputFormat) -> CliResult<()> {
    let rows: Vec<ConfigurationRow> = handler
        .configurations()
        .await?
        .into_iter()
        .map(ConfigurationRow::from)
        .collect();
    output::output(&rows, format)
}

#[cfg(test)]
mod tests {
    use dc_ldap::EncryptionMethod;

    use super::*;

    #[test]
    fn row_marks_starttls() {
        let config = DirectoryConnectionConfig::builder()
            .endpoint("ldap.example.com", 389, EncryptionMethod::StartTls)
            .bind("Simple", "cn=admin", "secret")
            .service_pid("Ldap_Login_Config.1")
            .build();

        let row = ConfigurationRow::from(config);

        assert_eq!(row.url, "ldap://ldap.example.com:389 (STARTTLS)");
        assert_eq!(row.service_pid, "Ldap_Login_Config.1");
    }
}
