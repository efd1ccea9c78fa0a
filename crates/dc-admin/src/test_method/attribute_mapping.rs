//! Attribute mapping check.

use async_trait::async_trait;
use dc_ldap::config::fields;
use dc_ldap::{guesser_for, Authenticator, DirectoryConnectionConfig};

use super::{bound_session, close_quietly, TestMethod};
use crate::report::ConfigurationMessage;

/// Checks that every mapped LDAP attribute exists on directory users.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttributeMappingTest;

#[async_trait]
impl TestMethod for AttributeMappingTest {
    fn id(&self) -> &'static str {
        "testAttributeMapping"
    }

    fn description(&self) -> &'static str {
        "Verifies that every claim is mapped to an attribute that directory users carry."
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &[
            fields::HOST_NAME,
            fields::PORT,
            fields::ENCRYPTION_METHOD,
            fields::BIND_USER_DN,
            fields::BIND_USER_PASSWORD,
            fields::BASE_GROUP_DN,
            fields::ATTRIBUTE_MAPPINGS,
        ]
    }

    fn optional_fields(&self) -> &'static [&'static str] {
        &[
            fields::BIND_USER_METHOD,
            fields::BIND_REALM,
            fields::BIND_KDC_ADDRESS,
            fields::LDAP_TYPE,
            fields::MEMBERSHIP_ATTRIBUTE,
        ]
    }

    async fn run(
        &self,
        authenticator: &Authenticator,
        config: &DirectoryConnectionConfig,
    ) -> Vec<ConfigurationMessage> {
        let mut session = match bound_session(authenticator, config).await {
            Ok(session) => session,
            Err(message) => return vec![message],
        };

        let base_group_dn = config.base_group_dn.as_deref().unwrap_or_default().trim();
        let membership = config
            .membership_attribute
            .as_deref()
            .map(str::trim)
            .filter(|attr| !attr.is_empty())
            .unwrap_or_else(|| config.ldap_type.membership_attribute());

        let options = guesser_for(config.ldap_type)
            .claim_attribute_options(session.as_mut(), base_group_dn, membership)
            .await;
        close_quietly(session).await;

        let options = match options {
            Ok(options) => options,
            Err(e) => {
                tracing::warn!(base = base_group_dn, error = %e, "Unable to read user attributes");
                return vec![ConfigurationMessage::failure("Unable to read user attributes from the directory")
                    .config_id(fields::BASE_GROUP_DN)];
            }
        };

        // Attribute names compare case-insensitively.
        let known = |attribute: &str| options.iter().any(|o| o.eq_ignore_ascii_case(attribute));

        let messages: Vec<_> = config
            .attribute_mappings
            .iter()
            .filter(|(_, attribute)| !known(attribute.trim()))
            .map(|(claim, attribute)| {
                ConfigurationMessage::failure(format!(
                    "Attribute '{attribute}' is not available on directory users"
                ))
                .config_id(format!("{}.{claim}", fields::ATTRIBUTE_MAPPINGS))
            })
            .collect();

        if messages.is_empty() {
            return vec![ConfigurationMessage::success("Every mapped attribute is available on directory users")];
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dc_core::TlsSettings;
    use dc_ldap::mock::MockDirectory;
    use dc_ldap::{EncryptionMethod, LdapError, RawEntry};

    use super::*;
    use crate::report::MessageType;

    const GROUPS: &str = "ou=groups,dc=example,dc=com";
    const ALICE: &str = "uid=alice,ou=people,dc=example,dc=com";

    fn config() -> DirectoryConnectionConfig {
        DirectoryConnectionConfig::builder()
            .endpoint("ldap.example.com", 389, EncryptionMethod::None)
            .bind("Simple", "cn=admin,dc=example,dc=com", "secret")
            .bases("ou=people,dc=example,dc=com", GROUPS)
            .mapping("http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress", "mail")
            .mapping("http://schemas.xmlsoap.org/ws/2005/05/identity/claims/role", "employeeType")
            .build()
    }

    fn directory() -> MockDirectory {
        let directory = MockDirectory::new();
        directory.add_search_entries(
            GROUPS,
            "(member=*)",
            vec![RawEntry::new(format!("cn=staff,{GROUPS}")).with("member", ALICE)],
        );
        directory.add_search_entries(
            ALICE,
            "(objectClass=*)",
            vec![RawEntry::new(ALICE).with("uid", "alice").with("employeeType", "contractor")],
        );
        directory
    }

    async fn run(directory: &MockDirectory, config: &DirectoryConnectionConfig) -> Vec<ConfigurationMessage> {
        let authenticator = Authenticator::with_connector(Arc::new(directory.clone()), TlsSettings::default());
        AttributeMappingTest.run(&authenticator, config).await
    }

    #[tokio::test]
    async fn mapped_attributes_found_on_member() {
        let messages = run(&directory(), &config()).await;

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message_type, MessageType::Success);
    }

    #[tokio::test]
    async fn unknown_attribute_points_at_claim() {
        let mut config = config();
        config.attribute_mappings.insert("phone".to_string(), "pager".to_string());

        let messages = run(&directory(), &config).await;

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message_type, MessageType::Failure);
        assert_eq!(messages[0].config_id.as_deref(), Some("attributeMappings.phone"));
    }

    #[tokio::test]
    async fn attribute_names_ignore_case() {
        let mut config = config();
        config.attribute_mappings.insert("role".to_string(), "EMPLOYEETYPE".to_string());

        let messages = run(&directory(), &config).await;

        assert_eq!(messages[0].message_type, MessageType::Success);
    }

    #[tokio::test]
    async fn unreadable_groups_fail_on_group_base() {
        let directory = directory();
        directory.fail_search_start(GROUPS, "(member=*)", LdapError::search("insufficient access"));

        let messages = run(&directory, &config()).await;

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].config_id.as_deref(), Some(fields::BASE_GROUP_DN));
        assert_eq!(directory.stats().closes, 1);
    }
}
