//! Directory structure check.

use async_trait::async_trait;
use dc_ldap::config::{fields, ldap_escape, presence_filter};
use dc_ldap::{collect_entries, Authenticator, DirectoryConnectionConfig, DirectorySession, SearchRequest};

use super::{bound_session, close_quietly, TestMethod};
use crate::report::{ConfigurationMessage, MessageType};

const ANY_OBJECT: &str = "(objectClass=*)";

/// Checks that the user and group bases exist and hold entries of the
/// expected shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryStructureTest;

#[async_trait]
impl TestMethod for DirectoryStructureTest {
    fn id(&self) -> &'static str {
        "testLdapDirStruct"
    }

    fn description(&self) -> &'static str {
        "Verifies that the user and group base DNs exist and contain users and groups."
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &[
            fields::HOST_NAME,
            fields::PORT,
            fields::ENCRYPTION_METHOD,
            fields::BIND_USER_DN,
            fields::BIND_USER_PASSWORD,
            fields::BASE_USER_DN,
            fields::BASE_GROUP_DN,
            fields::USER_NAME_ATTRIBUTE,
        ]
    }

    fn optional_fields(&self) -> &'static [&'static str] {
        &[
            fields::BIND_USER_METHOD,
            fields::BIND_REALM,
            fields::BIND_KDC_ADDRESS,
            fields::LDAP_TYPE,
            fields::GROUP_OBJECT_CLASS,
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

        let mut messages = Vec::new();
        check_users(session.as_mut(), config, &mut messages).await;
        check_groups(session.as_mut(), config, &mut messages).await;
        close_quietly(session).await;

        if messages.is_empty() {
            messages.push(ConfigurationMessage::success("Found users and groups in the configured base DNs"));
        }
        messages
    }
}

fn text(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or_default()
}

/// Number of entries matched, or `None` when the search could not start.
async fn count(session: &mut dyn DirectorySession, request: SearchRequest) -> Option<usize> {
    match collect_entries(session, &request).await {
        Ok(entries) => Some(entries.len()),
        Err(e) => {
            tracing::warn!(base = %request.base, filter = %request.filter, error = %e, "Structure check search failed");
            None
        }
    }
}

async fn check_users(
    session: &mut dyn DirectorySession,
    config: &DirectoryConnectionConfig,
    messages: &mut Vec<ConfigurationMessage>,
) {
    let base = text(&config.base_user_dn);
    if count(session, SearchRequest::base_object(base, ANY_OBJECT).with_attributes(["1.1"]))
        .await
        .unwrap_or_default()
        == 0
    {
        messages.push(
            ConfigurationMessage::failure("The user base DN was not found in the directory")
                .config_id(fields::BASE_USER_DN),
        );
        return;
    }

    let attribute = text(&config.user_name_attribute);
    let filter = match presence_filter(attribute) {
        Ok(filter) => filter,
        Err(e) => {
            messages.push(
                ConfigurationMessage::build(MessageType::InvalidField, e.to_string())
                    .config_id(fields::USER_NAME_ATTRIBUTE),
            );
            return;
        }
    };
    let users = SearchRequest::subtree(base, filter).with_attributes([attribute]);
    if count(session, users).await.unwrap_or_default() == 0 {
        messages.push(
            ConfigurationMessage::failure("No users with the user name attribute were found under the user base DN")
                .config_id(fields::USER_NAME_ATTRIBUTE),
        );
    }
}

async fn check_groups(
    session: &mut dyn DirectorySession,
    config: &DirectoryConnectionConfig,
    messages: &mut Vec<ConfigurationMessage>,
) {
    let base = text(&config.base_group_dn);
    if count(session, SearchRequest::base_object(base, ANY_OBJECT).with_attributes(["1.1"]))
        .await
        .unwrap_or_default()
        == 0
    {
        messages.push(
            ConfigurationMessage::failure("The group base DN was not found in the directory")
                .config_id(fields::BASE_GROUP_DN),
        );
        return;
    }

    let object_class = match text(&config.group_object_class) {
        "" => config.ldap_type.group_object_class(),
        class => class,
    };
    let membership = match text(&config.membership_attribute) {
        "" => config.ldap_type.membership_attribute(),
        attr => attr,
    };

    let groups = SearchRequest::subtree(base, format!("(objectClass={})", ldap_escape(object_class)))
        .with_attributes([membership]);
    let entries = match collect_entries(session, &groups).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(base, error = %e, "Group search failed");
            Vec::new()
        }
    };

    if entries.is_empty() {
        messages.push(
            ConfigurationMessage::failure("No groups of the group object class were found under the group base DN")
                .config_id(fields::GROUP_OBJECT_CLASS),
        );
    } else if !entries.iter().any(|group| group.has_attr(membership)) {
        messages.push(
            ConfigurationMessage::failure("No group under the group base DN has the membership attribute")
                .config_id(fields::MEMBERSHIP_ATTRIBUTE),
        );
    }
}
