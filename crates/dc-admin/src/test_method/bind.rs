//! Bind check.

use async_trait::async_trait;
use dc_ldap::config::fields;
use dc_ldap::{Authenticator, DirectoryConnectionConfig};

use super::{bound_session, close_quietly, TestMethod};
use crate::report::ConfigurationMessage;
use crate::validation::BIND_FIELDS;

/// Connects and binds with the configured credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct BindTest;

#[async_trait]
impl TestMethod for BindTest {
    fn id(&self) -> &'static str {
        "testLdapBind"
    }

    fn description(&self) -> &'static str {
        "Verifies that the bind user can authenticate against the directory server."
    }

    fn required_fields(&self) -> &'static [&'static str] {
        BIND_FIELDS
    }

    fn optional_fields(&self) -> &'static [&'static str] {
        &[fields::BIND_USER_METHOD, fields::BIND_REALM, fields::BIND_KDC_ADDRESS]
    }

    async fn run(
        &self,
        authenticator: &Authenticator,
        config: &DirectoryConnectionConfig,
    ) -> Vec<ConfigurationMessage> {
        match bound_session(authenticator, config).await {
            Ok(session) => {
                close_quietly(session).await;
                vec![ConfigurationMessage::success("Successfully bound the user to the directory server")]
            }
            Err(message) => vec![message],
        }
    }
}
