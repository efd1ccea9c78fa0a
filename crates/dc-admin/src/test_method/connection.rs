//! Connectivity check.

use async_trait::async_trait;
use dc_ldap::config::fields;
use dc_ldap::{Authenticator, DirectoryConnectionConfig, Outcome};

use super::{close_quietly, outcome_failure, TestMethod};
use crate::report::ConfigurationMessage;
use crate::validation::CONNECTION_FIELDS;

/// Opens a connection to the configured endpoint and closes it again.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionTest;

#[async_trait]
impl TestMethod for ConnectionTest {
    fn id(&self) -> &'static str {
        "testLdapConnection"
    }

    fn description(&self) -> &'static str {
        "Verifies that a connection to the directory server can be established."
    }

    fn required_fields(&self) -> &'static [&'static str] {
        CONNECTION_FIELDS
    }

    async fn run(
        &self,
        authenticator: &Authenticator,
        config: &DirectoryConnectionConfig,
    ) -> Vec<ConfigurationMessage> {
        let Some(endpoint) = config.endpoint() else {
            return vec![ConfigurationMessage::required_field(fields::HOST_NAME)];
        };

        let outcome = authenticator.establisher().connect(&endpoint).await;
        let kind = outcome.kind();
        match outcome {
            Outcome::SuccessfulConnection(session) | Outcome::SuccessfulBind(session) => {
                close_quietly(session).await;
                vec![ConfigurationMessage::success("Successfully connected to the directory server")]
            }
            _ => outcome_failure(kind).into_iter().collect(),
        }
    }
}
