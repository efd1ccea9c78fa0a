//! Authentication on top of an established connection.

use std::sync::Arc;

use dc_core::TlsSettings;

use crate::bind::select_bind_request;
use crate::config::DirectoryConnectionConfig;
use crate::connection::ConnectionEstablisher;
use crate::directory::{Connector, DirectorySession};
use crate::outcome::Outcome;

/// Connects and binds in one step.
#[derive(Debug, Clone)]
pub struct Authenticator {
    establisher: ConnectionEstablisher,
}

impl Authenticator {
    /// Creates an authenticator over an establisher.
    #[must_use]
    pub const fn new(establisher: ConnectionEstablisher) -> Self {
        Self { establisher }
    }

    /// Creates an authenticator with default timeouts.
    #[must_use]
    pub fn with_connector(connector: Arc<dyn Connector>, tls: TlsSettings) -> Self {
        Self::new(ConnectionEstablisher::new(connector, tls))
    }

    /// Returns the underlying establisher.
    #[must_use]
    pub const fn establisher(&self) -> &ConnectionEstablisher {
        &self.establisher
    }

    /// Connects to the configured endpoint and binds.
    ///
    /// A failed connection outcome is returned unchanged. Any bind fault is
    /// `cannotBind`; the session is closed before returning.
    pub async fn bind(&self, config: &DirectoryConnectionConfig) -> Outcome<Box<dyn DirectorySession>> {
        let Some(endpoint) = config.endpoint() else {
            tracing::warn!("Bind requested without a complete endpoint");
            return Outcome::CannotConnect;
        };

        let mut session = match self.establisher.connect(&endpoint).await {
            Outcome::SuccessfulConnection(session) => session,
            failed => return failed,
        };

        let request = select_bind_request(
            config.bind_method(),
            config.bind_user_dn.as_deref().unwrap_or_default(),
            config.bind_user_password.as_deref().unwrap_or_default(),
            config.bind_realm.as_deref(),
            config.bind_kdc_address.as_deref(),
        );

        match session.bind(&request).await {
            Ok(()) => {
                tracing::debug!(
                    host = %endpoint.host,
                    mechanism = request.mechanism(),
                    "Bound to directory"
                );
                Outcome::SuccessfulBind(session)
            }
            Err(e) => {
                tracing::info!(
                    host = %endpoint.host,
                    mechanism = request.mechanism(),
                    error = %e,
                    "Directory rejected bind"
                );
                if let Err(e) = session.close().await {
                    tracing::debug!(error = %e, "Failed to close session after bind failure");
                }
                Outcome::CannotBind
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bind::BindMethod;
    use crate::config::EncryptionMethod;
    use crate::error::LdapError;
    use crate::mock::MockDirectory;
    use crate::outcome::OutcomeKind;

    fn config(method: &str) -> DirectoryConnectionConfig {
        DirectoryConnectionConfig::builder()
            .endpoint("ldap.example.com", 389, EncryptionMethod::None)
            .bind(method, "cn=admin,dc=example,dc=com", "secret")
            .build()
    }

    fn authenticator(directory: &MockDirectory) -> Authenticator {
        Authenticator::with_connector(Arc::new(directory.clone()), TlsSettings::default())
    }

    #[tokio::test]
    async fn successful_bind() {
        let directory = MockDirectory::new();
        let outcome = authenticator(&directory).bind(&config("Simple")).await;

        assert_eq!(outcome.kind(), OutcomeKind::SuccessfulBind);
        assert_eq!(directory.stats().binds, 1);
        assert_eq!(directory.last_bind_method(), Some(BindMethod::Simple));
    }

    #[tokio::test]
    async fn rejected_bind_closes_session() {
        let directory = MockDirectory::new();
        directory.fail_bind(LdapError::bind("invalid credentials"));

        let outcome = authenticator(&directory).bind(&config("Simple")).await;

        assert_eq!(outcome.kind(), OutcomeKind::CannotBind);
        assert_eq!(directory.stats().closes, 1);
    }

    #[tokio::test]
    async fn connection_failure_propagates_unchanged() {
        let directory = MockDirectory::new();
        directory.fail_connect(LdapError::connection("refused"));

        let outcome = authenticator(&directory).bind(&config("Simple")).await;

        assert_eq!(outcome.kind(), OutcomeKind::CannotConnect);
        assert_eq!(directory.stats().binds, 0);
    }

    #[tokio::test]
    async fn unknown_method_binds_simple() {
        let directory = MockDirectory::new();
        let outcome = authenticator(&directory).bind(&config("NTLM")).await;

        assert!(outcome.is_success());
        assert_eq!(directory.last_bind_method(), Some(BindMethod::Simple));
    }

    #[tokio::test]
    async fn incomplete_endpoint_is_cannot_connect() {
        let directory = MockDirectory::new();
        let mut incomplete = config("Simple");
        incomplete.host_name = None;

        let outcome = authenticator(&directory).bind(&incomplete).await;

        assert_eq!(outcome.kind(), OutcomeKind::CannotConnect);
        assert_eq!(directory.stats().connects, 0);
    }
}
