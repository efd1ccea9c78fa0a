//! Named test methods.
//!
//! Each method declares the fields it needs. The registry validates them
//! before the method runs, so a method never sees an incomplete
//! configuration.

mod attribute_mapping;
mod bind;
mod connection;
mod dir_struct;

use async_trait::async_trait;
use dc_ldap::{Authenticator, DirectoryConnectionConfig, DirectorySession, Outcome, OutcomeKind};

use crate::report::{ConfigurationMessage, MessageType, TestMethodDescriptor, TestReport};
use crate::validation;

pub use attribute_mapping::AttributeMappingTest;
pub use bind::BindTest;
pub use connection::ConnectionTest;
pub use dir_struct::DirectoryStructureTest;

/// A named check over a directory configuration.
#[async_trait]
pub trait TestMethod: Send + Sync {
    /// Test id.
    fn id(&self) -> &'static str;

    /// What the test checks.
    fn description(&self) -> &'static str;

    /// Fields the test cannot run without.
    fn required_fields(&self) -> &'static [&'static str];

    /// Fields the test reads when present.
    fn optional_fields(&self) -> &'static [&'static str] {
        &[]
    }

    /// Runs the test on a validated configuration.
    async fn run(
        &self,
        authenticator: &Authenticator,
        config: &DirectoryConnectionConfig,
    ) -> Vec<ConfigurationMessage>;

    /// Describes the test.
    fn descriptor(&self) -> TestMethodDescriptor {
        let owned = |fields: &[&str]| fields.iter().map(|f| (*f).to_string()).collect();
        TestMethodDescriptor {
            id: self.id().to_string(),
            description: self.description().to_string(),
            required_fields: owned(self.required_fields()),
            optional_fields: owned(self.optional_fields()),
        }
    }
}

/// The fixed set of test methods.
pub struct TestRegistry {
    methods: Vec<Box<dyn TestMethod>>,
}

impl TestRegistry {
    /// Creates the registry with every built-in method.
    #[must_use]
    pub fn new() -> Self {
        Self {
            methods: vec![
                Box::new(ConnectionTest),
                Box::new(BindTest),
                Box::new(DirectoryStructureTest),
                Box::new(AttributeMappingTest),
            ],
        }
    }

    /// Finds a method by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&dyn TestMethod> {
        self.methods.iter().find(|m| m.id() == id).map(|m| &**m)
    }

    /// Describes every method.
    #[must_use]
    pub fn descriptors(&self) -> Vec<TestMethodDescriptor> {
        self.methods.iter().map(|m| m.descriptor()).collect()
    }

    /// Validates and runs the method named `id`.
    pub async fn run(
        &self,
        id: &str,
        authenticator: &Authenticator,
        config: &DirectoryConnectionConfig,
    ) -> TestReport {
        let Some(method) = self.get(id) else {
            tracing::debug!(test = id, "No such test method");
            return TestReport::single(ConfigurationMessage::new(MessageType::NoTestFound));
        };

        let missing = validation::validate(config, method.required_fields());
        if !missing.is_empty() {
            return TestReport::new(missing);
        }

        let mut invalid = validation::attribute_fields(config, method.required_fields());
        invalid.extend(validation::attribute_fields(config, method.optional_fields()));
        if !invalid.is_empty() {
            return TestReport::new(invalid);
        }

        TestReport::new(method.run(authenticator, config).await)
    }
}

impl Default for TestRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TestRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.methods.iter().map(|m| m.id())).finish()
    }
}

/// Turns a failed connect or bind outcome into its single message.
///
/// The field path points at what the operator should fix.
#[must_use]
pub fn outcome_failure(kind: OutcomeKind) -> Option<ConfigurationMessage> {
    use dc_ldap::config::fields;

    let message = match kind {
        OutcomeKind::CannotConnect => {
            ConfigurationMessage::failure("Unable to reach the directory server").config_id(fields::HOST_NAME)
        }
        OutcomeKind::CannotConfigure => ConfigurationMessage::failure(
            "Unable to set up an encrypted connection with the system TLS settings",
        )
        .config_id(fields::ENCRYPTION_METHOD),
        OutcomeKind::CannotBind => ConfigurationMessage::failure("Unable to bind the user to the directory server")
            .config_id(fields::BIND_USER_DN),
        OutcomeKind::SuccessfulConnection | OutcomeKind::SuccessfulBind => return None,
    };
    Some(message)
}

/// Connects and binds, or returns the failure message.
pub async fn bound_session(
    authenticator: &Authenticator,
    config: &DirectoryConnectionConfig,
) -> Result<Box<dyn DirectorySession>, ConfigurationMessage> {
    let outcome = authenticator.bind(config).await;
    let kind = outcome.kind();
    match outcome {
        Outcome::SuccessfulBind(session) | Outcome::SuccessfulConnection(session) => Ok(session),
        _ => Err(outcome_failure(kind)
            .unwrap_or_else(|| ConfigurationMessage::failure("Unable to bind the user to the directory server"))),
    }
}

/// Closes a session, logging instead of failing.
pub async fn close_quietly(mut session: Box<dyn DirectorySession>) {
    if let Err(e) = session.close().await {
        tracing::debug!(error = %e, "Failed to close directory session");
    }
}
