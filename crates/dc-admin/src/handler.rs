//! The LDAP configuration handler.
//!
//! Entry point for the invoking transport: probes, tests, persists,
//! capabilities and the list of existing login configurations. Every call
//! builds its connection fresh and closes it before returning.

use std::path::PathBuf;
use std::sync::Arc;

use dc_core::EngineConfig;
use dc_ldap::config::fields;
use dc_ldap::{
    guess_structure, guesser_for, query, Authenticator, ConnectionEstablisher, Connector,
    DirectoryConnectionConfig, Outcome,
};
use serde_json::{Map, Value};

use crate::error::AdminResult;
use crate::persist::{self, LOGIN_FACTORY_PID};
use crate::report::{CapabilitiesReport, ConfigurationMessage, ProbeReport, TestReport};
use crate::store::ConfigurationStore;
use crate::test_method::{bound_session, close_quietly, outcome_failure, TestRegistry};
use crate::validation::{self, BIND_FIELDS, CONNECTION_FIELDS};

/// Handler id published in the capabilities report.
pub const HANDLER_ID: &str = "ldap";

/// Host configuration holding the STS client claims.
pub const STS_CLIENT_CONFIG_PID: &str = "ddf.security.sts.client.configuration";

/// Probe ids.
pub mod probe_ids {
    /// Connect without binding.
    pub const CONNECTION: &str = "connection";
    /// Example bind principal for the declared flavor.
    pub const BIND_USER_EXAMPLE: &str = "bindUserExample";
    /// Run the configured query.
    pub const LDAP_QUERY: &str = "ldapQuery";
    /// Guess the directory structure.
    pub const DIRECTORY_STRUCTURE: &str = "directoryStructure";
    /// Claims and the user attributes they can map to.
    pub const SUBJECT_ATTRIBUTE_MAP: &str = "subjectAttributeMap";
}

/// Persist ids.
pub mod persist_ids {
    /// Stage and commit new records.
    pub const CREATE: &str = "create";
    /// Remove an existing record.
    pub const DELETE: &str = "delete";
}

/// Probe result keys.
pub mod result_keys {
    /// Outcome kind of the connectivity probe.
    pub const CONNECTION_RESULT: &str = "connectionResult";
    /// Example bind principal.
    pub const BIND_USER_DN: &str = "bindUserDn";
    /// Records returned by the query probe.
    pub const LDAP_QUERY_RESULTS: &str = "ldapQueryResults";
    /// Candidate user bases.
    pub const BASE_USER_DN: &str = "baseUserDn";
    /// Candidate group bases.
    pub const BASE_GROUP_DN: &str = "baseGroupDn";
    /// Default naming attribute.
    pub const USER_NAME_ATTRIBUTE: &str = "userNameAttribute";
    /// Default group object class.
    pub const GROUP_OBJECT_CLASS: &str = "groupObjectClass";
    /// Default membership attribute.
    pub const MEMBERSHIP_ATTRIBUTE: &str = "membershipAttribute";
    /// Suggested query filters.
    pub const QUERY: &str = "query";
    /// Suggested query bases.
    pub const QUERY_BASE: &str = "queryBase";
    /// Claims configured for the STS client.
    pub const SUBJECT_CLAIMS: &str = "subjectClaims";
    /// User attributes a claim can map to.
    pub const LDAP_USER_ATTRIBUTES: &str = "ldapUserAttributes";
}

/// Filter suggested by the structure probe.
const DEFAULT_QUERY: &str = "objectClass=*";

/// Fields the query probe needs.
const LDAP_QUERY_FIELDS: &[&str] = &[
    fields::HOST_NAME,
    fields::PORT,
    fields::ENCRYPTION_METHOD,
    fields::BIND_USER_DN,
    fields::BIND_USER_PASSWORD,
    fields::QUERY,
    fields::QUERY_BASE,
];

/// Fields the subject attribute map probe needs to read user attributes.
const ATTRIBUTE_MAP_FIELDS: &[&str] = &[
    fields::HOST_NAME,
    fields::PORT,
    fields::ENCRYPTION_METHOD,
    fields::BIND_USER_DN,
    fields::BIND_USER_PASSWORD,
    fields::BASE_GROUP_DN,
];

/// Probes, tests and persists directory configurations.
pub struct LdapConfigurationHandler {
    authenticator: Authenticator,
    store: Arc<dyn ConfigurationStore>,
    home_dir: PathBuf,
    tests: TestRegistry,
}

impl LdapConfigurationHandler {
    /// Creates a handler.
    #[must_use]
    pub fn new(authenticator: Authenticator, store: Arc<dyn ConfigurationStore>, home_dir: impl Into<PathBuf>) -> Self {
        Self {
            authenticator,
            store,
            home_dir: home_dir.into(),
            tests: TestRegistry::new(),
        }
    }

    /// Creates a handler using the engine's TLS settings, timeouts and home.
    #[must_use]
    pub fn from_engine_config(
        config: &EngineConfig,
        connector: Arc<dyn Connector>,
        store: Arc<dyn ConfigurationStore>,
    ) -> Self {
        let authenticator = Authenticator::new(ConnectionEstablisher::from_config(connector, config));
        Self::new(authenticator, store, config.home_dir.clone())
    }

    /// Returns the handler id.
    #[must_use]
    pub const fn handler_id(&self) -> &'static str {
        HANDLER_ID
    }

    /// Describes the handler and its test methods.
    #[must_use]
    pub fn capabilities(&self) -> CapabilitiesReport {
        CapabilitiesReport {
            handler_id: HANDLER_ID.to_string(),
            test_methods: self.tests.descriptors(),
        }
    }

    /// Runs the probe named `probe_id`.
    pub async fn probe(&self, probe_id: &str, config: &DirectoryConnectionConfig) -> ProbeReport {
        tracing::debug!(probe = probe_id, flavor = config.ldap_type.as_str(), "Running probe");

        match probe_id {
            probe_ids::CONNECTION => self.probe_connection(config).await,
            probe_ids::BIND_USER_EXAMPLE => ProbeReport::default()
                .with_result(result_keys::BIND_USER_DN, config.ldap_type.bind_user_example()),
            probe_ids::LDAP_QUERY => self.probe_query(config).await,
            probe_ids::DIRECTORY_STRUCTURE => self.probe_structure(config).await,
            probe_ids::SUBJECT_ATTRIBUTE_MAP => self.probe_attribute_map(config).await,
            other => ProbeReport::new(vec![ConfigurationMessage::failure(format!("Unknown probe id: {other}"))]),
        }
    }

    /// Runs the test method named `test_id`.
    pub async fn test(&self, test_id: &str, config: &DirectoryConnectionConfig) -> TestReport {
        tracing::debug!(test = test_id, "Running test");
        self.tests.run(test_id, &self.authenticator, config).await
    }

    /// Creates or deletes persisted records.
    pub async fn persist(&self, config: &DirectoryConnectionConfig, persist_id: &str) -> TestReport {
        match persist_id {
            persist_ids::CREATE => {
                let configurator = match persist::plan_create(config, &self.home_dir) {
                    Ok(configurator) => configurator,
                    Err(messages) => return TestReport::new(messages),
                };
                if configurator.commit(self.store.as_ref()).await.is_success() {
                    tracing::info!("Saved LDAP settings");
                    TestReport::single(ConfigurationMessage::success("Successfully saved LDAP settings"))
                } else {
                    TestReport::single(ConfigurationMessage::failure("Unable to persist changes"))
                }
            }
            persist_ids::DELETE => {
                let configurator = match persist::plan_delete(config) {
                    Ok(configurator) => configurator,
                    Err(messages) => return TestReport::new(messages),
                };
                if configurator.commit(self.store.as_ref()).await.is_success() {
                    tracing::info!(pid = config.service_pid.as_deref(), "Deleted LDAP configuration");
                    TestReport::single(ConfigurationMessage::success("Successfully deleted LDAP Configuration"))
                } else {
                    TestReport::single(
                        ConfigurationMessage::failure("Unable to delete LDAP Configuration")
                            .config_id(fields::SERVICE_PID),
                    )
                }
            }
            other => TestReport::single(ConfigurationMessage::failure(format!("Unknown persist id: {other}"))),
        }
    }

    /// Lists existing login configurations.
    ///
    /// Records that cannot be read back are skipped.
    pub async fn configurations(&self) -> AdminResult<Vec<DirectoryConnectionConfig>> {
        let records = self.store.managed_service_configs(LOGIN_FACTORY_PID).await?;
        Ok(records
            .iter()
            .filter_map(|(pid, record)| match DirectoryConnectionConfig::from_login_record(pid, record) {
                Ok(config) => Some(config),
                Err(e) => {
                    tracing::warn!(pid = %pid, error = %e, "Skipping unreadable login record");
                    None
                }
            })
            .collect())
    }

    async fn probe_connection(&self, config: &DirectoryConnectionConfig) -> ProbeReport {
        let missing = validation::validate(config, CONNECTION_FIELDS);
        let Some(endpoint) = config.endpoint().filter(|_| missing.is_empty()) else {
            return ProbeReport::new(missing);
        };

        let outcome = self.authenticator.establisher().connect(&endpoint).await;
        let kind = outcome.kind();
        let messages = match outcome {
            Outcome::SuccessfulConnection(session) | Outcome::SuccessfulBind(session) => {
                close_quietly(session).await;
                vec![ConfigurationMessage::success("Successfully connected to the directory server")]
            }
            _ => outcome_failure(kind).into_iter().collect(),
        };
        ProbeReport::new(messages).with_result(result_keys::CONNECTION_RESULT, kind.as_str())
    }

    async fn probe_query(&self, config: &DirectoryConnectionConfig) -> ProbeReport {
        let missing = validation::validate(config, LDAP_QUERY_FIELDS);
        if !missing.is_empty() {
            return ProbeReport::new(missing);
        }

        let mut session = match bound_session(&self.authenticator, config).await {
            Ok(session) => session,
            Err(message) => return ProbeReport::new(vec![message]),
        };

        let filter = search_filter(config.query.as_deref().unwrap_or_default());
        let base = config.query_base.as_deref().unwrap_or_default().trim();
        let result = query(session.as_mut(), &filter, base).await;
        close_quietly(session).await;

        match result {
            Ok(entries) => {
                let records: Vec<Value> = entries
                    .into_iter()
                    .map(|entry| {
                        Value::Object(
                            entry
                                .into_record()
                                .into_iter()
                                .map(|(key, value)| (key, Value::String(value)))
                                .collect::<Map<String, Value>>(),
                        )
                    })
                    .collect();
                ProbeReport::default().with_result(result_keys::LDAP_QUERY_RESULTS, records)
            }
            Err(e) => {
                tracing::warn!(base, filter = %filter, error = %e, "Query probe failed");
                ProbeReport::new(vec![
                    ConfigurationMessage::failure("Unable to run the query against the directory").config_id(fields::QUERY),
                ])
            }
        }
    }

    async fn probe_structure(&self, config: &DirectoryConnectionConfig) -> ProbeReport {
        let missing = validation::validate(config, BIND_FIELDS);
        if !missing.is_empty() {
            return ProbeReport::new(missing);
        }

        let mut session = match bound_session(&self.authenticator, config).await {
            Ok(session) => session,
            Err(message) => return ProbeReport::new(vec![message]),
        };
        let structure = guess_structure(config.ldap_type, session.as_mut()).await;
        close_quietly(session).await;

        ProbeReport::default()
            .with_result(result_keys::BASE_USER_DN, structure.base_user_dn)
            .with_result(result_keys::BASE_GROUP_DN, structure.base_group_dn)
            .with_result(result_keys::USER_NAME_ATTRIBUTE, structure.user_name_attribute)
            .with_result(result_keys::GROUP_OBJECT_CLASS, structure.group_object_class)
            .with_result(result_keys::MEMBERSHIP_ATTRIBUTE, structure.membership_attribute)
            .with_result(result_keys::QUERY, vec![DEFAULT_QUERY])
            .with_result(result_keys::QUERY_BASE, structure.base_contexts)
    }

    async fn probe_attribute_map(&self, config: &DirectoryConnectionConfig) -> ProbeReport {
        let claims = self.subject_claims().await;

        let mut missing = validation::validate(config, ATTRIBUTE_MAP_FIELDS);
        missing.extend(validation::attribute_fields(config, &[fields::MEMBERSHIP_ATTRIBUTE]));
        if !missing.is_empty() {
            return ProbeReport::new(missing).with_result(result_keys::SUBJECT_CLAIMS, claims);
        }

        let mut session = match bound_session(&self.authenticator, config).await {
            Ok(session) => session,
            Err(message) => return ProbeReport::new(vec![message]).with_result(result_keys::SUBJECT_CLAIMS, claims),
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

        let attributes: Vec<String> = match options {
            Ok(options) => options.into_iter().collect(),
            Err(e) => {
                tracing::warn!(
                    base = base_group_dn,
                    membership,
                    error = %e,
                    "Error retrieving attributes from the directory; check baseGroupDn and membershipAttribute"
                );
                Vec::new()
            }
        };

        ProbeReport::default()
            .with_result(result_keys::SUBJECT_CLAIMS, claims)
            .with_result(result_keys::LDAP_USER_ATTRIBUTES, attributes)
    }

    /// Reads the STS client claims; a comma-separated value is split.
    async fn subject_claims(&self) -> Value {
        let properties = match self.store.config(STS_CLIENT_CONFIG_PID).await {
            Ok(properties) => properties,
            Err(e) => {
                tracing::warn!(pid = STS_CLIENT_CONFIG_PID, error = %e, "Unable to read subject claims");
                return Value::Array(Vec::new());
            }
        };

        match properties.get("claims") {
            Some(Value::Array(claims)) => Value::Array(claims.clone()),
            Some(Value::String(claims)) => claims
                .split(',')
                .map(str::trim)
                .filter(|claim| !claim.is_empty())
                .map(|claim| Value::String(claim.to_string()))
                .collect(),
            _ => Value::Array(Vec::new()),
        }
    }
}

impl std::fmt::Debug for LdapConfigurationHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LdapConfigurationHandler")
            .field("authenticator", &self.authenticator)
            .field("home_dir", &self.home_dir)
            .field("tests", &self.tests)
            .finish_non_exhaustive()
    }
}

/// Wraps a bare filter item in parentheses.
fn search_filter(query: &str) -> String {
    let query = query.trim();
    if query.starts_with('(') {
        query.to_string()
    } else {
        format!("({query})")
    }
}
