//! Persistence staging.
//!
//! [`Configurator`] collects staged operations; nothing is written until
//! [`Configurator::commit`] hands the batch to the store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use dc_ldap::config::fields;
use dc_ldap::DirectoryConnectionConfig;
use serde_json::Value;
use uuid::Uuid;

use crate::report::ConfigurationMessage;
use crate::store::{ConfigReport, ConfigurationStore, Properties, StagedOperation};
use crate::validation;

/// Factory id of login records.
pub const LOGIN_FACTORY_PID: &str = "Ldap_Login_Config";
/// Factory id of claims-handler records.
pub const CLAIMS_HANDLER_FACTORY_PID: &str = "Claims_Handler_Manager";
/// Feature started for login.
pub const LOGIN_FEATURE: &str = "security-sts-ldaplogin";
/// Feature started for the credential store.
pub const CLAIMS_HANDLER_FEATURE: &str = "security-sts-ldapclaimshandler";

/// Fields a login record needs.
pub const LOGIN_FIELDS: &[&str] = &[
    fields::HOST_NAME,
    fields::PORT,
    fields::ENCRYPTION_METHOD,
    fields::BIND_USER_DN,
    fields::BIND_USER_PASSWORD,
    fields::BASE_USER_DN,
    fields::BASE_GROUP_DN,
    fields::USER_NAME_ATTRIBUTE,
];

/// Fields a claims-handler record needs.
pub const CREDENTIAL_STORE_FIELDS: &[&str] = &[
    fields::HOST_NAME,
    fields::PORT,
    fields::ENCRYPTION_METHOD,
    fields::BIND_USER_DN,
    fields::BIND_USER_PASSWORD,
    fields::BASE_USER_DN,
    fields::BASE_GROUP_DN,
    fields::USER_NAME_ATTRIBUTE,
    fields::GROUP_OBJECT_CLASS,
    fields::MEMBERSHIP_ATTRIBUTE,
    fields::ATTRIBUTE_MAPPINGS,
];

/// Stages configuration writes for one commit.
#[derive(Debug, Default)]
pub struct Configurator {
    operations: Vec<StagedOperation>,
}

impl Configurator {
    /// Creates an empty configurator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a feature start.
    pub fn start_feature(&mut self, name: &str) {
        self.operations.push(StagedOperation::StartFeature {
            name: name.to_string(),
        });
    }

    /// Stages a managed service record.
    pub fn create_managed_service(&mut self, factory_pid: &str, properties: Properties) {
        self.operations.push(StagedOperation::CreateManagedService {
            factory_pid: factory_pid.to_string(),
            properties,
        });
    }

    /// Stages removal of a managed service record.
    pub fn delete_managed_service(&mut self, pid: &str) {
        self.operations.push(StagedOperation::DeleteManagedService {
            pid: pid.to_string(),
        });
    }

    /// Stages a property file.
    pub fn create_property_file(&mut self, path: PathBuf, properties: BTreeMap<String, String>) {
        self.operations
            .push(StagedOperation::CreatePropertyFile { path, properties });
    }

    /// Returns the staged operations.
    #[must_use]
    pub fn staged(&self) -> &[StagedOperation] {
        &self.operations
    }

    /// Applies every staged operation as one batch.
    ///
    /// A store error is reported as a failed batch.
    pub async fn commit(self, store: &dyn ConfigurationStore) -> ConfigReport {
        match store.apply(&self.operations).await {
            Ok(report) => {
                if !report.is_success() {
                    tracing::warn!(failed = ?report.failed_results, "Configuration commit failed");
                }
                report
            }
            Err(e) => {
                tracing::warn!(error = %e, "Configuration store rejected batch");
                ConfigReport::failed(e.to_string())
            }
        }
    }
}

/// Stages everything `create` needs for the configured use case.
///
/// Returns messages instead when the use case is missing or fields the use
/// case needs are empty.
pub fn plan_create(
    config: &DirectoryConnectionConfig,
    home_dir: &Path,
) -> Result<Configurator, Vec<ConfigurationMessage>> {
    let Some(use_case) = config.ldap_use_case else {
        return Err(vec![ConfigurationMessage::failure("No ldap use case specified")
            .config_id(fields::LDAP_USE_CASE)]);
    };

    let required = if use_case.includes_credential_store() {
        CREDENTIAL_STORE_FIELDS
    } else {
        LOGIN_FIELDS
    };
    let missing = validation::validate(config, required);
    if !missing.is_empty() {
        return Err(missing);
    }

    let mut configurator = Configurator::new();
    if use_case.includes_login() {
        configurator.start_feature(LOGIN_FEATURE);
        configurator.create_managed_service(LOGIN_FACTORY_PID, login_record(config));
    }
    if use_case.includes_credential_store() {
        let path = attribute_map_path(home_dir);
        configurator.create_property_file(path.clone(), config.attribute_mappings.clone());
        configurator.start_feature(CLAIMS_HANDLER_FEATURE);
        configurator.create_managed_service(CLAIMS_HANDLER_FACTORY_PID, claims_handler_record(config, &path));
    }

    tracing::debug!(
        use_case = use_case.as_str(),
        operations = configurator.staged().len(),
        "Staged directory configuration"
    );
    Ok(configurator)
}

/// Stages removal of the record named by `servicePid`.
pub fn plan_delete(config: &DirectoryConnectionConfig) -> Result<Configurator, Vec<ConfigurationMessage>> {
    let missing = validation::required_fields(config, &[fields::SERVICE_PID]);
    match config.service_pid.as_deref() {
        Some(pid) if missing.is_empty() => {
            let mut configurator = Configurator::new();
            configurator.delete_managed_service(pid);
            Ok(configurator)
        }
        _ => Err(missing),
    }
}

/// Returns a fresh, uniquely named attribute-map path under `home_dir`.
#[must_use]
pub fn attribute_map_path(home_dir: &Path) -> PathBuf {
    home_dir
        .join("etc")
        .join("ws-security")
        .join(format!("ldapAttributeMap-{}.props", Uuid::now_v7()))
}

fn login_record(config: &DirectoryConnectionConfig) -> Properties {
    let mut record = Properties::new();
    put(&mut record, "ldapBindUserDn", &config.bind_user_dn);
    put(&mut record, "ldapBindUserPass", &config.bind_user_password);
    put(&mut record, "bindMethod", &config.bind_user_method);
    put(&mut record, "kdcAddress", &config.bind_kdc_address);
    put(&mut record, "realm", &config.bind_realm);
    put(&mut record, "userNameAttribute", &config.user_name_attribute);
    put(&mut record, "userBaseDn", &config.base_user_dn);
    put(&mut record, "groupBaseDn", &config.base_group_dn);
    put(&mut record, "ldapUrl", &config.ldap_url());
    record.insert("startTls".to_string(), Value::String(config.is_start_tls().to_string()));
    record
}

fn claims_handler_record(config: &DirectoryConnectionConfig, property_file: &Path) -> Properties {
    let mut record = Properties::new();
    put(&mut record, "url", &config.ldap_url());
    record.insert("startTls".to_string(), Value::Bool(config.is_start_tls()));
    put(&mut record, "ldapBindUserDn", &config.bind_user_dn);
    put(&mut record, "password", &config.bind_user_password);
    put(&mut record, "membershipUserAttribute", &config.user_name_attribute);
    put(&mut record, "loginUserAttribute", &config.user_name_attribute);
    put(&mut record, "userBaseDn", &config.base_user_dn);
    put(&mut record, "objectClass", &config.group_object_class);
    put(&mut record, "memberNameAttribute", &config.membership_attribute);
    put(&mut record, "groupBaseDn", &config.base_group_dn);
    put(&mut record, "bindMethod", &config.bind_user_method);
    record.insert(
        "propertyFileLocation".to_string(),
        Value::String(property_file.display().to_string()),
    );
    record
}

fn put(record: &mut Properties, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        record.insert(key.to_string(), Value::String(value.clone()));
    }
}

#[cfg(test)]
mod tests {
    use dc_ldap::{EncryptionMethod, UseCase};

    use super::*;
    use crate::report::MessageType;

    fn config(use_case: Option<UseCase>) -> DirectoryConnectionConfig {
        let mut config = DirectoryConnectionConfig::builder()
            .endpoint("dir.example.com", 389, EncryptionMethod::StartTls)
            .bind("Simple", "cn=admin,dc=example,dc=com", "secret")
            .bases("ou=people,dc=example,dc=com", "ou=groups,dc=example,dc=com")
            .user_name_attribute("uid")
            .groups("groupOfNames", "member")
            .mapping("http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress", "mail")
            .build();
        config.ldap_use_case = use_case;
        config
    }

    fn created_factories(configurator: &Configurator) -> Vec<&str> {
        configurator
            .staged()
            .iter()
            .filter_map(|op| match op {
                StagedOperation::CreateManagedService { factory_pid, .. } => Some(factory_pid.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn login_stages_one_record() {
        let configurator = plan_create(&config(Some(UseCase::Login)), Path::new("/opt/dc")).unwrap();

        assert_eq!(created_factories(&configurator), vec![LOGIN_FACTORY_PID]);
        match &configurator.staged()[1] {
            StagedOperation::CreateManagedService { properties, .. } => {
                assert_eq!(properties["ldapUrl"], "ldap://dir.example.com:389");
                assert_eq!(properties["startTls"], "true");
                assert_eq!(properties["ldapBindUserPass"], "secret");
            }
            other => panic!("unexpected operation {other:?}"),
        }
    }

    #[test]
    fn both_stages_two_records_and_one_property_file() {
        let configurator =
            plan_create(&config(Some(UseCase::LoginAndCredentialStore)), Path::new("/opt/dc")).unwrap();

        assert_eq!(
            created_factories(&configurator),
            vec![LOGIN_FACTORY_PID, CLAIMS_HANDLER_FACTORY_PID]
        );
        let files: Vec<_> = configurator
            .staged()
            .iter()
            .filter(|op| matches!(op, StagedOperation::CreatePropertyFile { .. }))
            .collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn claims_record_points_at_property_file() {
        let configurator =
            plan_create(&config(Some(UseCase::CredentialStore)), Path::new("/opt/dc")).unwrap();

        let file = configurator.staged().iter().find_map(|op| match op {
            StagedOperation::CreatePropertyFile { path, .. } => Some(path.display().to_string()),
            _ => None,
        });
        let location = configurator.staged().iter().find_map(|op| match op {
            StagedOperation::CreateManagedService { properties, .. } => properties
                .get("propertyFileLocation")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        });

        assert!(file.as_deref().is_some_and(|f| f.starts_with("/opt/dc/etc/ws-security/ldapAttributeMap-")));
        assert_eq!(file, location);
    }

    #[test]
    fn missing_use_case_fails() {
        let messages = plan_create(&config(None), Path::new("/opt/dc")).unwrap_err();

        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message_type, MessageType::Failure);
        assert_eq!(messages[0].message.as_deref(), Some("No ldap use case specified"));
    }

    #[test]
    fn credential_store_requires_mappings() {
        let mut config = config(Some(UseCase::CredentialStore));
        config.attribute_mappings.clear();

        let messages = plan_create(&config, Path::new("/opt/dc")).unwrap_err();
        assert_eq!(messages[0].config_id.as_deref(), Some(fields::ATTRIBUTE_MAPPINGS));
    }

    #[test]
    fn attribute_map_paths_are_unique() {
        let home = Path::new("/opt/dc");
        assert_ne!(attribute_map_path(home), attribute_map_path(home));
    }

    #[test]
    fn delete_requires_service_pid() {
        let messages = plan_delete(&config(None)).unwrap_err();
        assert_eq!(messages[0].message_type, MessageType::RequiredFields);

        let mut with_pid = config(None);
        with_pid.service_pid = Some("Ldap_Login_Config.7".to_string());
        let configurator = plan_delete(&with_pid).unwrap();
        assert_eq!(configurator.staged().len(), 1);
    }
}
