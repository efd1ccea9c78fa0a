//! Probe flows.

use dc_admin::handler::{probe_ids, result_keys, STS_CLIENT_CONFIG_PID};
use dc_admin::MessageType;
use dc_ldap::LdapError;
use serde_json::json;

use crate::common::{bindable, complete, TestEnv, ALICE, CONTEXT, GROUPS, PEOPLE};

#[tokio::test]
async fn structure_probe_finds_containers() {
    let env = TestEnv::new();

    let report = env.handler.probe(probe_ids::DIRECTORY_STRUCTURE, &bindable()).await;

    assert!(report.is_success());
    assert_eq!(report.result(result_keys::BASE_USER_DN), Some(&json!([PEOPLE])));
    assert_eq!(report.result(result_keys::BASE_GROUP_DN), Some(&json!([GROUPS])));
    assert_eq!(report.result(result_keys::QUERY_BASE), Some(&json!([CONTEXT])));
    assert_eq!(report.result(result_keys::GROUP_OBJECT_CLASS), Some(&json!("groupOfNames")));
    assert_eq!(report.result(result_keys::MEMBERSHIP_ATTRIBUTE), Some(&json!("member")));

    let stats = env.directory.stats();
    assert_eq!(stats.connects, 1);
    assert_eq!(stats.closes, 1);
    assert_eq!(stats.searches_opened, stats.searches_released);
}

#[tokio::test]
async fn structure_probe_is_repeatable() {
    let env = TestEnv::new();

    let first = env.handler.probe(probe_ids::DIRECTORY_STRUCTURE, &bindable()).await;
    let second = env.handler.probe(probe_ids::DIRECTORY_STRUCTURE, &bindable()).await;

    assert_eq!(first, second);
    assert_eq!(env.directory.stats().connects, 2);
}

#[tokio::test]
async fn query_probe_keeps_entries_read_before_fault() {
    let env = TestEnv::new();
    env.directory.fail_search_after(PEOPLE, "(objectClass=person)", 1, LdapError::connection("connection reset"));
    let mut config = bindable();
    config.query = Some("objectClass=person".to_string());
    config.query_base = Some(PEOPLE.to_string());

    let report = env.handler.probe(probe_ids::LDAP_QUERY, &config).await;

    let results = report.result(result_keys::LDAP_QUERY_RESULTS).and_then(|v| v.as_array()).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["name"], json!(ALICE));
    assert_eq!(results[0]["mail"], json!("alice@example.com"));
    assert_eq!(env.directory.stats().closes, 1);
}

#[tokio::test]
async fn query_probe_without_base_never_connects() {
    let env = TestEnv::new();
    let mut config = bindable();
    config.query = Some("objectClass=person".to_string());

    let report = env.handler.probe(probe_ids::LDAP_QUERY, &config).await;

    assert_eq!(report.messages.len(), 1);
    assert_eq!(report.messages[0].message_type, MessageType::RequiredFields);
    assert_eq!(env.directory.stats().connects, 0);
}

#[tokio::test]
async fn malformed_cipher_suites_cannot_configure_before_connecting() {
    let env = TestEnv::with_engine(|engine| {
        engine.tls.cipher_suites = Some(vec!["not a suite!".to_string()]);
    });

    let report = env.handler.probe(probe_ids::CONNECTION, &bindable()).await;

    assert_eq!(report.result(result_keys::CONNECTION_RESULT), Some(&json!("cannotConfigure")));
    assert_eq!(report.messages.len(), 1);
    assert_eq!(report.messages[0].config_id.as_deref(), Some("encryptionMethod"));
    assert_eq!(env.directory.stats().connects, 0);
}

#[tokio::test]
async fn rejected_bind_aborts_probe() {
    let env = TestEnv::new();
    env.directory.fail_bind(LdapError::bind("invalid credentials"));

    let report = env.handler.probe(probe_ids::DIRECTORY_STRUCTURE, &bindable()).await;

    assert_eq!(report.messages.len(), 1);
    assert_eq!(report.messages[0].config_id.as_deref(), Some("bindUserDn"));
    assert!(report.probe_results.is_empty());
    assert_eq!(env.directory.stats().closes, 1);
}

#[tokio::test]
async fn attribute_map_probe_combines_claims_and_member_attributes() {
    let env = TestEnv::new();
    let mut sts = dc_admin::Properties::new();
    sts.insert(
        "claims".to_string(),
        json!(["http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress"]),
    );
    env.store.put_config(STS_CLIENT_CONFIG_PID, &sts).await.unwrap();

    let report = env
        .handler
        .probe(probe_ids::SUBJECT_ATTRIBUTE_MAP, &complete(dc_ldap::UseCase::CredentialStore))
        .await;

    assert_eq!(
        report.result(result_keys::SUBJECT_CLAIMS),
        Some(&json!(["http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress"]))
    );
    let attributes = report.result(result_keys::LDAP_USER_ATTRIBUTES).and_then(|v| v.as_array()).unwrap();
    assert!(attributes.contains(&json!("employeeNumber")));
    assert!(attributes.contains(&json!("mail")));
}
