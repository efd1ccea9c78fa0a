//! Persist flows against the file store.

use dc_admin::handler::persist_ids;
use dc_admin::persist::{CLAIMS_HANDLER_FACTORY_PID, CLAIMS_HANDLER_FEATURE, LOGIN_FACTORY_PID, LOGIN_FEATURE};
use dc_admin::{ConfigurationMessage, ConfigurationStore, MessageType};
use dc_ldap::UseCase;

use crate::common::{complete, TestEnv, PEOPLE};

fn attribute_maps(env: &TestEnv) -> Vec<std::path::PathBuf> {
    let dir = env.home.join("etc").join("ws-security");
    match std::fs::read_dir(dir) {
        Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
        Err(_) => Vec::new(),
    }
}

#[tokio::test]
async fn create_both_then_list_then_delete() {
    let env = TestEnv::new();

    let report = env
        .handler
        .persist(&complete(UseCase::LoginAndCredentialStore), persist_ids::CREATE)
        .await;
    assert_eq!(report.messages, vec![ConfigurationMessage::success("Successfully saved LDAP settings")]);

    let features = env.store.features().await.unwrap();
    assert!(features.contains(LOGIN_FEATURE));
    assert!(features.contains(CLAIMS_HANDLER_FEATURE));

    let claims = env.store.managed_service_configs(CLAIMS_HANDLER_FACTORY_PID).await.unwrap();
    assert_eq!(claims.len(), 1);
    let record = claims.values().next().unwrap();
    assert_eq!(record["url"], serde_json::json!("ldap://ldap.example.com:389"));
    assert_eq!(record["startTls"], serde_json::json!(true));

    let maps = attribute_maps(&env);
    assert_eq!(maps.len(), 1);
    let name = maps[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("ldapAttributeMap-") && name.ends_with(".props"));
    assert_eq!(record["propertyFileLocation"], serde_json::json!(maps[0].display().to_string()));
    let contents = std::fs::read_to_string(&maps[0]).unwrap();
    assert!(contents.contains("employeeId=employeeNumber\n"));

    let configs = env.handler.configurations().await.unwrap();
    assert_eq!(configs.len(), 1);
    assert_eq!(configs[0].base_user_dn.as_deref(), Some(PEOPLE));

    let report = env.handler.persist(&configs[0], persist_ids::DELETE).await;
    assert_eq!(report.messages, vec![ConfigurationMessage::success("Successfully deleted LDAP Configuration")]);
    assert!(env.handler.configurations().await.unwrap().is_empty());
    assert_eq!(env.store.managed_service_configs(LOGIN_FACTORY_PID).await.unwrap().len(), 0);
}

#[tokio::test]
async fn each_create_writes_a_new_attribute_map() {
    let env = TestEnv::new();
    let config = complete(UseCase::CredentialStore);

    env.handler.persist(&config, persist_ids::CREATE).await;
    env.handler.persist(&config, persist_ids::CREATE).await;

    assert_eq!(attribute_maps(&env).len(), 2);
    assert!(env.handler.configurations().await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_unknown_record_changes_nothing() {
    let env = TestEnv::new();
    env.handler.persist(&complete(UseCase::Login), persist_ids::CREATE).await;
    let mut config = complete(UseCase::Login);
    config.service_pid = Some("Ldap_Login_Config.missing".to_string());

    let report = env.handler.persist(&config, persist_ids::DELETE).await;

    assert_eq!(report.messages.len(), 1);
    assert_eq!(report.messages[0].message_type, MessageType::Failure);
    assert!(!report.messages.iter().any(|m| m.message_type == MessageType::Success));
    assert_eq!(env.handler.configurations().await.unwrap().len(), 1);
}

#[tokio::test]
async fn incomplete_credential_store_is_rejected_per_field() {
    let env = TestEnv::new();
    let mut config = complete(UseCase::CredentialStore);
    config.attribute_mappings.clear();
    config.membership_attribute = None;

    let report = env.handler.persist(&config, persist_ids::CREATE).await;

    let fields: Vec<_> = report.messages.iter().filter_map(|m| m.config_id.as_deref()).collect();
    assert_eq!(fields, vec!["membershipAttribute", "attributeMappings"]);
    assert!(attribute_maps(&env).is_empty());
    assert!(env.store.features().await.unwrap().is_empty());
}
