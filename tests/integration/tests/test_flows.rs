//! Test method flows.

use dc_admin::MessageType;
use dc_ldap::{BindMethod, LdapError, UseCase};

use crate::common::{complete, TestEnv};

#[tokio::test]
async fn every_test_passes_on_a_well_formed_directory() {
    let env = TestEnv::new();
    let config = complete(UseCase::LoginAndCredentialStore);

    for descriptor in env.handler.capabilities().test_methods {
        let report = env.handler.test(&descriptor.id, &config).await;
        assert!(report.is_success(), "{} failed: {:?}", descriptor.id, report.messages);
    }

    let stats = env.directory.stats();
    assert_eq!(stats.connects, 4);
    assert_eq!(stats.closes, 4);
    assert_eq!(stats.searches_opened, stats.searches_released);
}

#[tokio::test]
async fn unknown_bind_method_binds_simply() {
    let env = TestEnv::new();
    let mut config = complete(UseCase::Login);
    config.bind_user_method = Some("Carrier Pigeon".to_string());

    let report = env.handler.test("testLdapBind", &config).await;

    assert!(report.is_success());
    assert_eq!(env.directory.last_bind_method(), Some(BindMethod::Simple));
}

#[tokio::test]
async fn gssapi_fields_are_checked_before_connecting() {
    let env = TestEnv::new();
    let mut config = complete(UseCase::Login);
    config.bind_user_method = Some("GSSAPI SASL".to_string());
    config.bind_realm = Some("EXAMPLE.COM".to_string());

    let report = env.handler.test("testLdapBind", &config).await;

    assert_eq!(report.messages.len(), 1);
    assert_eq!(report.messages[0].config_id.as_deref(), Some("bindKdcAddress"));
    assert_eq!(env.directory.stats().connects, 0);
}

#[tokio::test]
async fn structure_test_points_at_wrong_base() {
    let env = TestEnv::new();
    let mut config = complete(UseCase::Login);
    config.base_group_dn = Some("ou=teams,dc=example,dc=com".to_string());

    let report = env.handler.test("testLdapDirStruct", &config).await;

    assert_eq!(report.messages.len(), 1);
    assert_eq!(report.messages[0].message_type, MessageType::Failure);
    assert_eq!(report.messages[0].config_id.as_deref(), Some("baseGroupDn"));
}

#[tokio::test]
async fn mapping_test_names_the_bad_claim() {
    let env = TestEnv::new();
    let mut config = complete(UseCase::CredentialStore);
    config.attribute_mappings.insert("phone".to_string(), "pager".to_string());

    let report = env.handler.test("testAttributeMapping", &config).await;

    assert_eq!(report.messages.len(), 1);
    assert_eq!(report.messages[0].config_id.as_deref(), Some("attributeMappings.phone"));
}

#[tokio::test]
async fn unreachable_directory_fails_every_network_test_on_host() {
    let env = TestEnv::new();
    env.directory.fail_connect(LdapError::connection("no route to host"));
    let config = complete(UseCase::LoginAndCredentialStore);

    for id in ["testLdapConnection", "testLdapBind", "testLdapDirStruct", "testAttributeMapping"] {
        let report = env.handler.test(id, &config).await;
        assert_eq!(report.messages.len(), 1, "{id}");
        assert_eq!(report.messages[0].config_id.as_deref(), Some("hostName"), "{id}");
    }
}

#[tokio::test]
async fn unknown_test_id() {
    let env = TestEnv::new();

    let report = env.handler.test("testEverything", &complete(UseCase::Login)).await;

    assert_eq!(report.messages.len(), 1);
    assert_eq!(report.messages[0].message_type, MessageType::NoTestFound);
}
