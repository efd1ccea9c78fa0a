//! Common test utilities and fixtures.

use std::path::PathBuf;
use std::sync::Arc;

use dc_admin::{FileStore, LdapConfigurationHandler};
use dc_core::EngineConfig;
use dc_ldap::guesser::{OpenLdapGuesser, ServerGuesser};
use dc_ldap::mock::MockDirectory;
use dc_ldap::{DirectoryConnectionConfig, EncryptionMethod, RawEntry, ServerFlavor, UseCase};
use tempfile::TempDir;

pub const CONTEXT: &str = "dc=example,dc=com";
pub const PEOPLE: &str = "ou=people,dc=example,dc=com";
pub const GROUPS: &str = "ou=groups,dc=example,dc=com";
pub const ALICE: &str = "uid=alice,ou=people,dc=example,dc=com";
pub const BOB: &str = "uid=bob,ou=people,dc=example,dc=com";

/// Mock directory, file store and handler wired together.
pub struct TestEnv {
    pub directory: MockDirectory,
    pub store: Arc<FileStore>,
    pub handler: LdapConfigurationHandler,
    pub home: PathBuf,
    _dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_engine(|_| {})
    }

    /// Builds the environment after adjusting the engine configuration.
    pub fn with_engine(adjust: impl FnOnce(&mut EngineConfig)) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("dc_ldap=debug,dc_admin=debug")
            .with_test_writer()
            .try_init();

        let dir = tempfile::tempdir().unwrap();
        let home = dir.path().join("home");
        let store = Arc::new(FileStore::new(dir.path().join("store")));

        let mut engine = EngineConfig::for_testing();
        engine.home_dir = home.clone();
        adjust(&mut engine);

        let directory = populated_directory();
        let handler =
            LdapConfigurationHandler::from_engine_config(&engine, Arc::new(directory.clone()), store.clone());

        Self {
            directory,
            store,
            handler,
            home,
            _dir: dir,
        }
    }
}

/// An OpenLDAP-shaped tree: one context, people and groups containers,
/// two users and one group.
pub fn populated_directory() -> MockDirectory {
    let directory = MockDirectory::new();
    directory.set_root_dse(&[CONTEXT], None);

    let guesser = OpenLdapGuesser;
    directory.add_search_entries(CONTEXT, guesser.user_base_filter(), vec![RawEntry::new(PEOPLE)]);
    directory.add_search_entries(CONTEXT, guesser.group_base_filter(), vec![RawEntry::new(GROUPS)]);

    directory.add_search_entries(PEOPLE, "(objectClass=*)", vec![RawEntry::new(PEOPLE)]);
    directory.add_search_entries(GROUPS, "(objectClass=*)", vec![RawEntry::new(GROUPS)]);

    let users = vec![user(ALICE, "alice"), user(BOB, "bob")];
    directory.add_search_entries(PEOPLE, "(uid=*)", users.clone());
    directory.add_search_entries(PEOPLE, "(objectClass=person)", users);

    let staff = RawEntry::new(format!("cn=staff,{GROUPS}"))
        .with("cn", "staff")
        .with("member", ALICE)
        .with("member", BOB);
    directory.add_search_entries(GROUPS, "(objectClass=groupOfNames)", vec![staff.clone()]);
    directory.add_search_entries(GROUPS, "(member=*)", vec![staff]);

    directory.add_search_entries(ALICE, "(objectClass=*)", vec![user(ALICE, "alice")]);
    directory
}

fn user(dn: &str, uid: &str) -> RawEntry {
    RawEntry::new(dn)
        .with("uid", uid)
        .with("cn", uid)
        .with("mail", format!("{uid}@example.com"))
        .with("employeeNumber", "42")
}

/// A configuration that can connect and bind.
pub fn bindable() -> DirectoryConnectionConfig {
    DirectoryConnectionConfig::builder()
        .endpoint("ldap.example.com", 389, EncryptionMethod::StartTls)
        .bind("Simple", "cn=admin,dc=example,dc=com", "secret")
        .flavor(ServerFlavor::OpenLdap)
        .build()
}

/// A configuration complete enough for every operation.
pub fn complete(use_case: UseCase) -> DirectoryConnectionConfig {
    DirectoryConnectionConfig::builder()
        .endpoint("ldap.example.com", 389, EncryptionMethod::StartTls)
        .bind("Simple", "cn=admin,dc=example,dc=com", "secret")
        .flavor(ServerFlavor::OpenLdap)
        .bases(PEOPLE, GROUPS)
        .user_name_attribute("uid")
        .groups("groupOfNames", "member")
        .mapping("http://schemas.xmlsoap.org/ws/2005/05/identity/claims/emailaddress", "mail")
        .mapping("employeeId", "employeeNumber")
        .use_case(use_case)
        .build()
}
