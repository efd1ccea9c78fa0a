//! Directory connection configuration.
//!
//! A [`DirectoryConnectionConfig`] is built fresh for every request from the
//! caller's key/value map. Every field is optional at the type level; each
//! operation checks the subset it needs before touching the network.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::bind::BindMethod;
use crate::error::{LdapError, LdapResult};

/// Wire names of the configuration fields, used as message field paths.
pub mod fields {
    /// Directory host name.
    pub const HOST_NAME: &str = "hostName";
    /// Directory port.
    pub const PORT: &str = "port";
    /// Encryption mode.
    pub const ENCRYPTION_METHOD: &str = "encryptionMethod";
    /// Bind method name.
    pub const BIND_USER_METHOD: &str = "bindUserMethod";
    /// Bind principal DN.
    pub const BIND_USER_DN: &str = "bindUserDn";
    /// Bind credential.
    pub const BIND_USER_PASSWORD: &str = "bindUserPassword";
    /// SASL realm.
    pub const BIND_REALM: &str = "bindRealm";
    /// Kerberos KDC address.
    pub const BIND_KDC_ADDRESS: &str = "bindKdcAddress";
    /// Declared server flavor.
    pub const LDAP_TYPE: &str = "ldapType";
    /// Search filter for the query probe.
    pub const QUERY: &str = "query";
    /// Search base for the query probe.
    pub const QUERY_BASE: &str = "queryBase";
    /// Base DN for users.
    pub const BASE_USER_DN: &str = "baseUserDn";
    /// Base DN for groups.
    pub const BASE_GROUP_DN: &str = "baseGroupDn";
    /// User naming attribute.
    pub const USER_NAME_ATTRIBUTE: &str = "userNameAttribute";
    /// Group membership attribute.
    pub const MEMBERSHIP_ATTRIBUTE: &str = "membershipAttribute";
    /// Group object class.
    pub const GROUP_OBJECT_CLASS: &str = "groupObjectClass";
    /// Declared use case.
    pub const LDAP_USE_CASE: &str = "ldapUseCase";
    /// Claim to attribute mappings.
    pub const ATTRIBUTE_MAPPINGS: &str = "attributeMappings";
    /// Persisted record identifier.
    pub const SERVICE_PID: &str = "servicePid";
}

// ============================================================================
// Encryption
// ============================================================================

/// How the transport to the directory is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EncryptionMethod {
    /// Plaintext `ldap://`.
    None,
    /// TLS from connection start (`ldaps://`).
    Tls,
    /// Plaintext connection upgraded with STARTTLS.
    StartTls,
}

impl EncryptionMethod {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Tls => "tls",
            Self::StartTls => "starttls",
        }
    }

    /// Returns the URL scheme for this mode.
    #[must_use]
    pub const fn scheme(&self) -> &'static str {
        match self {
            Self::Tls => "ldaps",
            Self::None | Self::StartTls => "ldap",
        }
    }

    /// Whether the session negotiates TLS at some point.
    #[must_use]
    pub const fn uses_tls(&self) -> bool {
        matches!(self, Self::Tls | Self::StartTls)
    }
}

impl TryFrom<String> for EncryptionMethod {
    type Error = LdapError;

    fn try_from(value: String) -> LdapResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "tls" | "ldaps" => Ok(Self::Tls),
            "starttls" => Ok(Self::StartTls),
            other => Err(LdapError::config(format!(
                "unknown encryption method '{other}' (expected none, tls or starttls)"
            ))),
        }
    }
}

impl From<EncryptionMethod> for String {
    fn from(value: EncryptionMethod) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for EncryptionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Server Flavor
// ============================================================================

/// Known directory server flavors.
///
/// Different vendors have different schemas and defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServerFlavor {
    /// Generic LDAP (RFC 4510 compliant).
    #[default]
    Generic,

    /// Microsoft Active Directory.
    ActiveDirectory,

    /// OpenLDAP.
    OpenLdap,

    /// The directory bundled with the host platform.
    Embedded,
}

impl ServerFlavor {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::ActiveDirectory => "activeDirectory",
            Self::OpenLdap => "openLdap",
            Self::Embedded => "embedded",
        }
    }

    /// Returns the default user naming attribute for this flavor.
    #[must_use]
    pub const fn user_name_attribute(&self) -> &'static str {
        match self {
            Self::ActiveDirectory => "sAMAccountName",
            _ => "uid",
        }
    }

    /// Returns the default group object class for this flavor.
    #[must_use]
    pub const fn group_object_class(&self) -> &'static str {
        match self {
            Self::ActiveDirectory => "group",
            _ => "groupOfNames",
        }
    }

    /// Returns the default group membership attribute for this flavor.
    #[must_use]
    pub const fn membership_attribute(&self) -> &'static str {
        "member"
    }

    /// Returns an example bind principal for this flavor.
    #[must_use]
    pub const fn bind_user_example(&self) -> &'static str {
        match self {
            Self::ActiveDirectory => "user@domain",
            _ => "cn=admin",
        }
    }
}

impl From<String> for ServerFlavor {
    fn from(value: String) -> Self {
        match value.trim() {
            "activeDirectory" => Self::ActiveDirectory,
            "openLdap" => Self::OpenLdap,
            "embedded" => Self::Embedded,
            _ => Self::Generic,
        }
    }
}

impl From<ServerFlavor> for String {
    fn from(value: ServerFlavor) -> Self {
        value.as_str().to_string()
    }
}

// ============================================================================
// Use Case
// ============================================================================

/// What the persisted directory integration is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum UseCase {
    /// Authentication only.
    Login,
    /// Attribute/claims lookup only.
    CredentialStore,
    /// Both.
    LoginAndCredentialStore,
}

impl UseCase {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::CredentialStore => "credentialStore",
            Self::LoginAndCredentialStore => "loginAndCredentialStore",
        }
    }

    /// Whether a login record is needed.
    #[must_use]
    pub const fn includes_login(&self) -> bool {
        matches!(self, Self::Login | Self::LoginAndCredentialStore)
    }

    /// Whether a claims-handler record is needed.
    #[must_use]
    pub const fn includes_credential_store(&self) -> bool {
        matches!(self, Self::CredentialStore | Self::LoginAndCredentialStore)
    }
}

impl TryFrom<String> for UseCase {
    type Error = LdapError;

    fn try_from(value: String) -> LdapResult<Self> {
        match value.trim() {
            "login" => Ok(Self::Login),
            "credentialStore" => Ok(Self::CredentialStore),
            "loginAndCredentialStore" | "both" => Ok(Self::LoginAndCredentialStore),
            other => Err(LdapError::config(format!("unknown ldap use case '{other}'"))),
        }
    }
}

impl From<UseCase> for String {
    fn from(value: UseCase) -> Self {
        value.as_str().to_string()
    }
}

// ============================================================================
// Search Scope
// ============================================================================

/// LDAP search scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchScope {
    /// Search only the base DN.
    Base,
    /// Search one level below the base DN.
    OneLevel,
    /// Search the entire subtree.
    #[default]
    Subtree,
}

impl SearchScope {
    /// Converts to ldap3 scope.
    #[must_use]
    pub fn to_ldap3(&self) -> ldap3::Scope {
        match self {
            Self::Base => ldap3::Scope::Base,
            Self::OneLevel => ldap3::Scope::OneLevel,
            Self::Subtree => ldap3::Scope::Subtree,
        }
    }
}

// ============================================================================
// Endpoint
// ============================================================================

/// Where to connect and how to secure the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Encryption mode.
    pub encryption: EncryptionMethod,
}

impl Endpoint {
    /// Creates an endpoint.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16, encryption: EncryptionMethod) -> Self {
        Self {
            host: host.into(),
            port,
            encryption,
        }
    }

    /// Returns the connection URL.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.encryption.scheme(), self.host, self.port)
    }
}

// ============================================================================
// Directory Connection Configuration
// ============================================================================

/// Everything an operator can supply about a directory integration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryConnectionConfig {
    // === Connection ===
    /// Directory host name.
    pub host_name: Option<String>,

    /// Directory port.
    #[serde(default, deserialize_with = "deserialize_port")]
    pub port: Option<u16>,

    /// Encryption mode.
    pub encryption_method: Option<EncryptionMethod>,

    // === Bind ===
    /// Bind method name (`Simple`, `SASL`, `GSSAPI SASL`, `Digest MD5 SASL`).
    pub bind_user_method: Option<String>,

    /// Bind principal DN.
    pub bind_user_dn: Option<String>,

    /// Bind credential (password).
    #[serde(default, skip_serializing)]
    pub bind_user_password: Option<String>,

    /// SASL realm.
    pub bind_realm: Option<String>,

    /// Kerberos KDC address.
    pub bind_kdc_address: Option<String>,

    // === Directory Structure ===
    /// Declared server flavor.
    #[serde(default)]
    pub ldap_type: ServerFlavor,

    /// Search filter for the query probe.
    pub query: Option<String>,

    /// Search base for the query probe.
    pub query_base: Option<String>,

    /// Base DN for user searches.
    pub base_user_dn: Option<String>,

    /// Base DN for group searches.
    pub base_group_dn: Option<String>,

    /// User naming attribute.
    pub user_name_attribute: Option<String>,

    /// Attribute on groups listing their members.
    pub membership_attribute: Option<String>,

    /// Object class of group entries.
    pub group_object_class: Option<String>,

    // === Persistence ===
    /// Declared use case.
    pub ldap_use_case: Option<UseCase>,

    /// Claim to LDAP attribute mappings.
    #[serde(default)]
    pub attribute_mappings: BTreeMap<String, String>,

    /// Identifier of an already-persisted record.
    pub service_pid: Option<String>,
}

impl DirectoryConnectionConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> DirectoryConnectionConfigBuilder {
        DirectoryConnectionConfigBuilder::default()
    }

    /// Parses a configuration from the caller's key/value map.
    pub fn from_properties(properties: serde_json::Map<String, Value>) -> LdapResult<Self> {
        serde_json::from_value(Value::Object(properties))
            .map_err(|e| LdapError::config(format!("invalid directory configuration: {e}")))
    }

    /// Rebuilds a configuration from a persisted login record.
    pub fn from_login_record(pid: &str, record: &BTreeMap<String, Value>) -> LdapResult<Self> {
        let text = |key: &str| record.get(key).and_then(value_text);

        let url = text("ldapUrl").ok_or_else(|| LdapError::config("login record has no ldapUrl"))?;
        let (scheme, authority) = url
            .split_once("://")
            .ok_or_else(|| LdapError::config(format!("malformed ldapUrl '{url}'")))?;
        let (host, port) = authority
            .rsplit_once(':')
            .ok_or_else(|| LdapError::config(format!("ldapUrl '{url}' has no port")))?;
        let port: u16 = port
            .trim_end_matches('/')
            .parse()
            .map_err(|_| LdapError::config(format!("ldapUrl '{url}' has an invalid port")))?;

        let start_tls = text("startTls").is_some_and(|v| v.eq_ignore_ascii_case("true"));
        let encryption = match (scheme.to_ascii_lowercase().as_str(), start_tls) {
            ("ldaps", _) => EncryptionMethod::Tls,
            (_, true) => EncryptionMethod::StartTls,
            _ => EncryptionMethod::None,
        };

        Ok(Self {
            host_name: Some(host.to_string()),
            port: Some(port),
            encryption_method: Some(encryption),
            bind_user_method: text("bindMethod"),
            bind_user_dn: text("ldapBindUserDn"),
            bind_user_password: text("ldapBindUserPass"),
            bind_realm: text("realm"),
            bind_kdc_address: text("kdcAddress"),
            base_user_dn: text("userBaseDn"),
            base_group_dn: text("groupBaseDn"),
            user_name_attribute: text("userNameAttribute"),
            ldap_use_case: Some(UseCase::Login),
            service_pid: Some(pid.to_string()),
            ..Self::default()
        })
    }

    /// Returns the endpoint if host, port and encryption are all present.
    #[must_use]
    pub fn endpoint(&self) -> Option<Endpoint> {
        let host = self.host_name.as_deref().filter(|h| !h.trim().is_empty())?;
        Some(Endpoint::new(host, self.port?, self.encryption_method?))
    }

    /// Returns the bind method, falling back to `Simple` for unknown names.
    #[must_use]
    pub fn bind_method(&self) -> BindMethod {
        self.bind_user_method
            .as_deref()
            .map_or(BindMethod::Simple, BindMethod::parse_lenient)
    }

    /// Returns the connection URL, if the endpoint is complete.
    #[must_use]
    pub fn ldap_url(&self) -> Option<String> {
        self.endpoint().map(|e| e.url())
    }

    /// Whether the connection upgrades with STARTTLS.
    #[must_use]
    pub fn is_start_tls(&self) -> bool {
        self.encryption_method == Some(EncryptionMethod::StartTls)
    }
}

/// Returns a property value as text; non-string scalars are rendered.
fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn deserialize_port<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PortValue {
        Number(u16),
        Text(String),
    }

    match Option::<PortValue>::deserialize(deserializer)? {
        None => Ok(None),
        Some(PortValue::Number(port)) => Ok(Some(port)),
        Some(PortValue::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(PortValue::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid port '{text}'"))),
    }
}

/// Escapes special characters in LDAP filter values.
#[must_use]
pub fn ldap_escape(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => result.push_str("\\5c"),
            '*' => result.push_str("\\2a"),
            '(' => result.push_str("\\28"),
            ')' => result.push_str("\\29"),
            '\0' => result.push_str("\\00"),
            _ => result.push(c),
        }
    }
    result
}

/// Whether `name` is an attribute description: a descriptor
/// (`[A-Za-z][A-Za-z0-9-]*`) or a numeric OID, optionally followed by
/// `;option` parts.
#[must_use]
pub fn is_attribute_description(name: &str) -> bool {
    let mut parts = name.split(';');
    let is_descriptor = |part: &str| {
        let mut chars = part.chars();
        chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
    };
    let is_oid = |part: &str| {
        part.split('.')
            .all(|arc| !arc.is_empty() && arc.bytes().all(|b| b.is_ascii_digit()))
    };
    match parts.next() {
        Some(attribute) if is_descriptor(attribute) || is_oid(attribute) => parts.all(is_descriptor),
        _ => false,
    }
}

/// Builds the `(attribute=*)` presence filter.
///
/// # Errors
///
/// Returns a configuration error when `attribute` is not a valid attribute
/// description.
pub fn presence_filter(attribute: &str) -> LdapResult<String> {
    if is_attribute_description(attribute) {
        Ok(format!("({attribute}=*)"))
    } else {
        Err(LdapError::config(format!("invalid attribute name '{attribute}'")))
    }
}

// ============================================================================
// Configuration Builder
// ============================================================================

/// Builder for directory connection configuration.
#[derive(Debug, Default)]
pub struct DirectoryConnectionConfigBuilder {
    config: DirectoryConnectionConfig,
}

impl DirectoryConnectionConfigBuilder {
    /// Sets host, port and encryption.
    #[must_use]
    pub fn endpoint(mut self, host: impl Into<String>, port: u16, encryption: EncryptionMethod) -> Self {
        self.config.host_name = Some(host.into());
        self.config.port = Some(port);
        self.config.encryption_method = Some(encryption);
        self
    }

    /// Sets the bind method and credentials.
    #[must_use]
    pub fn bind(
        mut self,
        method: impl Into<String>,
        dn: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.config.bind_user_method = Some(method.into());
        self.config.bind_user_dn = Some(dn.into());
        self.config.bind_user_password = Some(password.into());
        self
    }

    /// Sets the SASL realm.
    #[must_use]
    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.config.bind_realm = Some(realm.into());
        self
    }

    /// Sets the Kerberos KDC address.
    #[must_use]
    pub fn kdc_address(mut self, address: impl Into<String>) -> Self {
        self.config.bind_kdc_address = Some(address.into());
        self
    }

    /// Sets the declared server flavor.
    #[must_use]
    pub const fn flavor(mut self, flavor: ServerFlavor) -> Self {
        self.config.ldap_type = flavor;
        self
    }

    /// Sets the query probe filter and base.
    #[must_use]
    pub fn query(mut self, filter: impl Into<String>, base: impl Into<String>) -> Self {
        self.config.query = Some(filter.into());
        self.config.query_base = Some(base.into());
        self
    }

    /// Sets the user and group base DNs.
    #[must_use]
    pub fn bases(mut self, users: impl Into<String>, groups: impl Into<String>) -> Self {
        self.config.base_user_dn = Some(users.into());
        self.config.base_group_dn = Some(groups.into());
        self
    }

    /// Sets the user naming attribute.
    #[must_use]
    pub fn user_name_attribute(mut self, attr: impl Into<String>) -> Self {
        self.config.user_name_attribute = Some(attr.into());
        self
    }

    /// Sets the group object class and membership attribute.
    #[must_use]
    pub fn groups(mut self, object_class: impl Into<String>, membership: impl Into<String>) -> Self {
        self.config.group_object_class = Some(object_class.into());
        self.config.membership_attribute = Some(membership.into());
        self
    }

    /// Sets the use case.
    #[must_use]
    pub const fn use_case(mut self, use_case: UseCase) -> Self {
        self.config.ldap_use_case = Some(use_case);
        self
    }

    /// Adds a claim to attribute mapping.
    #[must_use]
    pub fn mapping(mut self, claim: impl Into<String>, attribute: impl Into<String>) -> Self {
        self.config.attribute_mappings.insert(claim.into(), attribute.into());
        self
    }

    /// Sets the persisted record identifier.
    #[must_use]
    pub fn service_pid(mut self, pid: impl Into<String>) -> Self {
        self.config.service_pid = Some(pid.into());
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> DirectoryConnectionConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn props(value: Value) -> serde_json::Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test input is an object"),
        }
    }

    #[test]
    fn parses_caller_map() {
        let config = DirectoryConnectionConfig::from_properties(props(json!({
            "hostName": "ldap.example.com",
            "port": "636",
            "encryptionMethod": "ldaps",
            "bindUserMethod": "Simple",
            "bindUserDn": "cn=admin,dc=example,dc=com",
            "bindUserPassword": "secret",
            "ldapType": "openLdap",
            "ldapUseCase": "both",
            "attributeMappings": { "email": "mail" }
        })))
        .unwrap();

        assert_eq!(config.port, Some(636));
        assert_eq!(config.encryption_method, Some(EncryptionMethod::Tls));
        assert_eq!(config.ldap_type, ServerFlavor::OpenLdap);
        assert_eq!(config.ldap_use_case, Some(UseCase::LoginAndCredentialStore));
        assert_eq!(config.attribute_mappings.get("email").map(String::as_str), Some("mail"));
        assert_eq!(config.ldap_url().as_deref(), Some("ldaps://ldap.example.com:636"));
    }

    #[test]
    fn unknown_flavor_is_generic() {
        let config =
            DirectoryConnectionConfig::from_properties(props(json!({ "ldapType": "novell" }))).unwrap();
        assert_eq!(config.ldap_type, ServerFlavor::Generic);
    }

    #[test]
    fn rejects_unknown_encryption() {
        let result =
            DirectoryConnectionConfig::from_properties(props(json!({ "encryptionMethod": "ssl3" })));
        assert!(matches!(result, Err(LdapError::Configuration(_))));
    }

    #[test]
    fn password_is_not_serialized() {
        let config = DirectoryConnectionConfig::builder()
            .bind("Simple", "cn=admin", "secret")
            .build();

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("cn=admin"));
    }

    #[test]
    fn endpoint_requires_all_parts() {
        let mut config = DirectoryConnectionConfig::builder()
            .endpoint("ldap.example.com", 389, EncryptionMethod::StartTls)
            .build();
        assert!(config.endpoint().is_some());
        assert!(config.is_start_tls());
        assert_eq!(config.ldap_url().as_deref(), Some("ldap://ldap.example.com:389"));

        config.port = None;
        assert!(config.endpoint().is_none());
    }

    #[test]
    fn missing_bind_method_is_simple() {
        let config = DirectoryConnectionConfig::default();
        assert_eq!(config.bind_method(), BindMethod::Simple);
    }

    #[test]
    fn rebuilds_from_login_record() {
        let mut record = BTreeMap::new();
        record.insert("ldapUrl".to_string(), json!("ldap://dir.example.com:389"));
        record.insert("startTls".to_string(), json!("true"));
        record.insert("ldapBindUserDn".to_string(), json!("cn=admin"));
        record.insert("bindMethod".to_string(), json!("Digest MD5 SASL"));
        record.insert("userBaseDn".to_string(), json!("ou=users,dc=example,dc=com"));

        let config = DirectoryConnectionConfig::from_login_record("Ldap_Login_Config.1", &record).unwrap();

        assert_eq!(config.host_name.as_deref(), Some("dir.example.com"));
        assert_eq!(config.port, Some(389));
        assert_eq!(config.encryption_method, Some(EncryptionMethod::StartTls));
        assert_eq!(config.bind_method(), BindMethod::DigestMd5Sasl);
        assert_eq!(config.service_pid.as_deref(), Some("Ldap_Login_Config.1"));
    }

    #[test]
    fn login_record_without_url_is_rejected() {
        let record = BTreeMap::new();
        assert!(DirectoryConnectionConfig::from_login_record("pid", &record).is_err());
    }

    #[test]
    fn ldap_escape_special_chars() {
        assert_eq!(ldap_escape("john*"), "john\\2a");
        assert_eq!(ldap_escape("(admin)"), "\\28admin\\29");
        assert_eq!(ldap_escape("user\\name"), "user\\5cname");
        assert_eq!(ldap_escape("normal"), "normal");
    }

    #[test]
    fn attribute_descriptions() {
        assert!(is_attribute_description("uid"));
        assert!(is_attribute_description("sAMAccountName"));
        assert!(is_attribute_description("x-custom-attr"));
        assert!(is_attribute_description("2.5.4.3"));
        assert!(is_attribute_description("cn;lang-en"));
        assert!(!is_attribute_description(""));
        assert!(!is_attribute_description("uid)(cn"));
        assert!(!is_attribute_description("mem*"));
        assert!(!is_attribute_description("1uid"));
        assert!(!is_attribute_description("2.5..3"));
    }

    #[test]
    fn presence_filter_rejects_filter_syntax() {
        assert_eq!(presence_filter("member").unwrap(), "(member=*)");
        assert!(matches!(presence_filter("member)(uid=*"), Err(LdapError::Configuration(_))));
    }

    #[test]
    fn flavor_defaults() {
        assert_eq!(ServerFlavor::ActiveDirectory.user_name_attribute(), "sAMAccountName");
        assert_eq!(ServerFlavor::OpenLdap.user_name_attribute(), "uid");
        assert_eq!(ServerFlavor::ActiveDirectory.group_object_class(), "group");
        assert_eq!(ServerFlavor::Embedded.group_object_class(), "groupOfNames");
        assert_eq!(ServerFlavor::Generic.bind_user_example(), "cn=admin");
    }
}
