//! Required-field validation.
//!
//! Runs before any network call. Each missing or empty field yields one
//! `REQUIRED_FIELDS` message tagged with the field name. Attribute names that
//! end up in search filters yield `INVALID_FIELD` when malformed.

use dc_ldap::config::{fields, is_attribute_description};
use dc_ldap::DirectoryConnectionConfig;

use crate::report::{ConfigurationMessage, MessageType};

/// Fields needed to open a connection.
pub const CONNECTION_FIELDS: &[&str] = &[fields::HOST_NAME, fields::PORT, fields::ENCRYPTION_METHOD];

/// Fields needed to connect and bind.
pub const BIND_FIELDS: &[&str] = &[
    fields::HOST_NAME,
    fields::PORT,
    fields::ENCRYPTION_METHOD,
    fields::BIND_USER_DN,
    fields::BIND_USER_PASSWORD,
];

/// Whether `field` holds a non-empty value.
///
/// Unknown field names are never present.
#[must_use]
pub fn is_present(config: &DirectoryConnectionConfig, field: &str) -> bool {
    let text = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());

    match field {
        fields::HOST_NAME => text(&config.host_name),
        fields::PORT => config.port.is_some(),
        fields::ENCRYPTION_METHOD => config.encryption_method.is_some(),
        fields::BIND_USER_METHOD => text(&config.bind_user_method),
        fields::BIND_USER_DN => text(&config.bind_user_dn),
        fields::BIND_USER_PASSWORD => text(&config.bind_user_password),
        fields::BIND_REALM => text(&config.bind_realm),
        fields::BIND_KDC_ADDRESS => text(&config.bind_kdc_address),
        fields::LDAP_TYPE => true,
        fields::QUERY => text(&config.query),
        fields::QUERY_BASE => text(&config.query_base),
        fields::BASE_USER_DN => text(&config.base_user_dn),
        fields::BASE_GROUP_DN => text(&config.base_group_dn),
        fields::USER_NAME_ATTRIBUTE => text(&config.user_name_attribute),
        fields::MEMBERSHIP_ATTRIBUTE => text(&config.membership_attribute),
        fields::GROUP_OBJECT_CLASS => text(&config.group_object_class),
        fields::LDAP_USE_CASE => config.ldap_use_case.is_some(),
        fields::ATTRIBUTE_MAPPINGS => !config.attribute_mappings.is_empty(),
        fields::SERVICE_PID => text(&config.service_pid),
        _ => false,
    }
}

/// Returns one message per missing field, in the order given.
#[must_use]
pub fn required_fields(config: &DirectoryConnectionConfig, required: &[&str]) -> Vec<ConfigurationMessage> {
    required
        .iter()
        .filter(|field| !is_present(config, field))
        .map(|field| ConfigurationMessage::required_field(field))
        .collect()
}

/// Fields that only the chosen bind method requires.
///
/// GSSAPI needs both a KDC address and a realm.
#[must_use]
pub fn conditional_bind_fields(config: &DirectoryConnectionConfig) -> Vec<ConfigurationMessage> {
    if !config.bind_method().requires_kerberos() {
        return Vec::new();
    }

    [fields::BIND_KDC_ADDRESS, fields::BIND_REALM]
        .into_iter()
        .filter(|field| !is_present(config, field))
        .map(|field| {
            ConfigurationMessage::build(
                MessageType::RequiredFields,
                "Field cannot be empty for GSSAPI SASL bind type",
            )
            .config_id(field)
        })
        .collect()
}

/// Returns one `INVALID_FIELD` message per attribute-name field among
/// `checked` whose value is not an attribute description.
///
/// Empty fields are left to [`required_fields`].
#[must_use]
pub fn attribute_fields(config: &DirectoryConnectionConfig, checked: &[&str]) -> Vec<ConfigurationMessage> {
    checked
        .iter()
        .filter_map(|field| {
            let value = match *field {
                fields::USER_NAME_ATTRIBUTE => config.user_name_attribute.as_deref(),
                fields::MEMBERSHIP_ATTRIBUTE => config.membership_attribute.as_deref(),
                _ => None,
            }?
            .trim();
            (!value.is_empty() && !is_attribute_description(value)).then(|| {
                ConfigurationMessage::build(MessageType::InvalidField, format!("'{value}' is not a valid attribute name"))
                    .config_id(*field)
            })
        })
        .collect()
}

/// Validates `required`, adding the bind-method fields when a bind is needed.
#[must_use]
pub fn validate(config: &DirectoryConnectionConfig, required: &[&str]) -> Vec<ConfigurationMessage> {
    let mut messages = required_fields(config, required);
    if required.contains(&fields::BIND_USER_DN) {
        messages.extend(conditional_bind_fields(config));
    }
    messages
}
