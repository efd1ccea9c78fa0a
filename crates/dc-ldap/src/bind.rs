//! Bind strategy selection.
//!
//! Maps an operator-facing bind method name onto a concrete [`BindRequest`].
//! Pure construction, no I/O.
//!
//! Unknown method names resolve to a simple bind. Existing configurations
//! rely on that, so it stays.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Bind methods an operator can choose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BindMethod {
    /// Simple DN + password bind.
    #[default]
    Simple,
    /// SASL PLAIN.
    Sasl,
    /// SASL GSSAPI (Kerberos).
    GssapiSasl,
    /// SASL DIGEST-MD5.
    DigestMd5Sasl,
}

impl BindMethod {
    /// All methods, in the order they are offered.
    pub const ALL: [Self; 4] = [Self::Simple, Self::Sasl, Self::GssapiSasl, Self::DigestMd5Sasl];

    /// Returns the operator-facing name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "Simple",
            Self::Sasl => "SASL",
            Self::GssapiSasl => "GSSAPI SASL",
            Self::DigestMd5Sasl => "Digest MD5 SASL",
        }
    }

    /// Returns the wire mechanism this method binds with.
    #[must_use]
    pub const fn mechanism(&self) -> &'static str {
        match self {
            Self::Simple => "SIMPLE",
            Self::Sasl => "PLAIN",
            Self::GssapiSasl => "GSSAPI",
            Self::DigestMd5Sasl => "DIGEST-MD5",
        }
    }

    /// Parses an operator-facing name. Unknown names yield [`BindMethod::Simple`].
    #[must_use]
    pub fn parse_lenient(name: &str) -> Self {
        match name {
            "Simple" => Self::Simple,
            "SASL" => Self::Sasl,
            "GSSAPI SASL" => Self::GssapiSasl,
            "Digest MD5 SASL" => Self::DigestMd5Sasl,
            other => {
                tracing::debug!(method = other, "Unrecognized bind method, using simple bind");
                Self::Simple
            }
        }
    }

    /// Whether this method needs a realm and KDC address.
    #[must_use]
    pub const fn requires_kerberos(&self) -> bool {
        matches!(self, Self::GssapiSasl)
    }
}

impl fmt::Display for BindMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// DIGEST-MD5 cipher strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestCipher {
    /// Strongest supported cipher.
    High,
}

/// SASL quality-of-protection levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qop {
    /// `auth-conf`
    Confidentiality,
    /// `auth-int`
    Integrity,
    /// `auth`
    Authentication,
}

impl Qop {
    /// Returns the SASL token.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Confidentiality => "auth-conf",
            Self::Integrity => "auth-int",
            Self::Authentication => "auth",
        }
    }
}

/// A bind request ready to send.
#[derive(Clone, PartialEq, Eq)]
pub enum BindRequest {
    /// Simple bind.
    Simple {
        /// Bind DN.
        dn: String,
        /// Password.
        password: String,
    },
    /// SASL PLAIN.
    Plain {
        /// Authentication identity.
        authentication_id: String,
        /// Password.
        password: String,
    },
    /// SASL GSSAPI.
    Gssapi {
        /// Kerberos principal.
        principal: String,
        /// Password.
        password: String,
        /// Kerberos realm, when non-empty.
        realm: Option<String>,
        /// KDC address, when non-empty.
        kdc_address: Option<String>,
    },
    /// SASL DIGEST-MD5.
    DigestMd5 {
        /// Authentication identity.
        authentication_id: String,
        /// Password.
        password: String,
        /// Realm, when non-empty.
        realm: Option<String>,
        /// Cipher strength.
        cipher: DigestCipher,
        /// Quality-of-protection preference, strongest first.
        qops: Vec<Qop>,
    },
}

impl BindRequest {
    /// Returns the method that produced this request.
    #[must_use]
    pub const fn method(&self) -> BindMethod {
        match self {
            Self::Simple { .. } => BindMethod::Simple,
            Self::Plain { .. } => BindMethod::Sasl,
            Self::Gssapi { .. } => BindMethod::GssapiSasl,
            Self::DigestMd5 { .. } => BindMethod::DigestMd5Sasl,
        }
    }

    /// Returns the wire mechanism.
    #[must_use]
    pub const fn mechanism(&self) -> &'static str {
        self.method().mechanism()
    }

    /// Returns the realm attached to the request, if any.
    #[must_use]
    pub fn realm(&self) -> Option<&str> {
        match self {
            Self::Gssapi { realm, .. } | Self::DigestMd5 { realm, .. } => realm.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Debug for BindRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple { dn, .. } => f
                .debug_struct("Simple")
                .field("dn", dn)
                .field("password", &"[REDACTED]")
                .finish(),
            Self::Plain {
                authentication_id, ..
            } => f
                .debug_struct("Plain")
                .field("authentication_id", authentication_id)
                .field("password", &"[REDACTED]")
                .finish(),
            Self::Gssapi {
                principal,
                realm,
                kdc_address,
                ..
            } => f
                .debug_struct("Gssapi")
                .field("principal", principal)
                .field("password", &"[REDACTED]")
                .field("realm", realm)
                .field("kdc_address", kdc_address)
                .finish(),
            Self::DigestMd5 {
                authentication_id,
                realm,
                cipher,
                qops,
                ..
            } => f
                .debug_struct("DigestMd5")
                .field("authentication_id", authentication_id)
                .field("password", &"[REDACTED]")
                .field("realm", realm)
                .field("cipher", cipher)
                .field("qops", qops)
                .finish(),
        }
    }
}

/// Builds the bind request for `method`.
#[must_use]
pub fn select_bind_request(
    method: BindMethod,
    dn: &str,
    password: &str,
    realm: Option<&str>,
    kdc_address: Option<&str>,
) -> BindRequest {
    let non_empty = |v: Option<&str>| v.filter(|s| !s.is_empty()).map(str::to_string);

    match method {
        BindMethod::Simple => BindRequest::Simple {
            dn: dn.to_string(),
            password: password.to_string(),
        },
        BindMethod::Sasl => BindRequest::Plain {
            authentication_id: dn.to_string(),
            password: password.to_string(),
        },
        BindMethod::GssapiSasl => BindRequest::Gssapi {
            principal: dn.to_string(),
            password: password.to_string(),
            realm: non_empty(realm),
            kdc_address: non_empty(kdc_address),
        },
        BindMethod::DigestMd5Sasl => BindRequest::DigestMd5 {
            authentication_id: dn.to_string(),
            password: password.to_string(),
            realm: non_empty(realm),
            cipher: DigestCipher::High,
            qops: vec![Qop::Confidentiality, Qop::Integrity, Qop::Authentication],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mechanism_matches_method() {
        for method in BindMethod::ALL {
            let request = select_bind_request(method, "cn=admin", "secret", Some("EXAMPLE"), Some("kdc"));
            assert_eq!(request.method(), method);
            assert_eq!(request.mechanism(), method.mechanism());
        }
    }

    #[test]
    fn unknown_name_is_simple() {
        assert_eq!(BindMethod::parse_lenient("Kerberos v4"), BindMethod::Simple);
        assert_eq!(BindMethod::parse_lenient(""), BindMethod::Simple);

        let request = select_bind_request(BindMethod::parse_lenient("bogus"), "cn=a", "pw", None, None);
        assert!(matches!(request, BindRequest::Simple { .. }));
    }

    #[test]
    fn names_round_trip() {
        for method in BindMethod::ALL {
            assert_eq!(BindMethod::parse_lenient(method.as_str()), method);
        }
    }

    #[test]
    fn realm_attached_only_when_non_empty() {
        for method in [BindMethod::GssapiSasl, BindMethod::DigestMd5Sasl] {
            let with = select_bind_request(method, "u", "p", Some("EXAMPLE.COM"), Some("kdc.example.com"));
            assert_eq!(with.realm(), Some("EXAMPLE.COM"));

            let empty = select_bind_request(method, "u", "p", Some(""), Some(""));
            assert_eq!(empty.realm(), None);

            let missing = select_bind_request(method, "u", "p", None, None);
            assert_eq!(missing.realm(), None);
        }
    }

    #[test]
    fn gssapi_carries_kdc() {
        let request =
            select_bind_request(BindMethod::GssapiSasl, "u", "p", Some("EXAMPLE.COM"), Some("kdc:88"));
        match request {
            BindRequest::Gssapi { kdc_address, .. } => assert_eq!(kdc_address.as_deref(), Some("kdc:88")),
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn digest_md5_parameters() {
        let request = select_bind_request(BindMethod::DigestMd5Sasl, "u", "p", None, None);
        match request {
            BindRequest::DigestMd5 { cipher, qops, .. } => {
                assert_eq!(cipher, DigestCipher::High);
                assert_eq!(qops, vec![Qop::Confidentiality, Qop::Integrity, Qop::Authentication]);
            }
            other => panic!("unexpected request {other:?}"),
        }
    }

    #[test]
    fn debug_redacts_password() {
        for method in BindMethod::ALL {
            let request = select_bind_request(method, "cn=admin", "hunter2", None, None);
            let debug = format!("{request:?}");
            assert!(!debug.contains("hunter2"));
            assert!(debug.contains("REDACTED"));
        }
    }
}
