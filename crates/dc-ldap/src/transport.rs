//! Production transport over `ldap3`.
//!
//! | encryption | URL        | STARTTLS |
//! |------------|------------|----------|
//! | `none`     | `ldap://`  | no       |
//! | `tls`      | `ldaps://` | no       |
//! | `starttls` | `ldap://`  | yes      |
//!
//! `native-tls` cannot restrict cipher suites; a validated list is logged and
//! the platform defaults apply.

use std::time::Duration;

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, ResultEntry, SearchEntry, SearchStream};
use native_tls::{Certificate, Protocol, TlsConnector};

use crate::bind::BindRequest;
use crate::config::EncryptionMethod;
use crate::connection::{TlsPolicy, TlsVersion};
use crate::directory::{
    ConnectRequest, Connector, DirectorySession, RawEntry, SearchHandle, SearchItem, SearchRequest,
};
use crate::error::{LdapError, LdapResult};

/// Connector that opens real directory connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ldap3Connector;

impl Ldap3Connector {
    /// Creates a connector.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for Ldap3Connector {
    async fn connect(&self, request: ConnectRequest<'_>) -> LdapResult<Box<dyn DirectorySession>> {
        let endpoint = request.endpoint;
        let mut settings = LdapConnSettings::new().set_conn_timeout(request.connect_timeout);

        if endpoint.encryption.uses_tls() {
            let connector = build_tls_connector(request.tls).await?;
            settings = settings.set_connector(connector);
        }
        if endpoint.encryption == EncryptionMethod::StartTls {
            settings = settings.set_starttls(true);
        }

        let url = endpoint.url();
        let (conn, ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| LdapError::connection(e.to_string()))?;

        // Spawn connection driver
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                tracing::warn!("LDAP connection driver error: {}", e);
            }
        });

        Ok(Box::new(Ldap3Session {
            ldap,
            host: endpoint.host.clone(),
            operation_timeout: request.operation_timeout,
        }))
    }
}

async fn build_tls_connector(policy: &TlsPolicy) -> LdapResult<TlsConnector> {
    let mut builder = TlsConnector::builder();

    builder.min_protocol_version(policy.min_protocol.map(min_protocol));
    builder.max_protocol_version(policy.max_protocol.and_then(max_protocol));

    if let Some(suites) = &policy.cipher_suites {
        tracing::debug!(
            suites = suites.join(","),
            "Cipher suite restriction is not available, using platform defaults"
        );
    }

    if let Some(path) = &policy.trust_store_path {
        let pem = tokio::fs::read(path)
            .await
            .map_err(|e| LdapError::tls(format!("cannot read trust store {}: {e}", path.display())))?;
        let certificate = Certificate::from_pem(&pem)
            .map_err(|e| LdapError::tls(format!("invalid trust store {}: {e}", path.display())))?;
        builder.add_root_certificate(certificate);
    }

    if !policy.validate_certificates {
        builder.danger_accept_invalid_certs(true);
        builder.danger_accept_invalid_hostnames(true);
    }

    builder.build().map_err(|e| LdapError::tls(e.to_string()))
}

fn min_protocol(version: TlsVersion) -> Protocol {
    match version {
        TlsVersion::Tls10 => Protocol::Tlsv10,
        TlsVersion::Tls11 => Protocol::Tlsv11,
        TlsVersion::Tls12 | TlsVersion::Tls13 => Protocol::Tlsv12,
    }
}

fn max_protocol(version: TlsVersion) -> Option<Protocol> {
    match version {
        TlsVersion::Tls10 => Some(Protocol::Tlsv10),
        TlsVersion::Tls11 => Some(Protocol::Tlsv11),
        TlsVersion::Tls12 => Some(Protocol::Tlsv12),
        TlsVersion::Tls13 => None,
    }
}

struct Ldap3Session {
    ldap: Ldap,
    host: String,
    operation_timeout: Duration,
}

#[async_trait]
impl DirectorySession for Ldap3Session {
    async fn bind(&mut self, request: &BindRequest) -> LdapResult<()> {
        match request {
            BindRequest::Simple { dn, password } => {
                self.ldap
                    .with_timeout(self.operation_timeout)
                    .simple_bind(dn, password)
                    .await
                    .map_err(|e| LdapError::bind(e.to_string()))?
                    .success()
                    .map_err(|e| LdapError::bind(e.to_string()))?;
                Ok(())
            }
            BindRequest::Gssapi { .. } => self.gssapi_bind().await,
            BindRequest::Plain { .. } | BindRequest::DigestMd5 { .. } => {
                Err(LdapError::UnsupportedMechanism(request.mechanism()))
            }
        }
    }

    async fn search(&mut self, request: &SearchRequest) -> LdapResult<Box<dyn SearchHandle>> {
        let stream = self
            .ldap
            .with_timeout(self.operation_timeout)
            .streaming_search(
                &request.base,
                request.scope.to_ldap3(),
                &request.filter,
                request.attributes.clone(),
            )
            .await
            .map_err(|e| LdapError::search(e.to_string()))?;

        Ok(Box::new(Ldap3Search {
            stream,
            exhausted: false,
        }))
    }

    async fn close(&mut self) -> LdapResult<()> {
        self.ldap.unbind().await?;
        Ok(())
    }
}

impl Ldap3Session {
    #[cfg(feature = "gssapi")]
    async fn gssapi_bind(&mut self) -> LdapResult<()> {
        self.ldap
            .with_timeout(self.operation_timeout)
            .sasl_gssapi_bind(&self.host)
            .await
            .map_err(|e| LdapError::bind(e.to_string()))?
            .success()
            .map_err(|e| LdapError::bind(e.to_string()))?;
        Ok(())
    }

    #[cfg(not(feature = "gssapi"))]
    async fn gssapi_bind(&mut self) -> LdapResult<()> {
        tracing::debug!(host = %self.host, "GSSAPI support not compiled in");
        Err(LdapError::UnsupportedMechanism("GSSAPI"))
    }
}

struct Ldap3Search {
    stream: SearchStream<'static, String, Vec<String>>,
    exhausted: bool,
}

#[async_trait]
impl SearchHandle for Ldap3Search {
    async fn next(&mut self) -> LdapResult<Option<SearchItem>> {
        let entry: Option<ResultEntry> = self
            .stream
            .next()
            .await
            .map_err(|e| LdapError::Stream(e.to_string()))?;

        match entry {
            None => {
                self.exhausted = true;
                Ok(None)
            }
            Some(entry) if entry.is_ref() => Ok(Some(SearchItem::Reference(ldap3::parse_refs(entry.0)))),
            Some(entry) => {
                let entry = SearchEntry::construct(entry);
                Ok(Some(SearchItem::Entry(RawEntry {
                    dn: entry.dn,
                    attributes: entry.attrs,
                })))
            }
        }
    }

    async fn release(&mut self) -> LdapResult<()> {
        if self.exhausted {
            self.stream
                .finish()
                .await
                .success()
                .map_err(|e| LdapError::search(e.to_string()))?;
        } else {
            let id = self.stream.ldap_handle().last_id();
            self.stream.ldap_handle().abandon(id).await?;
        }
        Ok(())
    }
}
