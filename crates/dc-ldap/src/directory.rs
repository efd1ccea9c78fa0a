//! Directory transport seam.
//!
//! The engine talks to a directory only through these traits, so the
//! establisher, authenticator, search executor and guessers can run against
//! the real `ldap3` transport or an in-memory directory.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::bind::BindRequest;
use crate::config::{Endpoint, SearchScope};
use crate::connection::TlsPolicy;
use crate::error::LdapResult;

/// Everything a connector needs to open one session.
#[derive(Debug, Clone)]
pub struct ConnectRequest<'a> {
    /// Target endpoint.
    pub endpoint: &'a Endpoint,
    /// Validated TLS policy.
    pub tls: &'a TlsPolicy,
    /// Socket and handshake timeout.
    pub connect_timeout: Duration,
    /// Timeout applied to each bind or search.
    pub operation_timeout: Duration,
}

/// A search to run on a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Base DN.
    pub base: String,
    /// Scope.
    pub scope: SearchScope,
    /// Filter string.
    pub filter: String,
    /// Requested attributes. Empty means all user attributes.
    pub attributes: Vec<String>,
}

impl SearchRequest {
    /// Creates a whole-subtree search for all attributes.
    #[must_use]
    pub fn subtree(base: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            scope: SearchScope::Subtree,
            filter: filter.into(),
            attributes: Vec::new(),
        }
    }

    /// Creates a base-scope search.
    #[must_use]
    pub fn base_object(base: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            scope: SearchScope::Base,
            ..Self::subtree(base, filter)
        }
    }

    /// Creates a one-level search.
    #[must_use]
    pub fn one_level(base: impl Into<String>, filter: impl Into<String>) -> Self {
        Self {
            scope: SearchScope::OneLevel,
            ..Self::subtree(base, filter)
        }
    }

    /// Restricts the returned attributes.
    #[must_use]
    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }
}

/// An entry as returned by the directory, all values kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    /// Distinguished name.
    pub dn: String,
    /// Attributes (all values are multi-valued).
    pub attributes: HashMap<String, Vec<String>>,
}

impl RawEntry {
    /// Creates an entry with no attributes.
    #[must_use]
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: HashMap::new(),
        }
    }

    /// Adds an attribute value.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Gets the first value of an attribute.
    #[must_use]
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    /// Gets all values of an attribute.
    #[must_use]
    pub fn get_attrs(&self, name: &str) -> &[String] {
        self.attributes.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Checks if the entry has an attribute.
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }
}

/// One item read from a search result stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchItem {
    /// A regular entry.
    Entry(RawEntry),
    /// A continuation reference (referral URLs).
    Reference(Vec<String>),
}

/// Opens sessions to a directory.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a session. A single attempt, no retries.
    async fn connect(&self, request: ConnectRequest<'_>) -> LdapResult<Box<dyn DirectorySession>>;
}

/// An open directory session.
#[async_trait]
pub trait DirectorySession: Send {
    /// Authenticates the session.
    async fn bind(&mut self, request: &BindRequest) -> LdapResult<()>;

    /// Starts a search.
    async fn search(&mut self, request: &SearchRequest) -> LdapResult<Box<dyn SearchHandle>>;

    /// Closes the session.
    async fn close(&mut self) -> LdapResult<()>;
}

/// A running search.
#[async_trait]
pub trait SearchHandle: Send {
    /// Reads the next item. `None` when the stream is exhausted.
    async fn next(&mut self) -> LdapResult<Option<SearchItem>>;

    /// Releases the search, abandoning it if it was not exhausted.
    async fn release(&mut self) -> LdapResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_request_scopes() {
        assert_eq!(SearchRequest::subtree("dc=x", "(a=*)").scope, SearchScope::Subtree);
        assert_eq!(SearchRequest::base_object("", "(objectClass=*)").scope, SearchScope::Base);
        assert_eq!(SearchRequest::one_level("dc=x", "(a=*)").scope, SearchScope::OneLevel);

        let request = SearchRequest::base_object("", "(objectClass=*)").with_attributes(["namingContexts"]);
        assert_eq!(request.attributes, vec!["namingContexts".to_string()]);
    }

    #[test]
    fn raw_entry_accessors() {
        let entry = RawEntry::new("cn=a,dc=x")
            .with("mail", "a@x.org")
            .with("mail", "alias@x.org");

        assert_eq!(entry.get_attr("mail"), Some("a@x.org"));
        assert_eq!(entry.get_attrs("mail").len(), 2);
        assert!(entry.get_attrs("cn").is_empty());
        assert!(entry.has_attr("mail"));
        assert!(!entry.has_attr("cn"));
    }
}
