//! Directory search execution.
//!
//! Drains a search stream into records. Continuation references are read and
//! dropped, never followed. A fault in the middle of the stream, or a failed
//! result after some entries, keeps what was already collected.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::directory::{DirectorySession, RawEntry, SearchItem, SearchRequest};
use crate::error::LdapResult;

/// Record key holding the entry's distinguished name.
pub const NAME_KEY: &str = "name";

/// A search result entry with one value per attribute.
///
/// Multi-valued attributes keep only their first value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Distinguished name.
    pub dn: String,
    /// Attribute name to first value.
    pub attributes: BTreeMap<String, String>,
}

impl DirectoryEntry {
    /// Gets an attribute value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Flattens into a record with the DN under [`NAME_KEY`].
    #[must_use]
    pub fn into_record(self) -> BTreeMap<String, String> {
        let mut record = self.attributes;
        record.insert(NAME_KEY.to_string(), self.dn);
        record
    }
}

impl From<RawEntry> for DirectoryEntry {
    fn from(entry: RawEntry) -> Self {
        let attributes = entry
            .attributes
            .into_iter()
            .filter_map(|(name, values)| values.into_iter().next().map(|first| (name, first)))
            .collect();
        Self {
            dn: entry.dn,
            attributes,
        }
    }
}

/// Runs `request` and collects its entries.
///
/// Fails when the search cannot be started, or when the server ends it with
/// a failed result before returning any entry. The search handle is released
/// on every path.
pub async fn collect_entries(
    session: &mut dyn DirectorySession,
    request: &SearchRequest,
) -> LdapResult<Vec<RawEntry>> {
    let mut handle = session.search(request).await?;
    let mut entries = Vec::new();
    let mut completed = false;

    loop {
        match handle.next().await {
            Ok(Some(SearchItem::Entry(entry))) => {
                tracing::trace!(dn = %entry.dn, "Search entry");
                entries.push(entry);
            }
            Ok(Some(SearchItem::Reference(urls))) => {
                tracing::debug!(base = %request.base, referrals = ?urls, "Discarding search reference");
            }
            Ok(None) => {
                completed = true;
                break;
            }
            Err(e) => {
                tracing::warn!(
                    base = %request.base,
                    filter = %request.filter,
                    collected = entries.len(),
                    error = %e,
                    "Search stream interrupted, returning partial results"
                );
                break;
            }
        }
    }

    match handle.release().await {
        Ok(()) => {}
        Err(e) if completed && entries.is_empty() => return Err(e),
        Err(e) if completed => tracing::warn!(
            base = %request.base,
            filter = %request.filter,
            collected = entries.len(),
            error = %e,
            "Search ended with a failed result, returning partial results"
        ),
        Err(e) => tracing::debug!(base = %request.base, error = %e, "Failed to release search"),
    }

    Ok(entries)
}

/// Runs a whole-subtree search for `filter` under `base`.
pub async fn query(
    session: &mut dyn DirectorySession,
    filter: &str,
    base: &str,
) -> LdapResult<Vec<DirectoryEntry>> {
    let request = SearchRequest::subtree(base, filter);
    let entries = collect_entries(session, &request).await?;
    Ok(entries.into_iter().map(DirectoryEntry::from).collect())
}
