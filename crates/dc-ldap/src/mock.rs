//! In-memory directory for tests.
//!
//! Scripted connect and bind results, canned search responses keyed by
//! `(base, filter)`, injected stream and result faults and call counters. Searches with
//! no canned response return an empty stream.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::bind::{BindMethod, BindRequest};
use crate::config::Endpoint;
use crate::directory::{
    ConnectRequest, Connector, DirectorySession, RawEntry, SearchHandle, SearchItem, SearchRequest,
};
use crate::error::{LdapError, LdapResult};

/// Call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockStats {
    /// Connection attempts.
    pub connects: usize,
    /// Bind attempts.
    pub binds: usize,
    /// Searches successfully started.
    pub searches_opened: usize,
    /// Search handles released.
    pub searches_released: usize,
    /// Sessions closed.
    pub closes: usize,
}

#[derive(Debug, Default)]
struct CannedSearch {
    items: Vec<SearchItem>,
    start_error: Option<LdapError>,
    fail_after: Option<(usize, LdapError)>,
    finish_error: Option<LdapError>,
}

#[derive(Debug, Default)]
struct MockState {
    connect_error: Option<LdapError>,
    bind_error: Option<LdapError>,
    searches: HashMap<(String, String), CannedSearch>,
    stats: MockStats,
    last_endpoint: Option<Endpoint>,
    last_bind: Option<BindRequest>,
    search_log: Vec<SearchRequest>,
}

/// A scripted directory. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockDirectory {
    state: Arc<Mutex<MockState>>,
}

impl MockDirectory {
    /// Creates an empty directory that accepts every connect and bind.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every connect attempt fail with `error`.
    pub fn fail_connect(&self, error: LdapError) {
        self.state.lock().connect_error = Some(error);
    }

    /// Makes every bind attempt fail with `error`.
    pub fn fail_bind(&self, error: LdapError) {
        self.state.lock().bind_error = Some(error);
    }

    /// Adds entries returned for `(base, filter)`.
    pub fn add_search_entries(&self, base: &str, filter: &str, entries: Vec<RawEntry>) {
        self.add_search_items(base, filter, entries.into_iter().map(SearchItem::Entry).collect());
    }

    /// Adds raw stream items returned for `(base, filter)`.
    pub fn add_search_items(&self, base: &str, filter: &str, items: Vec<SearchItem>) {
        self.state
            .lock()
            .searches
            .entry(key(base, filter))
            .or_default()
            .items
            .extend(items);
    }

    /// Makes `(base, filter)` fail to start.
    pub fn fail_search_start(&self, base: &str, filter: &str, error: LdapError) {
        self.state
            .lock()
            .searches
            .entry(key(base, filter))
            .or_default()
            .start_error = Some(error);
    }

    /// Makes `(base, filter)` fault after yielding `count` items.
    pub fn fail_search_after(&self, base: &str, filter: &str, count: usize, error: LdapError) {
        self.state
            .lock()
            .searches
            .entry(key(base, filter))
            .or_default()
            .fail_after = Some((count, error));
    }

    /// Makes `(base, filter)` end with a failed result once its items are
    /// drained, the way a server reports result codes such as noSuchObject.
    pub fn fail_search_finish(&self, base: &str, filter: &str, error: LdapError) {
        self.state
            .lock()
            .searches
            .entry(key(base, filter))
            .or_default()
            .finish_error = Some(error);
    }

    /// Publishes a root DSE with the given naming contexts.
    pub fn set_root_dse(&self, naming_contexts: &[&str], default_naming_context: Option<&str>) {
        let mut entry = RawEntry::new("");
        for context in naming_contexts {
            entry = entry.with("namingContexts", *context);
        }
        if let Some(default) = default_naming_context {
            entry = entry.with("defaultNamingContext", default);
        }
        self.add_search_entries("", "(objectClass=*)", vec![entry]);
    }

    /// Opens a session directly, without counting a connect.
    #[must_use]
    pub fn session(&self) -> MockSession {
        MockSession {
            state: Arc::clone(&self.state),
        }
    }

    /// Returns the call counters.
    #[must_use]
    pub fn stats(&self) -> MockStats {
        self.state.lock().stats
    }

    /// Returns the endpoint of the last connect attempt.
    #[must_use]
    pub fn last_endpoint(&self) -> Option<Endpoint> {
        self.state.lock().last_endpoint.clone()
    }

    /// Returns the method of the last bind attempt.
    #[must_use]
    pub fn last_bind_method(&self) -> Option<BindMethod> {
        self.state.lock().last_bind.as_ref().map(BindRequest::method)
    }

    /// Returns the last bind request.
    #[must_use]
    pub fn last_bind(&self) -> Option<BindRequest> {
        self.state.lock().last_bind.clone()
    }

    /// Returns every search request started so far.
    #[must_use]
    pub fn search_log(&self) -> Vec<SearchRequest> {
        self.state.lock().search_log.clone()
    }
}

#[async_trait]
impl Connector for MockDirectory {
    async fn connect(&self, request: ConnectRequest<'_>) -> LdapResult<Box<dyn DirectorySession>> {
        let mut state = self.state.lock();
        state.stats.connects += 1;
        state.last_endpoint = Some(request.endpoint.clone());
        if let Some(error) = &state.connect_error {
            return Err(duplicate(error));
        }
        drop(state);
        Ok(Box::new(self.session()))
    }
}

/// A session on a [`MockDirectory`].
#[derive(Debug)]
pub struct MockSession {
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl DirectorySession for MockSession {
    async fn bind(&mut self, request: &BindRequest) -> LdapResult<()> {
        let mut state = self.state.lock();
        state.stats.binds += 1;
        state.last_bind = Some(request.clone());
        match &state.bind_error {
            Some(error) => Err(duplicate(error)),
            None => Ok(()),
        }
    }

    async fn search(&mut self, request: &SearchRequest) -> LdapResult<Box<dyn SearchHandle>> {
        let mut state = self.state.lock();
        state.search_log.push(request.clone());

        let (items, fail_after, finish_error) = match state.searches.get(&key(&request.base, &request.filter)) {
            Some(canned) => {
                if let Some(error) = &canned.start_error {
                    return Err(duplicate(error));
                }
                (
                    canned.items.clone(),
                    canned.fail_after.as_ref().map(|(n, e)| (*n, duplicate(e))),
                    canned.finish_error.as_ref().map(duplicate),
                )
            }
            None => (Vec::new(), None, None),
        };
        state.stats.searches_opened += 1;
        drop(state);

        Ok(Box::new(MockSearch {
            state: Arc::clone(&self.state),
            items: items.into(),
            fail_after,
            finish_error,
            yielded: 0,
            exhausted: false,
        }))
    }

    async fn close(&mut self) -> LdapResult<()> {
        self.state.lock().stats.closes += 1;
        Ok(())
    }
}

struct MockSearch {
    state: Arc<Mutex<MockState>>,
    items: VecDeque<SearchItem>,
    fail_after: Option<(usize, LdapError)>,
    finish_error: Option<LdapError>,
    yielded: usize,
    exhausted: bool,
}

#[async_trait]
impl SearchHandle for MockSearch {
    async fn next(&mut self) -> LdapResult<Option<SearchItem>> {
        if let Some((count, error)) = &self.fail_after {
            if self.yielded >= *count {
                return Err(duplicate(error));
            }
        }
        let item = self.items.pop_front();
        match item {
            Some(_) => self.yielded += 1,
            None => self.exhausted = true,
        }
        Ok(item)
    }

    async fn release(&mut self) -> LdapResult<()> {
        self.state.lock().stats.searches_released += 1;
        match self.finish_error.take() {
            Some(error) if self.exhausted => Err(error),
            _ => Ok(()),
        }
    }
}

fn key(base: &str, filter: &str) -> (String, String) {
    (base.to_string(), filter.to_string())
}

fn duplicate(error: &LdapError) -> LdapError {
    match error {
        LdapError::Configuration(m) => LdapError::Configuration(m.clone()),
        LdapError::Tls(m) => LdapError::Tls(m.clone()),
        LdapError::Connection(m) => LdapError::Connection(m.clone()),
        LdapError::Bind(m) => LdapError::Bind(m.clone()),
        LdapError::UnsupportedMechanism(m) => LdapError::UnsupportedMechanism(m),
        LdapError::Search(m) => LdapError::Search(m.clone()),
        LdapError::Stream(m) => LdapError::Stream(m.clone()),
        LdapError::Timeout => LdapError::Timeout,
        LdapError::Ldap3(e) => LdapError::Connection(e.to_string()),
    }
}
