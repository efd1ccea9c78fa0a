//! # dc-ldap
//!
//! LDAP verification and discovery engine.
//!
//! Given connection parameters this crate opens a transport (plain, TLS or
//! STARTTLS), binds with one of several mechanisms, runs directory searches
//! and infers vendor-specific defaults from an unknown directory.
//!
//! ## Layers
//!
//! - [`bind`]: bind method to bind request, no I/O
//! - [`connection`]: TLS policy validation and connection establishment
//! - [`auth`]: connect, then bind
//! - [`search`]: subtree searches drained into records
//! - [`guesser`]: per-vendor structure inference
//!
//! Every step reports through [`Outcome`] or [`LdapError`]; connections are
//! opened per call and never pooled.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod auth;
pub mod bind;
pub mod config;
pub mod connection;
pub mod directory;
pub mod error;
pub mod guesser;
pub mod outcome;
pub mod search;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use auth::Authenticator;
pub use bind::{select_bind_request, BindMethod, BindRequest};
pub use config::{
    DirectoryConnectionConfig, EncryptionMethod, Endpoint, SearchScope, ServerFlavor, UseCase,
};
pub use connection::{ConnectionEstablisher, TlsPolicy};
pub use directory::{Connector, DirectorySession, RawEntry, SearchHandle, SearchItem, SearchRequest};
pub use error::{LdapError, LdapResult};
pub use guesser::{guess_structure, guesser_for, GuessedStructure, ServerGuesser};
pub use outcome::{Outcome, OutcomeKind};
pub use search::{collect_entries, query, DirectoryEntry};
pub use transport::Ldap3Connector;
