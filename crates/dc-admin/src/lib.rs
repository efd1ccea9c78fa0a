//! # dc-admin
//!
//! Probe, test and persist orchestration for directory integrations.
//!
//! [`LdapConfigurationHandler`] is what the invoking transport talks to. It
//! validates required fields before any network call, drives the engine in
//! `dc-ldap`, and reports every fault as structured messages with a stable
//! code and a field path.
//!
//! ## Modules
//!
//! - [`handler`] - probe, test and persist dispatch
//! - [`test_method`] - the named test methods and their registry
//! - [`persist`] - staging of configuration writes
//! - [`store`] - the host configuration store seam
//! - [`report`] - messages and reports
//! - [`validation`] - required-field checks
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use dc_admin::{LdapConfigurationHandler, FileStore};
//! use dc_core::EngineConfig;
//! use dc_ldap::Ldap3Connector;
//!
//! let engine = EngineConfig::from_env()?;
//! let handler = LdapConfigurationHandler::from_engine_config(
//!     &engine,
//!     Arc::new(Ldap3Connector::new()),
//!     Arc::new(FileStore::new("/var/lib/dcctl")),
//! );
//! let report = handler.probe("directoryStructure", &config).await;
//! ```

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod error;
pub mod handler;
pub mod persist;
pub mod report;
pub mod store;
pub mod test_method;
pub mod validation;

pub use error::{AdminError, AdminResult};
pub use handler::LdapConfigurationHandler;
pub use persist::Configurator;
pub use report::{
    CapabilitiesReport, ConfigurationMessage, MessageType, ProbeReport, TestMethodDescriptor, TestReport,
};
pub use store::{ConfigReport, ConfigurationStore, FileStore, MemoryStore, Properties, StagedOperation};
pub use test_method::{TestMethod, TestRegistry};
