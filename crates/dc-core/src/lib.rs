//! # dc-core
//!
//! Core configuration and error handling for the directory console.
//!
//! This crate holds the process-wide settings every other crate reads:
//! TLS cipher/protocol lists, connection and operation timeouts, and the
//! installation home used for generated property files.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod config;
pub mod error;

pub use config::{EngineConfig, TlsSettings};
pub use error::{Error, Result};
