//! # dc-cli
//!
//! Library side of the `dcctl` binary.
//!
//! `dcctl` reads a directory configuration from a JSON or TOML properties
//! file and runs one handler operation on it:
//! - probes (connection, bind user example, query, structure, attribute map)
//! - test methods
//! - persist `create` / `delete` against a file-backed configuration store
//! - capability and existing-configuration listings

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod properties;

pub use cli::Cli;
pub use config::CliConfig;
pub use error::{CliError, CliResult};
