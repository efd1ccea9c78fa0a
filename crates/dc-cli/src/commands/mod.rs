//! Command implementations.

pub mod capabilities;
pub mod config;
pub mod list;
pub mod operation;

pub use capabilities::run_capabilities;
pub use config::run_config;
pub use list::run_list;
pub use operation::{run_persist, run_probe, run_test};

use std::path::Path;

use dc_admin::TestReport;
use dc_ldap::DirectoryConnectionConfig;

use crate::config::OutputFormat;
use crate::error::{CliError, CliResult};
use crate::output;
use crate::properties;

/// Loads the directory configuration for an operation.
///
/// A field value that does not parse is printed as a one-message failure
/// report.
pub fn load_config(path: &Path, format: OutputFormat) -> CliResult<DirectoryConnectionConfig> {
    match properties::parse_config(properties::read_properties(path)?) {
        Ok(config) => Ok(config),
        Err(message) => {
            output::test_report(&TestReport::single(message), format)?;
            Err(CliError::ReportFailed)
        }
    }
}

/// Maps a report's failure flag to the command result.
fn finish(contains_failures: bool) -> CliResult<()> {
    if contains_failures {
        Err(CliError::ReportFailed)
    } else {
        Ok(())
    }
}
