//! Probe, test and persist commands.

use dc_admin::LdapConfigurationHandler;

use super::{finish, load_config};
use crate::cli::OperationArgs;
use crate::config::OutputFormat;
use crate::error::CliResult;
use crate::output;

/// Runs a probe.
pub async fn run_probe(
    handler: &LdapConfigurationHandler,
    args: OperationArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let config = load_config(&args.config, format)?;
    let report = handler.probe(&args.id, &config).await;
    output::probe_report(&report, format)?;
    finish(report.contains_failure_messages())
}

/// Runs a test method.
pub async fn run_test(
    handler: &LdapConfigurationHandler,
    args: OperationArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let config = load_config(&args.config, format)?;
    let report = handler.test(&args.id, &config).await;
    output::test_report(&report, format)?;
    finish(report.contains_failure_messages())
}

/// Runs a persist operation.
pub async fn run_persist(
    handler: &LdapConfigurationHandler,
    args: OperationArgs,
    format: OutputFormat,
) -> CliResult<()> {
    let config = load_config(&args.config, format)?;
    let report = handler.persist(&config, &args.id).await;
    output::test_report(&report, format)?;
    finish(report.contains_failure_messages())
}
