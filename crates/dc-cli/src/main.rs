//! # dcctl
//!
//! Probe, test and persist directory configurations from the command line.

#![forbid(unsafe_code)]
#![deny(warnings)]

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dc_admin::{FileStore, LdapConfigurationHandler};
use dc_cli::{
    cli::{Cli, Command},
    commands::{run_capabilities, run_config, run_list, run_persist, run_probe, run_test},
    config::CliConfig,
    output::error,
    CliError,
};
use dc_core::EngineConfig;
use dc_ldap::Ldap3Connector;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !matches!(e.downcast_ref::<CliError>(), Some(CliError::ReportFailed)) {
                error(&format!("{e:#}"));
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default.into());
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = CliConfig::load().context("Failed to load configuration")?;
    let format = settings.effective_output(cli.output);

    if let Command::Config(cmd) = cli.command {
        return Ok(run_config(cmd, &mut settings)?);
    }

    let engine = EngineConfig::from_env().context("Invalid engine environment")?;
    let store_dir = settings.effective_store_dir(cli.store.as_deref())?;
    tracing::debug!(store = %store_dir.display(), home = %engine.home_dir.display(), "Starting dcctl");

    let handler = LdapConfigurationHandler::from_engine_config(
        &engine,
        Arc::new(Ldap3Connector::new()),
        Arc::new(FileStore::new(store_dir)),
    );

    match cli.command {
        Command::Probe(args) => run_probe(&handler, args, format).await?,
        Command::Test(args) => run_test(&handler, args, format).await?,
        Command::Persist(args) => run_persist(&handler, args, format).await?,
        Command::Capabilities => run_capabilities(&handler, format)?,
        Command::List => run_list(&handler, format).await?,
        Command::Config(_) => {}
    }
    Ok(())
}
