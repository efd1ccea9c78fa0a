//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::OutputFormat;

/// dcctl - probe, test and persist directory configurations.
#[derive(Debug, Parser)]
#[command(name = "dcctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration store directory (overrides config).
    #[arg(short, long, env = "DC_STORE_DIR", global = true)]
    pub store: Option<PathBuf>,

    /// Output format (overrides config).
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a probe.
    Probe(OperationArgs),

    /// Run a test method.
    Test(OperationArgs),

    /// Create or delete persisted configuration.
    Persist(OperationArgs),

    /// Show the handler's test methods.
    Capabilities,

    /// List existing login configurations.
    List,

    /// CLI settings management.
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Arguments shared by probe, test and persist.
#[derive(Debug, Args)]
pub struct OperationArgs {
    /// Operation id (e.g. `directoryStructure`, `testLdapBind`, `create`).
    pub id: String,

    /// JSON or TOML file holding the directory configuration.
    #[arg(short, long)]
    pub config: PathBuf,
}

/// CLI settings commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current settings.
    Show,

    /// Set a setting.
    Set {
        /// Setting key (`store_dir`, `output_format`).
        key: String,

        /// Setting value.
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_probe() {
        let cli = Cli::try_parse_from([
            "dcctl",
            "probe",
            "directoryStructure",
            "--config",
            "ldap.json",
            "--output",
            "json",
        ])
        .unwrap();

        assert!(matches!(cli.output, Some(OutputFormat::Json)));
        match cli.command {
            Command::Probe(args) => {
                assert_eq!(args.id, "directoryStructure");
                assert_eq!(args.config, PathBuf::from("ldap.json"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn operation_requires_config_file() {
        assert!(Cli::try_parse_from(["dcctl", "test", "testLdapBind"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["dcctl", "list", "-v", "--store", "/tmp/dc"]).unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/dc")));
        assert!(matches!(cli.command, Command::List));
    }
}
