//! CLI settings commands.

use crate::cli::ConfigCommand;
use crate::error::CliResult;
use crate::output::{info, success};
use crate::CliConfig;

/// Runs a settings command.
pub fn run_config(cmd: ConfigCommand, config: &mut CliConfig) -> CliResult<()> {
    match cmd {
        ConfigCommand::Show => show_config(config),
        ConfigCommand::Set { key, value } => {
            config.set(&key, &value)?;
            config.save()?;
            success(&format!("Set {key} = {value}"));
            Ok(())
        }
    }
}

/// Shows the current settings.
fn show_config(config: &CliConfig) -> CliResult<()> {
    info(&format!("Configuration file: {}", CliConfig::config_path()?.display()));
    println!();
    println!("store_dir: {}", config.effective_store_dir(None)?.display());
    println!("output_format: {:?}", config.output_format);
    Ok(())
}
