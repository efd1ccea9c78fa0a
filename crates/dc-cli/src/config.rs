//! CLI settings.
//!
//! Stored at `~/.dcctl/dcctl.toml`. Command-line flags and environment
//! variables take precedence over the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// CLI settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Configuration store directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_dir: Option<PathBuf>,

    /// Output format.
    #[serde(default)]
    pub output_format: OutputFormat,
}

impl CliConfig {
    /// Loads settings, or defaults when the file does not exist.
    pub fn load() -> CliResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Loads settings from `path`, or defaults when it does not exist.
    pub fn load_from(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::Config(format!("failed to parse config: {e}")))
    }

    /// Saves settings.
    pub fn save(&self) -> CliResult<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Saves settings to `path`.
    pub fn save_to(&self, path: &Path) -> CliResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| CliError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Gets the settings file path.
    pub fn config_path() -> CliResult<PathBuf> {
        Ok(Self::settings_dir()?.join("dcctl.toml"))
    }

    /// Gets the store directory: the argument, the setting, or `~/.dcctl/store`.
    pub fn effective_store_dir(&self, arg: Option<&Path>) -> CliResult<PathBuf> {
        match arg.map(Path::to_path_buf).or_else(|| self.store_dir.clone()) {
            Some(dir) => Ok(dir),
            None => Ok(Self::settings_dir()?.join("store")),
        }
    }

    /// Gets the output format: the argument or the setting.
    #[must_use]
    pub fn effective_output(&self, arg: Option<OutputFormat>) -> OutputFormat {
        arg.unwrap_or(self.output_format)
    }

    /// Sets a setting by key.
    pub fn set(&mut self, key: &str, value: &str) -> CliResult<()> {
        match key {
            "store_dir" | "store" => {
                self.store_dir = match value {
                    "" | "none" => None,
                    dir => Some(PathBuf::from(dir)),
                };
            }
            "output_format" | "output" => {
                self.output_format = match value.to_lowercase().as_str() {
                    "text" => OutputFormat::Text,
                    "json" => OutputFormat::Json,
                    _ => {
                        return Err(CliError::InvalidArgument(format!(
                            "Unknown output format: {value}. Supported: text, json"
                        )));
                    }
                };
            }
            _ => {
                return Err(CliError::InvalidArgument(format!(
                    "Unknown configuration key: {key}. Known keys: store_dir, output_format"
                )));
            }
        }
        Ok(())
    }

    fn settings_dir() -> CliResult<PathBuf> {
        let home = dirs_next::home_dir()
            .ok_or_else(|| CliError::Config("could not determine home directory".to_string()))?;
        Ok(home.join(".dcctl"))
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("dcctl.toml");
        let config = CliConfig {
            store_dir: Some(PathBuf::from("/var/lib/dcctl")),
            output_format: OutputFormat::Json,
        };

        config.save_to(&path).unwrap();

        assert_eq!(CliConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(CliConfig::load_from(&dir.path().join("absent.toml")).unwrap(), CliConfig::default());
    }

    #[test]
    fn set_keys() {
        let mut config = CliConfig::default();
        config.set("output", "JSON").unwrap();
        config.set("store_dir", "/srv/dc").unwrap();

        assert_eq!(config.output_format, OutputFormat::Json);
        assert_eq!(config.store_dir, Some(PathBuf::from("/srv/dc")));

        config.set("store", "none").unwrap();
        assert_eq!(config.store_dir, None);
        assert!(config.set("output", "yaml").is_err());
        assert!(config.set("server_url", "x").is_err());
    }

    #[test]
    fn arguments_override_settings() {
        let config = CliConfig {
            store_dir: Some(PathBuf::from("/from/settings")),
            output_format: OutputFormat::Json,
        };

        assert_eq!(
            config.effective_store_dir(Some(Path::new("/from/flag"))).unwrap(),
            PathBuf::from("/from/flag")
        );
        assert_eq!(config.effective_store_dir(None).unwrap(), PathBuf::from("/from/settings"));
        assert_eq!(config.effective_output(Some(OutputFormat::Text)), OutputFormat::Text);
        assert_eq!(config.effective_output(None), OutputFormat::Json);
    }
}
