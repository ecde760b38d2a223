//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.sondeo.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Snapshot source settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "sondeo_dashboard.md".to_string()
}

/// Snapshot source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Snapshot JSON file to poll.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// HTTP endpoint serving the snapshot JSON.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Seconds between polls in watch mode.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            file: None,
            url: None,
            poll_interval_seconds: default_poll_interval(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_poll_interval() -> u64 {
    5
}

fn default_timeout() -> u64 {
    10
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Include the full responses table in the report.
    #[serde(default = "default_true")]
    pub include_responses: bool,

    /// Maximum rows of the responses table.
    #[serde(default = "default_max_table_rows")]
    pub max_table_rows: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            include_responses: true,
            max_table_rows: default_max_table_rows(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_table_rows() -> usize {
    200
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".sondeo.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref input) = args.input {
            self.source.file = Some(input.display().to_string());
            self.source.url = None;
        }
        if let Some(ref url) = args.url {
            self.source.url = Some(url.clone());
            self.source.file = None;
        }

        if let Some(interval) = args.interval {
            self.source.poll_interval_seconds = interval;
        }
        if let Some(timeout) = args.timeout {
            self.source.timeout_seconds = timeout;
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        if args.no_responses {
            self.report.include_responses = false;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.output, "sondeo_dashboard.md");
        assert_eq!(config.source.poll_interval_seconds, 5);
        assert!(config.report.include_responses);
        assert_eq!(config.report.max_table_rows, 200);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "tablero.md"
verbose = true

[source]
url = "http://localhost:9000/encuestas.json"
poll_interval_seconds = 2

[report]
include_responses = false
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "tablero.md");
        assert!(config.general.verbose);
        assert_eq!(
            config.source.url.as_deref(),
            Some("http://localhost:9000/encuestas.json")
        );
        assert_eq!(config.source.poll_interval_seconds, 2);
        assert_eq!(config.source.timeout_seconds, 10);
        assert!(!config.report.include_responses);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[source]"));
        assert!(toml_str.contains("[report]"));
    }
}
