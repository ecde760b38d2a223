//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Sondeo - live sentiment analytics for survey snapshots
///
/// Turn a snapshot of survey submissions into per-respondent sentiment and
/// dashboard aggregates. Point it at a snapshot JSON file or at an HTTP
/// endpoint serving one, optionally keeping the report current as the
/// dataset changes.
///
/// Examples:
///   sondeo --input encuestas.json
///   sondeo --input encuestas.json --watch --interval 2
///   sondeo --url http://localhost:9000/encuestas.json --format json
///   sondeo --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Snapshot JSON file to analyze
    ///
    /// A JSON object mapping submission ids to payloads, or a single-key
    /// `{"encuestas": …}` export wrapping it.
    #[arg(short, long, value_name = "FILE", required_unless_present_any = ["url", "init_config"])]
    pub input: Option<PathBuf>,

    /// HTTP endpoint serving the snapshot JSON
    ///
    /// Polled on an interval; implies watch mode unless --once is given.
    /// Can also be set via SONDEO_URL or .sondeo.toml.
    #[arg(short, long, value_name = "URL", env = "SONDEO_URL", conflicts_with = "input")]
    pub url: Option<String>,

    /// Output file path for the dashboard report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Keep watching the source and rewrite the report on every change
    #[arg(short, long)]
    pub watch: bool,

    /// Write one report for the first delivered snapshot and exit
    ///
    /// This is the default for --input; for --url it stops after the first
    /// successful fetch.
    #[arg(long, conflicts_with = "watch")]
    pub once: bool,

    /// Seconds between source polls in watch mode
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// HTTP request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Leave the full responses table out of the report
    #[arg(long)]
    pub no_responses: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .sondeo.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .sondeo.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Snapshot URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // A one-shot file read must have a file to read
        if let Some(ref input) = self.input {
            if !self.watch && !input.exists() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(interval) = self.interval {
            if interval == 0 {
                return Err("Poll interval must be at least 1 second".to_string());
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        Ok(())
    }

    /// Whether the run keeps following the source after the first report.
    pub fn is_watch(&self) -> bool {
        if self.once {
            return false;
        }
        self.watch || self.url.is_some()
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
