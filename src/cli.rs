//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// BuildTiles - per-branch CI build summaries for dashboard tiles
///
/// Fetches the recent builds of every tile in a view and prints one
/// representative build per branch.
///
/// Examples:
///   buildtiles --url http://teamcity:8111 --view "Team Wall"
///   buildtiles --from-file fixtures/builds.json --format json
///   buildtiles --branches 3 --username viewer
///   buildtiles --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .buildtiles.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Name of the view to show (defaults to the first configured view)
    #[arg(long, value_name = "NAME")]
    pub view: Option<String>,

    /// TeamCity server URL
    #[arg(long, value_name = "URL", env = "TEAMCITY_URL")]
    pub url: Option<String>,

    /// TeamCity user (guest access when unset)
    #[arg(short, long, env = "TEAMCITY_USERNAME")]
    pub username: Option<String>,

    /// TeamCity password
    #[arg(long, env = "TEAMCITY_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Maximum branches per tile (overrides the view setting)
    #[arg(short, long, value_name = "COUNT")]
    pub branches: Option<usize>,

    /// Read builds from a JSON file instead of a TeamCity server
    #[arg(long, value_name = "FILE")]
    pub from_file: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .buildtiles.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text (default)
    #[default]
    Text,
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
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Server URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref path) = self.from_file {
            if !path.is_file() {
                return Err(format!("Build file does not exist: {}", path.display()));
            }
        }

        Ok(())
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
