//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.buildtiles.toml` files.

use crate::models::View;
use crate::provider::TeamCityConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".buildtiles.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// CI server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Dashboard views.
    #[serde(default = "default_views")]
    pub views: Vec<View>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            views: default_views(),
        }
    }
}

fn default_views() -> Vec<View> {
    vec![View::new("Default")]
}

/// TeamCity server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the server.
    #[serde(default = "default_url")]
    pub url: String,

    /// User for HTTP authentication. Guest access when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: None,
            password: None,
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_url() -> String {
    "http://localhost:8111".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl From<&ServerConfig> for TeamCityConfig {
    fn from(server: &ServerConfig) -> Self {
        TeamCityConfig {
            base_url: server.url.clone(),
            username: server.username.clone(),
            password: server.password.clone(),
            timeout_seconds: server.timeout_seconds,
        }
    }
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
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.buildtiles.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref url) = args.url {
            self.server.url = url.clone();
        }
        if let Some(ref username) = args.username {
            self.server.username = Some(username.clone());
        }
        if let Some(ref password) = args.password {
            self.server.password = Some(password.clone());
        }
        if let Some(timeout) = args.timeout {
            self.server.timeout_seconds = timeout;
        }

        // Branch limit override applies to every view
        if let Some(branches) = args.branches {
            for view in &mut self.views {
                view.default_number_of_branches_per_tile = branches;
            }
        }
    }

    /// Check settings that only make sense once file and CLI are merged.
    pub fn validate(&self) -> Result<()> {
        if self.server.password.is_some() && self.server.username.is_none() {
            anyhow::bail!("A password is configured but no username");
        }
        Ok(())
    }

    /// Find a view by name (case-insensitive), or the first view if no
    /// name is given.
    pub fn find_view(&self, name: Option<&str>) -> Option<&View> {
        match name {
            Some(name) => self.views.iter().find(|v| v.name.eq_ignore_ascii_case(name)),
            None => self.views.first(),
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
    use crate::cli::{Args, OutputFormat};
    use tempfile::TempDir;

    fn make_args() -> Args {
        Args {
            config: None,
            view: None,
            url: None,
            username: None,
            password: None,
            timeout: None,
            branches: None,
            from_file: None,
            format: OutputFormat::Text,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    const SAMPLE: &str = r#"
[server]
url = "https://ci.example.com"
username = "viewer"
password = "hunter2"

[[views]]
name = "Team Wall"
default_number_of_branches_per_tile = 3

[[views.tiles]]
label = "Build"
build_configuration_id = "Theatre_Build"

[[views.tiles]]
label = "Deploy"
build_configuration_id = "Theatre_Deploy"

[[views]]
name = "Releases"
"#;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.url, "http://localhost:8111");
        assert_eq!(config.server.timeout_seconds, 30);
        assert_eq!(config.views.len(), 1);
        assert_eq!(config.views[0].default_number_of_branches_per_tile, 5);
    }

    #[test]
    fn test_parse_config() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.server.url, "https://ci.example.com");
        assert_eq!(config.server.username.as_deref(), Some("viewer"));
        assert_eq!(config.server.timeout_seconds, 30);
        assert_eq!(config.views.len(), 2);

        let wall = &config.views[0];
        assert_eq!(wall.default_number_of_branches_per_tile, 3);
        assert_eq!(wall.tiles.len(), 2);
        assert_eq!(wall.tiles[1].build_configuration_id, "Theatre_Deploy");

        assert_eq!(config.views[1].default_number_of_branches_per_tile, 5);
        assert!(config.views[1].tiles.is_empty());
    }

    #[test]
    fn test_find_view() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.find_view(None).map(|v| v.name.as_str()), Some("Team Wall"));
        assert_eq!(
            config.find_view(Some("releases")).map(|v| v.name.as_str()),
            Some("Releases")
        );
        assert!(config.find_view(Some("missing")).is_none());
    }

    #[test]
    fn test_merge_with_args() {
        let mut config: Config = toml::from_str(SAMPLE).unwrap();
        let args = Args {
            url: Some("http://tc.local:8111".to_string()),
            timeout: Some(5),
            branches: Some(1),
            ..make_args()
        };

        config.merge_with_args(&args);

        assert_eq!(config.server.url, "http://tc.local:8111");
        assert_eq!(config.server.timeout_seconds, 5);
        // Untouched when not given on the command line
        assert_eq!(config.server.username.as_deref(), Some("viewer"));
        assert!(config
            .views
            .iter()
            .all(|v| v.default_number_of_branches_per_tile == 1));
    }

    #[test]
    fn test_username_from_file_password_from_cli() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[server]\nusername = \"viewer\"\n").unwrap();

        let args = Args {
            config: Some(path.clone()),
            password: Some("s3cret".to_string()),
            ..make_args()
        };
        assert!(args.validate().is_ok());

        let mut config = Config::load(&path).unwrap();
        config.merge_with_args(&args);

        assert_eq!(config.server.username.as_deref(), Some("viewer"));
        assert_eq!(config.server.password.as_deref(), Some("s3cret"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_password_without_any_username_is_rejected() {
        let mut config = Config::default();
        config.merge_with_args(&Args {
            password: Some("s3cret".to_string()),
            ..make_args()
        });

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_dir() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), SAMPLE).unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.views[0].name, "Team Wall");

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[server\nurl=").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[[views]]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.server.url, "http://localhost:8111");
    }
}
