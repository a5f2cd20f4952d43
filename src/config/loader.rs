//! Configuration loading from TOML files.

use std::path::PathBuf;

use crate::config::BridgeConfig;

/// Environment variable that overrides the configured bridge endpoint.
pub const ENDPOINT_ENV: &str = "CLAUDE_BRIDGE_URL";

/// Configuration loader that searches multiple locations.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Search paths in order of priority.
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader with default search paths.
    #[must_use]
    pub fn new() -> Self {
        let mut search_paths = Vec::new();

        // 1. Current directory: .claude-bridge.toml
        search_paths.push(PathBuf::from(".claude-bridge.toml"));

        // 2. User config directory: ~/.config/claude-bridge/config.toml
        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("claude-bridge").join("config.toml"));
        }

        Self { search_paths }
    }

    /// Create a config loader with a specific config file path.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            search_paths: vec![path],
        }
    }

    /// Load configuration from the first available file, or return
    /// defaults. `CLAUDE_BRIDGE_URL`, when set, overrides the endpoint
    /// from any source.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed.
    pub fn load(&self) -> Result<BridgeConfig, ConfigError> {
        let mut config = self.load_file()?;
        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV) {
            tracing::debug!(%endpoint, "Endpoint overridden from environment");
            config.transport.endpoint = endpoint;
        }
        Ok(config)
    }

    fn load_file(&self) -> Result<BridgeConfig, ConfigError> {
        for path in &self.search_paths {
            if path.exists() {
                tracing::debug!(path = %path.display(), "Loading config file");
                return Self::load_from_path(path);
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(BridgeConfig::default())
    }

    /// Load configuration from a specific path.
    fn load_from_path(path: &PathBuf) -> Result<BridgeConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.clone(),
            source: e,
        })
    }

    /// Get the search paths for debugging.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Find the first config file that exists.
    #[must_use]
    pub fn find_config_file(&self) -> Option<PathBuf> {
        self.search_paths.iter().find(|p| p.exists()).cloned()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}
