//! Configuration File Loading
//!
//! Finds and parses the configuration file. TOML is the primary format;
//! `.json` files are accepted as well.

use super::Config;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration file loader
pub struct ConfigLoader {
    /// Search paths for configuration files
    search_paths: Vec<PathBuf>,
    /// Path of the file the last load came from
    current_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
}

impl ConfigFormat {
    /// Pick the format from a file extension, TOML when unknown
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => ConfigFormat::Json,
            _ => ConfigFormat::Toml,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Json => "JSON",
        }
    }
}

impl ConfigLoader {
    /// Create a new configuration loader with the default search paths
    pub fn new() -> Self {
        Self {
            search_paths: Self::get_search_paths(),
            current_path: None,
        }
    }

    /// Create a loader that only looks at the given paths
    pub fn with_search_paths(search_paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths,
            current_path: None,
        }
    }

    /// Load the first configuration found, or defaults when there is none
    pub fn load(&mut self) -> Result<Config> {
        for path in self.search_paths.clone() {
            if path.is_file() {
                let config = self.load_from_path(&path)?;
                return Ok(config);
            }
        }

        info!("No configuration file found, using defaults");
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a specific configuration file
    pub fn load_from_path(&mut self, path: &Path) -> Result<Config> {
        if !path.exists() {
            return Err(Error::ConfigLoadFailed {
                path: path.to_path_buf(),
                reason: "Configuration file does not exist".to_string(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| Error::ConfigLoadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config = Self::parse(&content, ConfigFormat::from_path(path))?;
        config.validate()?;

        info!("Configuration loaded from {}", path.display());
        self.current_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse configuration text in the given format
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Config> {
        match format {
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| Error::ConfigParseFailed {
                format: format.name().to_string(),
                reason: e.to_string(),
            }),
            ConfigFormat::Json => {
                serde_json::from_str(content).map_err(|e| Error::ConfigParseFailed {
                    format: format.name().to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Default search paths, in order: `./shellrelay.toml`, the platform
    /// config dir (`dirs::config_dir()`), then `~/.shellrelay.toml`
    fn get_search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("shellrelay.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("shellrelay").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".shellrelay.toml"));
        }

        paths
    }

    /// Get the current configuration file path
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    /// List all search paths
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
