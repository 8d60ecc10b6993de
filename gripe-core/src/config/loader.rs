//! # Configuration Loader
//!
//! Loads configuration from multiple sources with priority:
//! 1. Environment variables (highest)
//! 2. Config file
//! 3. Default values (lowest)

use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use super::GripeConfig;
use crate::error::{GripeError, Result};
use crate::store::StorageLayout;

/// Environment variable pointing at an explicit config file
pub const CONFIG_PATH_ENV: &str = "GRIPE_CONFIG";

/// File name searched for in the working directory
pub const LOCAL_CONFIG_FILE: &str = "gripe.toml";

/// Configuration loader
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env_prefix: String,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new config loader with the default search path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
            env_prefix: "GRIPE".to_string(),
        }
    }

    /// Create a config loader with a specific config file path
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: Some(path.into()),
            env_prefix: "GRIPE".to_string(),
        }
    }

    /// Set environment variable prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Config file in use, if any
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// `$GRIPE_CONFIG`, then `./gripe.toml`, then `<config dir>/gripe/config.toml`
    fn default_config_path() -> Option<PathBuf> {
        if let Ok(path) = env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }

        dirs::config_dir()
            .map(|d| d.join("gripe").join("config.toml"))
            .filter(|p| p.exists())
    }

    /// Load configuration from all sources
    pub fn load(&self) -> Result<GripeConfig> {
        let mut config = GripeConfig::default();

        if let Some(ref path) = self.config_path {
            if path.exists() {
                let file_config = self.load_from_file(path)?;
                config = self.merge_file_config(config, file_config);
                info!(path = %path.display(), "configuration file loaded");
            } else {
                debug!(path = %path.display(), "configuration file not found, using defaults");
            }
        }

        config = self.merge_env_config(config)?;
        config.validate()?;

        Ok(config)
    }

    fn load_from_file(&self, path: &Path) -> Result<FileConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GripeError::configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        toml::from_str(&content).map_err(|e| {
            GripeError::configuration(format!(
                "Failed to parse config file {}: {}",
                path.display(),
                e
            ))
        })
    }

    fn merge_file_config(&self, mut base: GripeConfig, file: FileConfig) -> GripeConfig {
        if let Some(storage) = file.storage {
            if let Some(data_dir) = storage.data_dir {
                base.storage.data_dir = data_dir;
            }
            if let Some(layout) = storage.layout {
                base.storage.layout = layout;
            }
        }

        if let Some(cache) = file.cache {
            if let Some(max_entries) = cache.max_entries {
                base.cache.max_entries = max_entries;
            }
        }

        if let Some(server) = file.server {
            if let Some(timeout) = server.query_timeout_ms {
                base.server.query_timeout_ms = timeout;
            }
            if let Some(page_size) = server.default_page_size {
                base.server.default_page_size = page_size;
            }
        }

        base
    }

    fn env_var(&self, key: &str) -> Option<(String, String)> {
        let name = format!("{}_{}", self.env_prefix, key);
        env::var(&name).ok().map(|value| (name, value))
    }

    fn merge_env_config(&self, mut config: GripeConfig) -> Result<GripeConfig> {
        if let Some((_, val)) = self.env_var("DATA_DIR") {
            config.storage.data_dir = PathBuf::from(val);
        }
        if let Some((name, val)) = self.env_var("STORAGE_LAYOUT") {
            config.storage.layout = parse_layout(&name, &val)?;
        }

        if let Some((name, val)) = self.env_var("CACHE_MAX_ENTRIES") {
            config.cache.max_entries = parse_usize(&name, &val)?;
        }

        if let Some((name, val)) = self.env_var("QUERY_TIMEOUT_MS") {
            config.server.query_timeout_ms = parse_u64(&name, &val)?;
        }
        if let Some((name, val)) = self.env_var("DEFAULT_PAGE_SIZE") {
            config.server.default_page_size = parse_usize(&name, &val)?;
        }

        Ok(config)
    }
}

/// File configuration structure (all fields optional)
#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    storage: Option<FileStorageConfig>,
    cache: Option<FileCacheConfig>,
    server: Option<FileServerConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FileStorageConfig {
    data_dir: Option<PathBuf>,
    layout: Option<StorageLayout>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FileCacheConfig {
    max_entries: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FileServerConfig {
    query_timeout_ms: Option<u64>,
    default_page_size: Option<usize>,
}

// Parse helpers

fn parse_usize(name: &str, val: &str) -> Result<usize> {
    val.trim()
        .parse()
        .map_err(|_| GripeError::configuration(format!("Invalid {}: {}", name, val)))
}

fn parse_u64(name: &str, val: &str) -> Result<u64> {
    val.trim()
        .parse()
        .map_err(|_| GripeError::configuration(format!("Invalid {}: {}", name, val)))
}

fn parse_layout(name: &str, val: &str) -> Result<StorageLayout> {
    val.parse()
        .map_err(|e| GripeError::configuration(format!("Invalid {}: {}", name, e)))
}
