//! # Gripe Configuration
//!
//! Unified configuration for the complaint store.
//!
//! ## Configuration Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Environment Variables           │
//! │    GRIPE_CACHE_MAX_ENTRIES=5000         │
//! ├─────────────────────────────────────────┤
//! │         Config File (gripe.toml)        │
//! │    [cache]                              │
//! │    max_entries = 5000                   │
//! ├─────────────────────────────────────────┤
//! │         Default Values                  │
//! └─────────────────────────────────────────┘
//! ```

mod loader;

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::CacheConfig;
use crate::error::{GripeError, Result};
use crate::store::StorageLayout;

pub use loader::ConfigLoader;

/// Default query timeout in milliseconds
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 5_000;

/// Default page size for listings when the caller gives none
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct GripeConfig {
    /// Record store configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Request handling configuration
    #[serde(default)]
    pub server: ServerConfig,
}

impl GripeConfig {
    /// Load configuration with full hierarchy (defaults -> file -> env)
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.storage.validate()?;
        self.cache.validate()?;
        self.server.validate()?;
        Ok(())
    }
}

/// Record store configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one JSON file per complaint
    pub data_dir: PathBuf,

    /// Flat or two-level sharded directory layout
    pub layout: StorageLayout,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            layout: StorageLayout::Flat,
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(GripeError::configuration("storage.data_dir must not be empty"));
        }
        Ok(())
    }
}

/// Request handling configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Per-request deadline; the filter scan is cancelled when it expires
    pub query_timeout_ms: u64,

    /// Page size used when a listing does not specify one
    pub default_page_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            query_timeout_ms: DEFAULT_QUERY_TIMEOUT_MS,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ServerConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.query_timeout_ms == 0 {
            return Err(GripeError::configuration(
                "server.query_timeout_ms must be greater than 0",
            ));
        }
        if self.default_page_size == 0 {
            return Err(GripeError::configuration(
                "server.default_page_size must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// `<data dir>/gripe/complaints`, falling back to `./complaints`
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("gripe").join("complaints"))
        .unwrap_or_else(|| PathBuf::from("complaints"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GripeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.storage.layout, StorageLayout::Flat);
        assert_eq!(config.server.query_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let mut config = GripeConfig::default();
        config.cache.max_entries = 0;
        assert!(matches!(config.validate(), Err(GripeError::Configuration(_))));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = GripeConfig::default();
        config.server.query_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = GripeConfig::default();
        let text = toml::to_string(&config).unwrap();
        let back: GripeConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, config);
    }
}
