//! # Cache Configuration
//!
//! 缓存配置管理模块。
//!
//! ## 配置选项
//!
//! - `max_entries`: 最大缓存条目数，必须大于 0
//!
//! ## 示例
//!
//! ```rust
//! use gripe_core::cache::CacheConfig;
//!
//! // 使用默认配置
//! let config = CacheConfig::default();
//! assert!(config.validate().is_ok());
//!
//! // 自定义配置
//! let config = CacheConfig::new(2000);
//! assert_eq!(config.max_entries, 2000);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{GripeError, Result};

/// 默认最大缓存条目数
pub const DEFAULT_MAX_ENTRIES: usize = 10_000;

/// 缓存配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// 最大缓存条目数
    ///
    /// 超过此数量时，会触发 LRU 淘汰。
    /// 被淘汰的记录仍在磁盘上，但在下次预热前无法通过 ID 查到，
    /// 因此容量应大于预期的工作集。
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl CacheConfig {
    /// 创建新的缓存配置
    pub fn new(max_entries: usize) -> Self {
        Self { max_entries }
    }

    /// 设置最大缓存条目数
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// 验证配置是否有效
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(GripeError::configuration(
                "cache.max_entries must be greater than 0",
            ));
        }
        Ok(())
    }
}
