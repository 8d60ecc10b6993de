//! # Cache Module
//!
//! 投诉记录的内存缓存层。
//!
//! ## 模块结构
//!
//! - `config`: 缓存配置
//! - `list`: 下标双向链表 (访问顺序)
//! - `lru`: LRU 缓存核心实现
//! - `metrics`: 原子统计计数器
//!
//! ## 特性
//!
//! - LRU 淘汰策略，容量严格受限
//! - 线程安全
//! - 缓存统计
//!
//! 缓存本身不了解磁盘和过滤逻辑，由 `repository::cached` 负责编排。

pub mod config;
mod list;
pub mod lru;
pub mod metrics;

pub use config::{CacheConfig, DEFAULT_MAX_ENTRIES};
pub use lru::LruCache;
pub use metrics::CacheMetrics;
