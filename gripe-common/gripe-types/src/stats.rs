use serde::{Deserialize, Serialize};

/// 缓存统计快照
///
/// `hit_rate` 为百分比 (0.0 - 100.0)，在生成快照时计算，不单独存储。
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub current_size: usize,
    pub max_size: usize,
    pub hit_rate: f64,
}

impl CacheStats {
    /// 查找总次数
    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }
}
