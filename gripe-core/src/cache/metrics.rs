//! # Cache Metrics
//!
//! 缓存统计指标。所有计数器均为原子变量，读取无需持有缓存锁。
//! 统计只是观测副作用，不会影响缓存行为。

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use gripe_types::CacheStats;

/// 缓存统计指标
#[derive(Debug)]
pub struct CacheMetrics {
    /// 命中次数
    hits: AtomicU64,
    /// 未命中次数
    misses: AtomicU64,
    /// 淘汰次数
    evictions: AtomicU64,
    /// 当前条目数
    current_size: AtomicUsize,
    /// 最大条目数 (构造时确定)
    max_size: usize,
}

impl CacheMetrics {
    /// 创建新的统计实例
    pub fn new(max_size: usize) -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            current_size: AtomicUsize::new(0),
            max_size,
        }
    }

    /// 记录命中
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录未命中
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// 记录淘汰
    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// 更新当前大小
    pub fn set_size(&self, size: usize) {
        self.current_size.store(size, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    pub fn current_size(&self) -> usize {
        self.current_size.load(Ordering::Relaxed)
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// 计算命中率 (0.0 - 100.0)
    ///
    /// 尚无查找时返回 0。
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            return 0.0;
        }
        (hits as f64) / (total as f64) * 100.0
    }

    /// 获取统计快照
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits(),
            misses: self.misses(),
            evictions: self.evictions(),
            current_size: self.current_size(),
            max_size: self.max_size,
            hit_rate: self.hit_rate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_without_lookups_is_zero() {
        let metrics = CacheMetrics::new(10);
        assert_eq!(metrics.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_is_percentage() {
        let metrics = CacheMetrics::new(10);
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_miss();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.hits, 3);
        assert_eq!(snapshot.misses, 1);
        assert_eq!(snapshot.lookups(), 4);
        assert!((snapshot.hit_rate - 75.0).abs() < f64::EPSILON);
        assert_eq!(snapshot.max_size, 10);
    }
}
