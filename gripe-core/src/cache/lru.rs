//! # LRU Cache Implementation
//!
//! 线程安全的 LRU (Least Recently Used) 缓存实现。
//!
//! ## 特性
//!
//! - 基于 HashMap 索引 + 下标双向链表，get/put/evict 均为 O(1)
//! - 线程安全 (单个 `parking_lot::RwLock` 保护整个结构)
//! - 缓存统计 (命中、未命中、淘汰、当前大小)
//!
//! ## 不变量
//!
//! - `index.len() == list.len() <= max_size`
//! - 每个键在链表中恰好对应一个节点，反之亦然
//! - 链表头部始终是下一个淘汰候选
//!
//! ## 锁
//!
//! `get` 会修改访问顺序，因此与 `put`/`delete`/`clear` 一样取写锁；
//! `get_all`/`len`/`stats` 取读锁。锁内不做任何 I/O。
//!
//! ## 示例
//!
//! ```rust
//! use gripe_core::cache::{CacheConfig, LruCache};
//!
//! let cache: LruCache<String, u32> = LruCache::new(CacheConfig::new(2)).unwrap();
//! cache.put("a".to_string(), 1);
//! cache.put("b".to_string(), 2);
//! cache.get("a");
//! cache.put("c".to_string(), 3); // 淘汰 "b"
//!
//! assert_eq!(cache.get("b"), None);
//! assert_eq!(cache.stats().evictions, 1);
//! ```

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use parking_lot::RwLock;

use gripe_types::CacheStats;

use super::config::CacheConfig;
use super::list::{RecencyList, SlotId};
use super::metrics::CacheMetrics;
use crate::error::Result;

/// LRU 缓存内部状态
#[derive(Debug)]
struct LruState<K, V> {
    /// 键 -> 链表槽位
    index: HashMap<K, SlotId>,
    /// 访问顺序 (头部最久未访问 -> 尾部最近访问)
    list: RecencyList<(K, V)>,
}

/// LRU (Least Recently Used) 缓存
#[derive(Debug)]
pub struct LruCache<K, V> {
    max_size: usize,
    state: RwLock<LruState<K, V>>,
    metrics: CacheMetrics,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// 创建新的 LRU 缓存
    ///
    /// `max_entries == 0` 时返回配置错误。
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        let max_size = config.max_entries;
        Ok(Self {
            max_size,
            state: RwLock::new(LruState {
                index: HashMap::with_capacity(max_size.min(4096)),
                list: RecencyList::with_capacity(max_size.min(4096)),
            }),
            metrics: CacheMetrics::new(max_size),
        })
    }

    /// 获取缓存值
    ///
    /// 命中时移到最近访问端并计入命中；未命中计入未命中。
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut guard = self.state.write();
        let state = &mut *guard;

        match state.index.get(key).copied() {
            Some(id) => {
                state.list.move_to_back(id);
                self.metrics.record_hit();
                state.list.get(id).map(|(_, v)| v.clone())
            }
            None => {
                self.metrics.record_miss();
                None
            }
        }
    }

    /// 添加或更新缓存
    ///
    /// 已存在的键原地替换并移到最近访问端，不触发淘汰。
    /// 新键在缓存已满时先淘汰最久未访问的条目，大小始终不超过上限。
    ///
    /// # 返回
    /// - `Option<K>`: 被淘汰的键
    pub fn put(&self, key: K, value: V) -> Option<K> {
        let mut guard = self.state.write();
        let state = &mut *guard;

        if let Some(id) = state.index.get(&key).copied() {
            if let Some(entry) = state.list.get_mut(id) {
                entry.1 = value;
            }
            state.list.move_to_back(id);
            return None;
        }

        let mut evicted = None;
        if state.list.len() >= self.max_size {
            if let Some((old_key, _)) = state.list.pop_front() {
                state.index.remove(&old_key);
                self.metrics.record_eviction();
                evicted = Some(old_key);
            }
        }

        let id = state.list.push_back((key.clone(), value));
        state.index.insert(key, id);
        self.metrics.set_size(state.list.len());

        evicted
    }

    /// 删除指定键
    ///
    /// # 返回
    /// - `bool`: 键是否存在
    pub fn delete<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut guard = self.state.write();
        let state = &mut *guard;

        match state.index.remove(key) {
            Some(id) => {
                state.list.remove(id);
                self.metrics.set_size(state.list.len());
                true
            }
            None => false,
        }
    }

    /// 检查是否包含指定键 (不影响访问顺序与统计)
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.state.read().index.contains_key(key)
    }

    /// 读取值但不刷新访问顺序，也不计入命中/未命中
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let state = self.state.read();
        let slot = *state.index.get(key)?;
        state.list.get(slot).map(|(_, value)| value.clone())
    }

    /// 获取全部缓存值 (顺序不作保证)
    pub fn get_all(&self) -> Vec<V> {
        let state = self.state.read();
        state.list.iter().map(|(_, v)| v.clone()).collect()
    }

    /// 获取缓存大小
    pub fn len(&self) -> usize {
        self.state.read().list.len()
    }

    /// 检查缓存是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 清空缓存
    ///
    /// 只移除条目；命中/未命中/淘汰计数保留。
    pub fn clear(&self) {
        let mut state = self.state.write();
        state.index.clear();
        state.list.clear();
        self.metrics.set_size(0);
    }

    /// 获取缓存统计快照
    pub fn stats(&self) -> CacheStats {
        // 取读锁，让快照与当前大小保持一致
        let _state = self.state.read();
        self.metrics.snapshot()
    }

    /// 最大条目数
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// 按 LRU -> MRU 顺序列出键
    pub fn keys_by_recency(&self) -> Vec<K> {
        let state = self.state.read();
        state.list.iter().map(|(k, _)| k.clone()).collect()
    }

    #[cfg(test)]
    fn assert_invariants(&self) {
        let state = self.state.read();
        assert_eq!(state.index.len(), state.list.len());
        assert!(state.list.len() <= self.max_size);
        for (key, id) in &state.index {
            let (stored, _) = state.list.get(*id).expect("index points at empty slot");
            assert!(stored == key);
        }
        assert_eq!(self.metrics.current_size(), state.list.len());
    }
}
