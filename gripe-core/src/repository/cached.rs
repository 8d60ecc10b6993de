//! # Cached Repository
//!
//! 写穿 (write-through) 缓存仓库。
//!
//! ## 数据流
//!
//! ```text
//! 写: caller ─→ save ─→ ComplaintStore (磁盘) ─→ LruCache
//! 读: caller ─→ LruCache ─→ filter::apply
//! ```
//!
//! ## 一致性
//!
//! - 磁盘写入成功后才更新缓存；写入失败时缓存保持不变
//! - `update` 与 `save` 共用同一落盘路径，成功后缓存与磁盘不会分叉
//! - 写操作 (`save`/`update`) 由一把异步互斥锁串行化，保证落盘顺序与
//!   入缓存顺序一致；该锁与缓存锁相互独立，读路径不受影响
//! - `find_by_id` 未命中直接返回 NotFound，不回退到磁盘。
//!   被淘汰的记录在下次 `warm_cache` 前不可见
//!
//! ## 启动
//!
//! 构造后、对外服务前调用一次 `warm_cache`。

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use gripe_types::{CacheStats, Complaint, Severity};

use super::{newest_first, paginate, ComplaintRepository};
use crate::cache::{CacheConfig, LruCache};
use crate::error::{GripeError, Result};
use crate::filter::{self, project_is, severity_is, text_contains, unresolved, Predicate};
use crate::store::ComplaintStore;

/// 基于 LRU 缓存的投诉仓库
pub struct CachedRepository {
    store: ComplaintStore,
    cache: LruCache<String, Arc<Complaint>>,
    /// 写者互斥锁
    writer: Mutex<()>,
}

impl CachedRepository {
    /// 创建缓存仓库
    ///
    /// 缓存容量非法时返回配置错误。
    pub fn new(store: ComplaintStore, config: CacheConfig) -> Result<Self> {
        let cache = LruCache::new(config)?;
        Ok(Self {
            store,
            cache,
            writer: Mutex::new(()),
        })
    }

    pub fn store(&self) -> &ComplaintStore {
        &self.store
    }

    pub fn cache(&self) -> &LruCache<String, Arc<Complaint>> {
        &self.cache
    }

    /// 落盘后写入缓存，调用方需持有写者锁
    async fn persist(&self, complaint: &Complaint) -> Result<()> {
        // 先落盘，失败则缓存不变
        self.store.write(complaint).await?;

        if let Some(evicted) = self
            .cache
            .put(complaint.id.clone(), Arc::new(complaint.clone()))
        {
            debug!(evicted = %evicted, "cache full, evicted least recently used complaint");
        }
        Ok(())
    }

    /// 缓存中全部记录，按创建时间倒序
    ///
    /// 过滤查询同样先排序再扫描：带 `limit` 的提前终止必须落在最新的
    /// 匹配记录上，结果才与磁盘仓库一致。代价是每次查询 O(n log n)，
    /// 提前终止只省下谓词求值。排序只移动 `Arc` 指针，且 (时间, id)
    /// 全序下无需稳定排序。
    fn snapshot(&self) -> Vec<Arc<Complaint>> {
        let mut all = self.cache.get_all();
        all.sort_unstable_by(|a, b| newest_first(a, b));
        all
    }

    fn query(
        &self,
        ctx: &CancellationToken,
        predicate: &Predicate,
        limit: usize,
        query: &'static str,
    ) -> Vec<Complaint> {
        let records = self.snapshot();
        let outcome = filter::apply(ctx, &records, predicate, limit);

        if outcome.cancelled {
            warn!(
                query,
                scanned = outcome.scanned,
                total = records.len(),
                returned = outcome.matches.len(),
                "query cancelled, returning partial result"
            );
        } else {
            debug!(
                query,
                scanned = outcome.scanned,
                returned = outcome.matches.len(),
                "query served from cache"
            );
        }

        outcome
            .matches
            .into_iter()
            .map(|c| Complaint::clone(&c))
            .collect()
    }
}

#[async_trait]
impl ComplaintRepository for CachedRepository {
    #[instrument(skip(self, _ctx, complaint), fields(id = %complaint.id))]
    async fn save(&self, _ctx: &CancellationToken, complaint: &Complaint) -> Result<()> {
        let _writer = self.writer.lock().await;
        self.persist(complaint).await?;
        info!(severity = %complaint.severity, project = %complaint.project_name, "complaint saved");
        Ok(())
    }

    #[instrument(skip(self, _ctx))]
    async fn find_by_id(&self, _ctx: &CancellationToken, id: &str) -> Result<Complaint> {
        match self.cache.get(id) {
            Some(c) => Ok(Complaint::clone(&c)),
            None => {
                debug!("cache miss");
                Err(GripeError::not_found(format!("complaint {}", id)))
            }
        }
    }

    #[instrument(skip(self, _ctx))]
    async fn find_all(
        &self,
        _ctx: &CancellationToken,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Complaint>> {
        let page = paginate(self.snapshot(), limit, offset);
        debug!(returned = page.len(), "listed complaints");
        Ok(page.into_iter().map(|c| Complaint::clone(&c)).collect())
    }

    #[instrument(skip(self, ctx))]
    async fn find_by_severity(
        &self,
        ctx: &CancellationToken,
        severity: Severity,
        limit: usize,
    ) -> Result<Vec<Complaint>> {
        Ok(self.query(ctx, &severity_is(severity), limit, "severity"))
    }

    #[instrument(skip(self, ctx))]
    async fn find_by_project(
        &self,
        ctx: &CancellationToken,
        project: &str,
        limit: usize,
    ) -> Result<Vec<Complaint>> {
        Ok(self.query(ctx, &project_is(project), limit, "project"))
    }

    #[instrument(skip(self, ctx))]
    async fn find_unresolved(
        &self,
        ctx: &CancellationToken,
        limit: usize,
    ) -> Result<Vec<Complaint>> {
        Ok(self.query(ctx, &unresolved(), limit, "unresolved"))
    }

    #[instrument(skip(self, _ctx, complaint), fields(id = %complaint.id))]
    async fn update(&self, _ctx: &CancellationToken, complaint: &Complaint) -> Result<Complaint> {
        let _writer = self.writer.lock().await;
        // 调用方通常刚读过该记录，这里不再计一次命中
        let existing = self
            .cache
            .peek(complaint.id.as_str())
            .ok_or_else(|| GripeError::not_found(format!("complaint {}", complaint.id)))?;

        let mut merged = Complaint::clone(&existing);
        merged.merge_mutable_from(complaint);
        self.persist(&merged).await?;
        info!(resolved = merged.is_resolved(), "complaint updated");
        Ok(merged)
    }

    #[instrument(skip(self, ctx))]
    async fn search(
        &self,
        ctx: &CancellationToken,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Complaint>> {
        Ok(self.query(ctx, &text_contains(query), limit, "search"))
    }

    #[instrument(skip(self, _ctx))]
    async fn warm_cache(&self, _ctx: &CancellationToken) -> Result<usize> {
        let mut report = self.store.load_all().await?;
        let loaded = report.complaints.len();

        if loaded > self.cache.max_size() {
            warn!(
                loaded,
                capacity = self.cache.max_size(),
                "more complaints on disk than cache capacity, oldest will be evicted"
            );
        }

        // 目录遍历顺序与时间无关；由旧到新写入，容量不足时保留最新的记录
        report.complaints.sort_unstable_by(|a, b| newest_first(b, a));

        for complaint in report.complaints {
            self.cache.put(complaint.id.clone(), Arc::new(complaint));
        }

        info!(
            loaded,
            skipped = report.skipped.len(),
            cached = self.cache.len(),
            root = %self.store.root().display(),
            "cache warmed"
        );
        Ok(loaded)
    }

    async fn cache_stats(&self, _ctx: &CancellationToken) -> Option<CacheStats> {
        Some(self.cache.stats())
    }
}
