//! Plain file-backed repository: every call reads or writes disk.
//!
//! Used when the cache is disabled, and as the reference behaviour the cached
//! repository is tested against.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use gripe_types::{CacheStats, Complaint, Severity};

use super::{newest_first, paginate, ComplaintRepository};
use crate::error::Result;
use crate::filter::{self, project_is, severity_is, text_contains, unresolved, Predicate};
use crate::store::ComplaintStore;

pub struct FileRepository {
    store: ComplaintStore,
}

impl FileRepository {
    pub fn new(store: ComplaintStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &ComplaintStore {
        &self.store
    }

    async fn load_sorted(&self) -> Result<Vec<Complaint>> {
        let mut all = self.store.load_all().await?.complaints;
        all.sort_by(newest_first);
        Ok(all)
    }

    async fn query(
        &self,
        ctx: &CancellationToken,
        predicate: &Predicate,
        limit: usize,
    ) -> Result<Vec<Complaint>> {
        let records = self.load_sorted().await?;
        let outcome = filter::apply(ctx, &records, predicate, limit);
        if outcome.cancelled {
            warn!(scanned = outcome.scanned, "query cancelled, returning partial result");
        }
        Ok(outcome.into_matches())
    }
}

#[async_trait]
impl ComplaintRepository for FileRepository {
    #[instrument(skip(self, _ctx, complaint), fields(id = %complaint.id))]
    async fn save(&self, _ctx: &CancellationToken, complaint: &Complaint) -> Result<()> {
        self.store.write(complaint).await?;
        info!("complaint saved");
        Ok(())
    }

    #[instrument(skip(self, _ctx))]
    async fn find_by_id(&self, _ctx: &CancellationToken, id: &str) -> Result<Complaint> {
        self.store.read(id).await
    }

    #[instrument(skip(self, _ctx))]
    async fn find_all(
        &self,
        _ctx: &CancellationToken,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Complaint>> {
        let page = paginate(self.load_sorted().await?, limit, offset);
        debug!(returned = page.len(), "listed complaints");
        Ok(page)
    }

    #[instrument(skip(self, ctx))]
    async fn find_by_severity(
        &self,
        ctx: &CancellationToken,
        severity: Severity,
        limit: usize,
    ) -> Result<Vec<Complaint>> {
        self.query(ctx, &severity_is(severity), limit).await
    }

    #[instrument(skip(self, ctx))]
    async fn find_by_project(
        &self,
        ctx: &CancellationToken,
        project: &str,
        limit: usize,
    ) -> Result<Vec<Complaint>> {
        self.query(ctx, &project_is(project), limit).await
    }

    #[instrument(skip(self, ctx))]
    async fn find_unresolved(
        &self,
        ctx: &CancellationToken,
        limit: usize,
    ) -> Result<Vec<Complaint>> {
        self.query(ctx, &unresolved(), limit).await
    }

    #[instrument(skip(self, ctx, complaint), fields(id = %complaint.id))]
    async fn update(&self, ctx: &CancellationToken, complaint: &Complaint) -> Result<Complaint> {
        let mut merged = self.store.read(&complaint.id).await?;
        merged.merge_mutable_from(complaint);
        self.save(ctx, &merged).await?;
        Ok(merged)
    }

    #[instrument(skip(self, ctx))]
    async fn search(
        &self,
        ctx: &CancellationToken,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Complaint>> {
        self.query(ctx, &text_contains(query), limit).await
    }

    async fn warm_cache(&self, _ctx: &CancellationToken) -> Result<usize> {
        Ok(0)
    }

    async fn cache_stats(&self, _ctx: &CancellationToken) -> Option<CacheStats> {
        None
    }
}
