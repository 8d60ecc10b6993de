//! # Complaint Repository
//!
//! Storage contract consumed by the service layer. Two implementations share
//! it so callers and tests are agnostic to which one is in use:
//!
//! - [`CachedRepository`]: write-through to disk, every read served from the
//!   in-memory LRU cache
//! - [`FileRepository`]: every call goes to disk
//!
//! All methods take a [`CancellationToken`] first; it is threaded into the
//! filter engine so callers can bound query latency.

mod cached;
mod file;

use std::cmp::Ordering;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use gripe_types::{CacheStats, Complaint, Severity};

use crate::error::Result;

pub use cached::CachedRepository;
pub use file::FileRepository;

#[async_trait]
pub trait ComplaintRepository: Send + Sync {
    /// Persist a complaint to its canonical file and make it visible to reads.
    async fn save(&self, ctx: &CancellationToken, complaint: &Complaint) -> Result<()>;

    async fn find_by_id(&self, ctx: &CancellationToken, id: &str) -> Result<Complaint>;

    /// Newest first. `offset >= total` yields an empty page.
    async fn find_all(
        &self,
        ctx: &CancellationToken,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Complaint>>;

    async fn find_by_severity(
        &self,
        ctx: &CancellationToken,
        severity: Severity,
        limit: usize,
    ) -> Result<Vec<Complaint>>;

    async fn find_by_project(
        &self,
        ctx: &CancellationToken,
        project: &str,
        limit: usize,
    ) -> Result<Vec<Complaint>>;

    async fn find_unresolved(&self, ctx: &CancellationToken, limit: usize)
        -> Result<Vec<Complaint>>;

    /// Copy the mutable fields of `complaint` onto the stored record with the
    /// same ID and persist the result. Unknown IDs are `NotFound`.
    async fn update(&self, ctx: &CancellationToken, complaint: &Complaint) -> Result<Complaint>;

    async fn search(
        &self,
        ctx: &CancellationToken,
        query: &str,
        limit: usize,
    ) -> Result<Vec<Complaint>>;

    /// Bulk-load every record from disk. Returns the number loaded.
    async fn warm_cache(&self, ctx: &CancellationToken) -> Result<usize>;

    /// `None` when the implementation has no cache.
    async fn cache_stats(&self, ctx: &CancellationToken) -> Option<CacheStats>;
}

/// Newest first; ties broken by ID so pages are stable.
pub(crate) fn newest_first(a: &Complaint, b: &Complaint) -> Ordering {
    b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id))
}

/// `start = offset`, `end = min(offset + limit, total)`.
pub(crate) fn paginate<T>(items: Vec<T>, limit: usize, offset: usize) -> Vec<T> {
    if offset >= items.len() {
        return Vec::new();
    }
    let end = offset.saturating_add(limit).min(items.len());
    items.into_iter().skip(offset).take(end - offset).collect()
}
