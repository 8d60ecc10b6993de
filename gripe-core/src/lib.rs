//! # Gripe Core Library
//!
//! Core library for Gripe, a durable complaint store for AI agents.
//!
//! Agents file short structured complaints about the tasks they were given
//! (missing information, confusing instructions, wishes for the future).
//! Each complaint is one JSON file on disk; an in-memory LRU cache mirrors the
//! record set so lookups, listings, filtered queries and text search never
//! rescan the disk.
//!
//! ## Architecture
//!
//! - **Store**: one JSON file per record, atomic temp-file + rename writes
//! - **Cache**: fixed-capacity LRU with atomic hit/miss/eviction counters
//! - **Filter**: composable predicates with cooperative cancellation
//! - **Repository**: write-through cached repository and a plain file one
//! - **Service**: validation, pagination defaults, resolve/amend workflows
//! - **Config**: defaults -> TOML file -> `GRIPE_*` environment
//!
//! ```text
//! write: service ─→ repository ─→ store (disk) ─→ cache
//! read:  service ─→ repository ─→ cache ─→ filter
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use gripe_core::{CachedRepository, ComplaintRepository, ComplaintService, ComplaintStore, GripeConfig};
//! use gripe_core::types::{NewComplaint, Severity};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> gripe_core::Result<()> {
//! let config = GripeConfig::load()?;
//! let store = ComplaintStore::open(&config.storage.data_dir, config.storage.layout).await?;
//! let repo = Arc::new(CachedRepository::new(store, config.cache.clone())?);
//!
//! let ctx = CancellationToken::new();
//! repo.warm_cache(&ctx).await?;
//!
//! let service = ComplaintService::new(repo, &config.server);
//! let filed = service
//!     .file_complaint(&ctx, NewComplaint {
//!         task_description: "refactor the parser".into(),
//!         missing_info: "which grammar version is canonical".into(),
//!         severity: Severity::High,
//!         ..Default::default()
//!     })
//!     .await?;
//! assert_eq!(service.get_complaint(&ctx, &filed.id).await?, filed);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod filter;
pub mod repository;
pub mod service;
pub mod store;

/// Record types shared with protocol adapters
pub use gripe_types as types;

pub use cache::{CacheConfig, LruCache};
pub use config::{ConfigLoader, GripeConfig, ServerConfig, StorageConfig};
pub use error::{GripeError, Result};
pub use filter::Predicate;
pub use repository::{CachedRepository, ComplaintRepository, FileRepository};
pub use service::{ComplaintService, ListOptions};
pub use store::{ComplaintStore, StorageLayout};
