//! # Complaint Service
//!
//! 投诉管理服务，位于协议层与仓库之间。
//!
//! ## 职责
//!
//! - 入库前校验 (`Complaint::validate`)
//! - 解析分页参数，缺省时使用 `server.default_page_size`
//! - 读-改-写操作 (`amend`/`resolve`) 串行执行，避免相互覆盖
//!
//! 服务本身不持有任何记录，全部状态在 [`ComplaintRepository`] 中。

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use gripe_types::{CacheStats, Complaint, ComplaintPatch, NewComplaint, Severity};

use crate::config::ServerConfig;
use crate::error::{GripeError, Result};
use crate::repository::ComplaintRepository;

/// 列表选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// 每页数量，`None` 或 0 使用默认值
    pub limit: Option<usize>,
    /// 跳过的记录数
    pub offset: usize,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

/// 投诉服务
pub struct ComplaintService {
    repo: Arc<dyn ComplaintRepository>,
    default_page_size: usize,
    /// 读-改-写互斥锁
    edits: Mutex<()>,
}

impl ComplaintService {
    pub fn new(repo: Arc<dyn ComplaintRepository>, config: &ServerConfig) -> Self {
        Self {
            repo,
            default_page_size: config.default_page_size,
            edits: Mutex::new(()),
        }
    }

    pub fn repository(&self) -> &Arc<dyn ComplaintRepository> {
        &self.repo
    }

    fn page_size(&self, limit: Option<usize>) -> usize {
        limit.filter(|n| *n > 0).unwrap_or(self.default_page_size)
    }

    /// 提交一条新投诉
    pub async fn file_complaint(
        &self,
        ctx: &CancellationToken,
        input: NewComplaint,
    ) -> Result<Complaint> {
        let complaint = Complaint::create(input);
        complaint.validate()?;
        self.repo.save(ctx, &complaint).await?;
        info!(id = %complaint.id, severity = %complaint.severity, "complaint filed");
        Ok(complaint)
    }

    /// 查看投诉详情
    pub async fn get_complaint(&self, ctx: &CancellationToken, id: &str) -> Result<Complaint> {
        gripe_types::validate_id(id)?;
        self.repo.find_by_id(ctx, id).await
    }

    /// 列出投诉，按创建时间倒序
    pub async fn list(&self, ctx: &CancellationToken, options: ListOptions) -> Result<Vec<Complaint>> {
        let limit = self.page_size(options.limit);
        self.repo.find_all(ctx, limit, options.offset).await
    }

    pub async fn list_by_severity(
        &self,
        ctx: &CancellationToken,
        severity: Severity,
        limit: Option<usize>,
    ) -> Result<Vec<Complaint>> {
        self.repo
            .find_by_severity(ctx, severity, self.page_size(limit))
            .await
    }

    pub async fn list_by_project(
        &self,
        ctx: &CancellationToken,
        project: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Complaint>> {
        if project.trim().is_empty() {
            return Err(GripeError::invalid_input("project name must not be empty"));
        }
        self.repo
            .find_by_project(ctx, project, self.page_size(limit))
            .await
    }

    pub async fn list_unresolved(
        &self,
        ctx: &CancellationToken,
        limit: Option<usize>,
    ) -> Result<Vec<Complaint>> {
        self.repo.find_unresolved(ctx, self.page_size(limit)).await
    }

    /// 全文搜索，大小写不敏感；空查询被拒绝
    pub async fn search(
        &self,
        ctx: &CancellationToken,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Complaint>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GripeError::invalid_input("search query must not be empty"));
        }
        let results = self.repo.search(ctx, query, self.page_size(limit)).await?;
        debug!(query, returned = results.len(), "search finished");
        Ok(results)
    }

    /// 修改投诉的可变文本字段
    pub async fn amend(
        &self,
        ctx: &CancellationToken,
        id: &str,
        patch: ComplaintPatch,
    ) -> Result<Complaint> {
        if patch.is_empty() {
            return Err(GripeError::invalid_input("patch contains no fields to update"));
        }

        let _edit = self.edits.lock().await;
        let mut complaint = self.get_complaint(ctx, id).await?;
        complaint.apply(patch);
        complaint.validate()?;

        let updated = self.repo.update(ctx, &complaint).await?;
        info!(id, "complaint amended");
        Ok(updated)
    }

    /// 标记投诉为已解决
    ///
    /// 已解决的投诉再次解决返回 `Conflict`。
    pub async fn resolve(
        &self,
        ctx: &CancellationToken,
        id: &str,
        resolved_by: &str,
    ) -> Result<Complaint> {
        let _edit = self.edits.lock().await;
        let mut complaint = self.get_complaint(ctx, id).await?;
        if let Some(resolution) = &complaint.resolution {
            return Err(GripeError::conflict(format!(
                "complaint {} already resolved by {} at {}",
                id,
                resolution.resolved_by,
                resolution.resolved_at.to_rfc3339()
            )));
        }

        complaint.resolve(resolved_by.trim());
        complaint.validate()?;

        let updated = self.repo.update(ctx, &complaint).await?;
        info!(id, resolved_by = resolved_by.trim(), "complaint resolved");
        Ok(updated)
    }

    pub async fn cache_stats(&self, ctx: &CancellationToken) -> Option<CacheStats> {
        self.repo.cache_stats(ctx).await
    }
}
