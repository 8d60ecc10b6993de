//! # Filter Engine
//!
//! 在内存记录集上求值谓词，不触碰磁盘。
//!
//! ## 行为
//!
//! - 按输入顺序保留匹配项
//! - `limit > 0` 时找到 `limit` 个匹配后立即停止扫描
//! - 每次迭代检查取消信号；取消时返回已累积的部分结果，
//!   并将 `cancelled` 置为 `true`，调用方应视为尽力而为的结果
//!
//! ## 示例
//!
//! ```rust
//! use gripe_core::filter::{self, project_is, severity_is, unresolved};
//! use gripe_types::{Complaint, NewComplaint, Severity};
//! use tokio_util::sync::CancellationToken;
//!
//! let records = vec![Complaint::create(NewComplaint {
//!     task_description: "flaky test".to_string(),
//!     severity: Severity::High,
//!     project_name: Some("ci".to_string()),
//!     ..Default::default()
//! })];
//!
//! let query = severity_is(Severity::High)
//!     .and(project_is("ci"))
//!     .and(unresolved());
//! let outcome = filter::apply(&CancellationToken::new(), &records, &query, 0);
//! assert_eq!(outcome.matches.len(), 1);
//! ```

mod predicate;

use std::borrow::Borrow;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use gripe_types::Complaint;

pub use predicate::{
    all_of, any_of, negate, project_is, severity_is, text_contains, unresolved, Predicate,
};

/// 过滤结果
#[derive(Debug, Clone)]
pub struct FilterOutcome<T> {
    /// 匹配的记录 (保持输入顺序)
    pub matches: Vec<T>,
    /// 已扫描的记录数
    pub scanned: usize,
    /// 扫描是否因取消而提前结束
    pub cancelled: bool,
}

impl<T> FilterOutcome<T> {
    pub fn into_matches(self) -> Vec<T> {
        self.matches
    }
}

/// 对 `records` 应用 `predicate`
///
/// # 参数
/// - `ctx`: 取消信号
/// - `records`: 输入记录
/// - `predicate`: 过滤谓词
/// - `limit`: 最大匹配数，0 表示不限
pub fn apply<T>(
    ctx: &CancellationToken,
    records: &[T],
    predicate: &Predicate,
    limit: usize,
) -> FilterOutcome<T>
where
    T: Borrow<Complaint> + Clone,
{
    let mut matches = Vec::new();
    let mut scanned = 0;

    for record in records {
        if ctx.is_cancelled() {
            debug!(scanned, matched = matches.len(), "filter scan cancelled");
            return FilterOutcome {
                matches,
                scanned,
                cancelled: true,
            };
        }

        scanned += 1;
        let complaint: &Complaint = Borrow::<Complaint>::borrow(record);
        if predicate.matches(complaint) {
            matches.push(record.clone());
            if limit > 0 && matches.len() >= limit {
                break;
            }
        }
    }

    FilterOutcome {
        matches,
        scanned,
        cancelled: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gripe_types::{NewComplaint, Severity};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn complaint(task: &str, severity: Severity, project: &str) -> Complaint {
        Complaint::create(NewComplaint {
            task_description: task.to_string(),
            severity,
            project_name: Some(project.to_string()),
            ..Default::default()
        })
    }

    fn fixture() -> Vec<Complaint> {
        let mut resolved = complaint("resolved one", Severity::High, "alpha");
        resolved.resolve("ops");
        vec![
            complaint("parse error", Severity::High, "alpha"),
            complaint("slow build", Severity::Low, "alpha"),
            complaint("missing docs", Severity::Medium, "beta"),
            complaint("crash on start", Severity::Critical, "beta"),
            resolved,
        ]
    }

    fn ids(records: &[Complaint], p: &Predicate) -> HashSet<String> {
        apply(&CancellationToken::new(), records, p, 0)
            .matches
            .into_iter()
            .map(|c| c.id)
            .collect()
    }

    #[test]
    fn test_keeps_input_order() {
        let records = fixture();
        let outcome = apply(&CancellationToken::new(), &records, &project_is("alpha"), 0);
        let tasks: Vec<_> = outcome.matches.iter().map(|c| c.task_description.as_str()).collect();
        assert_eq!(tasks, vec!["parse error", "slow build", "resolved one"]);
        assert!(!outcome.cancelled);
    }

    #[test]
    fn test_limit_stops_scan_early() {
        let records = fixture();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let p = Predicate::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });

        let outcome = apply(&CancellationToken::new(), &records, &p, 2);
        assert_eq!(outcome.matches.len(), 2);
        assert_eq!(outcome.scanned, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_and_is_intersection() {
        let records = fixture();
        let f1 = project_is("alpha");
        let f2 = severity_is(Severity::High);
        let both = ids(&records, &f1.clone().and(f2.clone()));
        let expected: HashSet<_> = ids(&records, &f1)
            .intersection(&ids(&records, &f2))
            .cloned()
            .collect();
        assert_eq!(both, expected);
        assert_eq!(both.len(), 2);
    }

    #[test]
    fn test_or_is_union() {
        let records = fixture();
        let f1 = project_is("beta");
        let f2 = severity_is(Severity::Low);
        let either = ids(&records, &f1.clone().or(f2.clone()));
        let expected: HashSet<_> = ids(&records, &f1).union(&ids(&records, &f2)).cloned().collect();
        assert_eq!(either, expected);
        assert_eq!(either.len(), 3);
    }

    #[test]
    fn test_not_is_complement() {
        let records = fixture();
        let f = unresolved();
        let inverse = ids(&records, &negate(f.clone()));
        let positive = ids(&records, &f);
        assert!(inverse.is_disjoint(&positive));
        assert_eq!(inverse.len() + positive.len(), records.len());
        assert_eq!(inverse.len(), 1);
    }

    #[test]
    fn test_nested_combinators() {
        let records = fixture();
        // (alpha AND NOT high) OR critical
        let p = any_of(vec![
            all_of(vec![project_is("alpha"), negate(severity_is(Severity::High))]),
            severity_is(Severity::Critical),
        ]);
        let outcome = apply(&CancellationToken::new(), &records, &p, 0);
        let tasks: Vec<_> = outcome.matches.iter().map(|c| c.task_description.as_str()).collect();
        assert_eq!(tasks, vec!["slow build", "crash on start"]);
    }

    #[test]
    fn test_empty_combinators() {
        let records = fixture();
        assert_eq!(ids(&records, &all_of(vec![])).len(), records.len());
        assert!(ids(&records, &any_of(vec![])).is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let records = fixture();
        assert_eq!(ids(&records, &text_contains("PARSE")).len(), 1);
        assert_eq!(ids(&records, &text_contains("Crash On")).len(), 1);
        assert!(ids(&records, &text_contains("nothing like this")).is_empty());
    }

    #[test]
    fn test_search_covers_every_text_field() {
        let base = NewComplaint {
            task_description: "task".to_string(),
            ..Default::default()
        };
        let variants = vec![
            NewComplaint { task_description: "needle in task".to_string(), ..base.clone() },
            NewComplaint { context: "needle".to_string(), ..base.clone() },
            NewComplaint { missing_info: "needle".to_string(), ..base.clone() },
            NewComplaint { confusion_notes: "needle".to_string(), ..base.clone() },
            NewComplaint { future_wishes: "needle".to_string(), ..base.clone() },
            NewComplaint { agent_name: Some("needle-bot".to_string()), ..base.clone() },
            NewComplaint { session_id: Some("needle-42".to_string()), ..base.clone() },
            NewComplaint { project_name: Some("needles".to_string()), ..base.clone() },
        ];
        let records: Vec<Complaint> = variants.into_iter().map(Complaint::create).collect();
        let miss = Complaint::create(base);

        let p = text_contains("NEEDLE");
        for r in &records {
            assert!(p.matches(r), "field not searched: {:?}", r);
        }
        assert!(!p.matches(&miss));
    }

    #[test]
    fn test_cancelled_before_scan_returns_empty_partial() {
        let records = fixture();
        let ctx = CancellationToken::new();
        ctx.cancel();
        let outcome = apply(&ctx, &records, &Predicate::always(), 0);
        assert!(outcome.cancelled);
        assert!(outcome.matches.is_empty());
        assert_eq!(outcome.scanned, 0);
    }

    #[test]
    fn test_cancel_mid_scan_keeps_partial_result() {
        let records = fixture();
        let ctx = CancellationToken::new();
        let trigger = ctx.clone();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let p = Predicate::new(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 1 {
                trigger.cancel();
            }
            true
        });

        let outcome = apply(&ctx, &records, &p, 0);
        assert!(outcome.cancelled);
        assert_eq!(outcome.matches.len(), 2);
        assert_eq!(outcome.matches[0].id, records[0].id);
    }

    #[test]
    fn test_works_over_shared_records() {
        let records: Vec<Arc<Complaint>> = fixture().into_iter().map(Arc::new).collect();
        let outcome = apply(&CancellationToken::new(), &records, &severity_is(Severity::Low), 0);
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].task_description, "slow build");
    }
}
