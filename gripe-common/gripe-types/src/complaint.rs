use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::severity::Severity;

pub const DEFAULT_AGENT_NAME: &str = "unknown";
pub const DEFAULT_SESSION_ID: &str = "unknown";
pub const DEFAULT_PROJECT_NAME: &str = "default";

/// 单个文本字段的最大长度 (字符数)
pub const MAX_TEXT_LEN: usize = 10_000;
/// 标签字段 (agent/session/project) 的最大长度
pub const MAX_LABEL_LEN: usize = 256;

/// 解决标记
///
/// `resolved_at` 是"是否已解决"的唯一依据，不存在单独的布尔字段。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub resolved_at: DateTime<Utc>,
    pub resolved_by: String,
}

impl Resolution {
    pub fn now(resolved_by: impl Into<String>) -> Self {
        Self {
            resolved_at: Utc::now(),
            resolved_by: resolved_by.into(),
        }
    }
}

/// A filed complaint as persisted on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Complaint {
    pub id: String,
    pub task_description: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub missing_info: String,
    #[serde(default)]
    pub confusion_notes: String,
    #[serde(default)]
    pub future_wishes: String,
    pub severity: Severity,
    #[serde(default = "default_agent_name")]
    pub agent_name: String,
    #[serde(default = "default_session_id")]
    pub session_id: String,
    #[serde(default = "default_project_name")]
    pub project_name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
}

fn default_agent_name() -> String {
    DEFAULT_AGENT_NAME.to_string()
}

fn default_session_id() -> String {
    DEFAULT_SESSION_ID.to_string()
}

fn default_project_name() -> String {
    DEFAULT_PROJECT_NAME.to_string()
}

/// Caller-supplied fields for a new complaint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComplaint {
    pub task_description: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub missing_info: String,
    #[serde(default)]
    pub confusion_notes: String,
    #[serde(default)]
    pub future_wishes: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
}

/// Mutable fields of an existing complaint. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintPatch {
    #[serde(default)]
    pub task_description: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub missing_info: Option<String>,
    #[serde(default)]
    pub confusion_notes: Option<String>,
    #[serde(default)]
    pub future_wishes: Option<String>,
}

impl ComplaintPatch {
    pub fn is_empty(&self) -> bool {
        self.task_description.is_none()
            && self.context.is_none()
            && self.missing_info.is_none()
            && self.confusion_notes.is_none()
            && self.future_wishes.is_none()
    }
}

impl Complaint {
    /// 创建新的投诉记录
    ///
    /// 分配 UUID 与创建时间，缺省标签使用默认值。
    pub fn create(input: NewComplaint) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            task_description: input.task_description,
            context: input.context,
            missing_info: input.missing_info,
            confusion_notes: input.confusion_notes,
            future_wishes: input.future_wishes,
            severity: input.severity,
            agent_name: label_or(input.agent_name, DEFAULT_AGENT_NAME),
            session_id: label_or(input.session_id, DEFAULT_SESSION_ID),
            project_name: label_or(input.project_name, DEFAULT_PROJECT_NAME),
            timestamp: Utc::now(),
            resolution: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }

    pub fn resolve(&mut self, resolved_by: impl Into<String>) {
        self.resolution = Some(Resolution::now(resolved_by));
    }

    pub fn apply(&mut self, patch: ComplaintPatch) {
        if let Some(v) = patch.task_description {
            self.task_description = v;
        }
        if let Some(v) = patch.context {
            self.context = v;
        }
        if let Some(v) = patch.missing_info {
            self.missing_info = v;
        }
        if let Some(v) = patch.confusion_notes {
            self.confusion_notes = v;
        }
        if let Some(v) = patch.future_wishes {
            self.future_wishes = v;
        }
    }

    /// 将 `source` 中可变字段复制到当前记录
    ///
    /// 可变字段: 五个文本字段与解决标记。ID、严重级别、标签和创建时间保持不变。
    pub fn merge_mutable_from(&mut self, source: &Complaint) {
        self.task_description = source.task_description.clone();
        self.context = source.context.clone();
        self.missing_info = source.missing_info.clone();
        self.confusion_notes = source.confusion_notes.clone();
        self.future_wishes = source.future_wishes.clone();
        self.resolution = source.resolution.clone();
    }

    /// The eight free-text fields searched by substring queries.
    pub fn text_fields(&self) -> [&str; 8] {
        [
            &self.task_description,
            &self.context,
            &self.missing_info,
            &self.confusion_notes,
            &self.future_wishes,
            &self.agent_name,
            &self.session_id,
            &self.project_name,
        ]
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_id(&self.id)?;

        if self.task_description.trim().is_empty() {
            return Err(ValidationError::EmptyField("task_description"));
        }

        check_len("task_description", &self.task_description, MAX_TEXT_LEN)?;
        check_len("context", &self.context, MAX_TEXT_LEN)?;
        check_len("missing_info", &self.missing_info, MAX_TEXT_LEN)?;
        check_len("confusion_notes", &self.confusion_notes, MAX_TEXT_LEN)?;
        check_len("future_wishes", &self.future_wishes, MAX_TEXT_LEN)?;
        check_len("agent_name", &self.agent_name, MAX_LABEL_LEN)?;
        check_len("session_id", &self.session_id, MAX_LABEL_LEN)?;
        check_len("project_name", &self.project_name, MAX_LABEL_LEN)?;

        if let Some(resolution) = &self.resolution {
            if resolution.resolved_by.trim().is_empty() {
                return Err(ValidationError::EmptyField("resolved_by"));
            }
            check_len("resolved_by", &resolution.resolved_by, MAX_LABEL_LEN)?;
        }

        Ok(())
    }
}

/// 校验 ID 可以安全地用作文件名
pub fn validate_id(id: &str) -> Result<(), ValidationError> {
    let valid = !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidId(id.to_string()))
    }
}

fn label_or(value: Option<String>, default: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => default.to_string(),
    }
}

fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len > max {
        return Err(ValidationError::TooLong { field, len, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Complaint {
        Complaint::create(NewComplaint {
            task_description: "Refactor the parser".to_string(),
            context: "Large legacy module".to_string(),
            severity: Severity::High,
            project_name: Some("compiler".to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_create_fills_defaults() {
        let c = sample();
        assert!(!c.id.is_empty());
        assert_eq!(c.agent_name, DEFAULT_AGENT_NAME);
        assert_eq!(c.session_id, DEFAULT_SESSION_ID);
        assert_eq!(c.project_name, "compiler");
        assert!(!c.is_resolved());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_blank_label_falls_back_to_default() {
        let c = Complaint::create(NewComplaint {
            task_description: "x".to_string(),
            project_name: Some("   ".to_string()),
            ..Default::default()
        });
        assert_eq!(c.project_name, DEFAULT_PROJECT_NAME);
    }

    #[test]
    fn test_resolution_drives_resolved_state() {
        let mut c = sample();
        c.resolve("maintainer");
        assert!(c.is_resolved());
        assert_eq!(c.resolution.as_ref().unwrap().resolved_by, "maintainer");
    }

    #[test]
    fn test_validate_rejects_empty_task() {
        let mut c = sample();
        c.task_description = "  ".to_string();
        assert_eq!(
            c.validate(),
            Err(ValidationError::EmptyField("task_description"))
        );
    }

    #[test]
    fn test_validate_rejects_long_field() {
        let mut c = sample();
        c.context = "a".repeat(MAX_TEXT_LEN + 1);
        assert!(matches!(
            c.validate(),
            Err(ValidationError::TooLong { field: "context", .. })
        ));
    }

    #[test]
    fn test_validate_id_rejects_path_components() {
        assert!(validate_id("../etc/passwd").is_err());
        assert!(validate_id("a/b").is_err());
        assert!(validate_id("").is_err());
        assert!(validate_id("3f2a-b_9").is_ok());
    }

    #[test]
    fn test_merge_keeps_immutable_fields() {
        let original = sample();
        let mut incoming = original.clone();
        incoming.id = "other".to_string();
        incoming.severity = Severity::Low;
        incoming.context = "updated".to_string();
        incoming.resolve("bot");

        let mut merged = original.clone();
        merged.merge_mutable_from(&incoming);

        assert_eq!(merged.id, original.id);
        assert_eq!(merged.severity, Severity::High);
        assert_eq!(merged.timestamp, original.timestamp);
        assert_eq!(merged.context, "updated");
        assert!(merged.is_resolved());
    }

    #[test]
    fn test_apply_patch_only_touches_given_fields() {
        let mut c = sample();
        c.apply(ComplaintPatch {
            future_wishes: Some("better docs".to_string()),
            ..Default::default()
        });
        assert_eq!(c.future_wishes, "better docs");
        assert_eq!(c.task_description, "Refactor the parser");
    }

    #[test]
    fn test_unresolved_record_omits_resolution_in_json() {
        let c = sample();
        let json = serde_json::to_value(&c).unwrap();
        assert!(json.get("resolution").is_none());
        assert_eq!(json["severity"], "high");

        let back: Complaint = serde_json::from_value(json).unwrap();
        assert_eq!(back, c);
    }
}
