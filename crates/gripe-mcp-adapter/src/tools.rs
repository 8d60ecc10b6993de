//! Tool catalogue and typed arguments
//!
//! Every tool's `arguments` object is deserialized into one of the structs
//! below before it reaches the service.

use serde::Deserialize;
use serde_json::json;

use gripe_types::{ComplaintPatch, NewComplaint, Severity};

use crate::mcp_protocol::Tool;

pub const FILE_COMPLAINT: &str = "file_complaint";
pub const GET_COMPLAINT: &str = "get_complaint";
pub const LIST_COMPLAINTS: &str = "list_complaints";
pub const SEARCH_COMPLAINTS: &str = "search_complaints";
pub const LIST_UNRESOLVED: &str = "list_unresolved";
pub const UPDATE_COMPLAINT: &str = "update_complaint";
pub const RESOLVE_COMPLAINT: &str = "resolve_complaint";
pub const CACHE_STATS: &str = "cache_stats";

const SEVERITY_ENUM: [&str; 4] = ["low", "medium", "high", "critical"];

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileComplaintArgs {
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
    pub severity: Option<String>,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
}

impl FileComplaintArgs {
    pub fn into_new_complaint(self) -> anyhow::Result<NewComplaint> {
        let severity = parse_severity(self.severity.as_deref())?.unwrap_or_default();
        Ok(NewComplaint {
            task_description: self.task_description,
            context: self.context,
            missing_info: self.missing_info,
            confusion_notes: self.confusion_notes,
            future_wishes: self.future_wishes,
            severity,
            agent_name: self.agent_name,
            session_id: self.session_id,
            project_name: self.project_name,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct IdArgs {
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListArgs {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchArgs {
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitArgs {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateArgs {
    pub id: String,
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

impl UpdateArgs {
    pub fn into_parts(self) -> (String, ComplaintPatch) {
        let patch = ComplaintPatch {
            task_description: self.task_description,
            context: self.context,
            missing_info: self.missing_info,
            confusion_notes: self.confusion_notes,
            future_wishes: self.future_wishes,
        };
        (self.id, patch)
    }
}

#[derive(Debug, Deserialize)]
pub struct ResolveArgs {
    pub id: String,
    pub resolved_by: String,
}

pub fn parse_severity(value: Option<&str>) -> anyhow::Result<Option<Severity>> {
    value
        .map(|s| s.parse::<Severity>().map_err(anyhow::Error::from))
        .transpose()
}

/// Tool definitions returned by `tools/list`
pub fn catalogue() -> Vec<Tool> {
    let text = |description: &str| json!({ "type": "string", "description": description });
    let limit = json!({
        "type": "integer",
        "minimum": 0,
        "description": "Maximum number of results; 0 or absent uses the server default"
    });

    vec![
        Tool {
            name: FILE_COMPLAINT.to_string(),
            description: "File a complaint about the task you were given: what was missing, \
                          what was confusing, and what would help next time"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "task_description": text("What you were asked to do"),
                    "context": text("Relevant surroundings: repository, files, constraints"),
                    "missing_info": text("Information you needed but did not have"),
                    "confusion_notes": text("Instructions or code that were unclear"),
                    "future_wishes": text("What would make this task easier next time"),
                    "severity": {
                        "type": "string",
                        "enum": SEVERITY_ENUM,
                        "default": "medium"
                    },
                    "agent_name": text("Name of the reporting agent"),
                    "session_id": text("Session identifier of the reporting agent"),
                    "project_name": text("Project the task belongs to")
                },
                "required": ["task_description"]
            }),
        },
        Tool {
            name: GET_COMPLAINT.to_string(),
            description: "Get a single complaint by ID".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": { "id": text("Complaint ID") },
                "required": ["id"]
            }),
        },
        Tool {
            name: LIST_COMPLAINTS.to_string(),
            description: "List complaints newest first, optionally filtered by severity or project"
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "limit": limit,
                    "offset": {
                        "type": "integer",
                        "minimum": 0,
                        "description": "Number of complaints to skip (ignored when filtering)"
                    },
                    "severity": { "type": "string", "enum": SEVERITY_ENUM },
                    "project_name": text("Only complaints from this project")
                }
            }),
        },
        Tool {
            name: SEARCH_COMPLAINTS.to_string(),
            description: "Case-insensitive substring search across all text fields".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": text("Text to look for"),
                    "limit": limit
                },
                "required": ["query"]
            }),
        },
        Tool {
            name: LIST_UNRESOLVED.to_string(),
            description: "List complaints that have not been resolved yet".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": { "limit": limit }
            }),
        },
        Tool {
            name: UPDATE_COMPLAINT.to_string(),
            description: "Amend the text fields of an existing complaint".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": text("Complaint ID"),
                    "task_description": text("Replacement task description"),
                    "context": text("Replacement context"),
                    "missing_info": text("Replacement missing information"),
                    "confusion_notes": text("Replacement confusion notes"),
                    "future_wishes": text("Replacement future wishes")
                },
                "required": ["id"]
            }),
        },
        Tool {
            name: RESOLVE_COMPLAINT.to_string(),
            description: "Mark a complaint as resolved".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": text("Complaint ID"),
                    "resolved_by": text("Who resolved it")
                },
                "required": ["id", "resolved_by"]
            }),
        },
        Tool {
            name: CACHE_STATS.to_string(),
            description: "Cache hit/miss/eviction counters".to_string(),
            input_schema: json!({ "type": "object", "properties": {} }),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalogue_names_are_unique() {
        let tools = catalogue();
        let mut names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), tools.len());
        assert_eq!(tools.len(), 8);
    }

    #[test]
    fn test_file_args_parse_severity() {
        let args: FileComplaintArgs = serde_json::from_value(json!({
            "task_description": "t",
            "severity": "HIGH"
        }))
        .unwrap();
        assert_eq!(args.into_new_complaint().unwrap().severity, Severity::High);
    }

    #[test]
    fn test_file_args_reject_unknown_severity() {
        let args: FileComplaintArgs = serde_json::from_value(json!({
            "task_description": "t",
            "severity": "apocalyptic"
        }))
        .unwrap();
        assert!(args.into_new_complaint().is_err());
    }

    #[test]
    fn test_update_args_split() {
        let args: UpdateArgs = serde_json::from_value(json!({
            "id": "abc",
            "context": "new"
        }))
        .unwrap();
        let (id, patch) = args.into_parts();
        assert_eq!(id, "abc");
        assert_eq!(patch.context.as_deref(), Some("new"));
        assert!(patch.task_description.is_none());
    }
}
