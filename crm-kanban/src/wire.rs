//! Wire format of the CRM task backend
//!
//! The backend stores tasks as loosely typed rows: integer ids, camelCase
//! keys, tags as a comma-separated string, nullable status and priority.
//! Everything is parsed into a [`Task`] here; records that cannot be turned
//! into a valid task are rejected and never reach the store.

use crate::error::GatewayError;
use crate::gateway::{GatewayResult, MoveReceipt, TaskSnapshot};
use crate::types::{ColumnId, Priority, Task, TaskDraft, TaskId, TaskPatch};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Status the backend assigns when none was given
const BACKEND_DEFAULT_STATUS: &str = "pending";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireId {
    Int(i64),
    Text(String),
}

impl WireId {
    fn into_id(self) -> Option<String> {
        match self {
            Self::Int(n) => Some(n.to_string()),
            Self::Text(s) if s.trim().is_empty() => None,
            Self::Text(s) => Some(s.trim().to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireTags {
    List(Vec<String>),
    Text(String),
}

impl WireTags {
    fn into_tags(self) -> Vec<String> {
        let raw = match self {
            Self::List(list) => list,
            Self::Text(text) => text.split(',').map(str::to_string).collect(),
        };
        raw.into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTask {
    id: Option<WireId>,
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    due_date: Option<String>,
    #[serde(default)]
    assigned_to: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    tags: Option<WireTags>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    parent_id: Option<WireId>,
}

fn parse_date(field: &str, raw: Option<String>) -> GatewayResult<Option<NaiveDate>> {
    let Some(raw) = raw else { return Ok(None) };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    // DATEONLY columns come back as YYYY-MM-DD, timestamps carry a time part
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| GatewayError::decode(format!("{} '{}': {}", field, raw, e)))
}

fn parse_status(raw: Option<String>) -> ColumnId {
    match raw.as_deref().map(str::trim) {
        None | Some("") | Some(BACKEND_DEFAULT_STATUS) => ColumnId::todo(),
        Some(status) => ColumnId::from(status),
    }
}

fn parse_priority(id: &str, raw: Option<String>) -> Priority {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Priority::default(),
        Some(text) => text.parse().unwrap_or_else(|_| {
            warn!(id, priority = text, "unknown priority, using medium");
            Priority::default()
        }),
    }
}

/// Parse a single backend record
pub fn parse_task(value: &Value) -> GatewayResult<Task> {
    let wire = WireTask::deserialize(value).map_err(|e| GatewayError::decode(e.to_string()))?;

    let id = wire
        .id
        .and_then(WireId::into_id)
        .ok_or_else(|| GatewayError::decode("task record without id"))?;
    let title = wire.title.unwrap_or_default().trim().to_string();
    if title.is_empty() {
        return Err(GatewayError::decode(format!("task {} has no title", id)));
    }

    let start_date = parse_date("startDate", wire.start_date)?;
    let due_date = parse_date("dueDate", wire.due_date)?;
    if let (Some(start), Some(due)) = (start_date, due_date) {
        if due < start {
            return Err(GatewayError::decode(format!(
                "task {} is due {} before it starts {}",
                id, due, start
            )));
        }
    }

    Ok(Task {
        priority: parse_priority(&id, wire.priority),
        id: TaskId::from(id),
        title,
        description: wire.description.unwrap_or_default(),
        start_date,
        due_date,
        assigned_to: wire.assigned_to.unwrap_or_default(),
        tags: wire.tags.map(WireTags::into_tags).unwrap_or_default(),
        status: parse_status(wire.status),
        parent_id: wire.parent_id.and_then(WireId::into_id).map(TaskId::from),
    })
}

/// Parse the full listing, setting malformed records aside
pub fn parse_listing(value: Value) -> GatewayResult<TaskSnapshot> {
    let Value::Array(records) = value else {
        return Err(GatewayError::decode("task listing is not an array"));
    };

    let mut snapshot = TaskSnapshot::default();
    for record in &records {
        match parse_task(record) {
            Ok(task) => snapshot.tasks.push(task),
            Err(e) => {
                warn!(error = %e, "rejecting malformed task record");
                snapshot.rejected += 1;
            }
        }
    }
    Ok(snapshot)
}

/// Parse a create response: `{message, task}` or the bare record
pub fn parse_created(value: &Value) -> GatewayResult<Task> {
    match value.get("task") {
        Some(task) if task.is_object() => parse_task(task),
        _ => parse_task(value),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMoveReceipt {
    #[serde(default)]
    task_id: Option<WireId>,
    #[serde(default)]
    status: Option<String>,
}

/// Parse a move response `{message, taskId, status}`
pub fn parse_move_receipt(value: &Value, requested: &TaskId) -> GatewayResult<MoveReceipt> {
    let wire =
        WireMoveReceipt::deserialize(value).map_err(|e| GatewayError::decode(e.to_string()))?;
    let status = wire
        .status
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| GatewayError::decode("move response without status"))?;
    Ok(MoveReceipt {
        id: wire
            .task_id
            .and_then(WireId::into_id)
            .map(TaskId::from)
            .unwrap_or_else(|| requested.clone()),
        status: ColumnId::from(status),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireDraft<'a> {
    title: &'a str,
    description: &'a str,
    start_date: Option<NaiveDate>,
    due_date: Option<NaiveDate>,
    assigned_to: &'a str,
    priority: Priority,
    tags: &'a [String],
    status: &'a ColumnId,
    parent_id: Option<&'a TaskId>,
}

/// Request body for creating a task
pub fn draft_body(draft: &TaskDraft) -> Value {
    serde_json::json!(WireDraft {
        title: draft.title.trim(),
        description: &draft.description,
        start_date: draft.start_date,
        due_date: draft.due_date,
        assigned_to: &draft.assigned_to,
        priority: draft.priority,
        tags: &draft.tags,
        status: &draft.status,
        parent_id: draft.parent_id.as_ref(),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WirePatch<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assigned_to: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tags: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'a ColumnId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_id: Option<Option<&'a TaskId>>,
}

/// Request body for a partial update; `null` clears a field
pub fn patch_body(patch: &TaskPatch) -> Value {
    serde_json::json!(WirePatch {
        title: patch.title.as_deref().map(str::trim),
        description: patch.description.as_deref(),
        start_date: patch.start_date,
        due_date: patch.due_date,
        assigned_to: patch.assigned_to.as_deref(),
        priority: patch.priority,
        tags: patch.tags.as_deref(),
        status: patch.status.as_ref(),
        parent_id: patch.parent_id.as_ref().map(Option::as_ref),
    })
}

/// Request body for a move
pub fn move_body(destination: &ColumnId) -> Value {
    serde_json::json!({ "destinationColumn": destination })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_backend_row() {
        let task = parse_task(&json!({
            "id": 7,
            "title": "Call Acme",
            "assignedTo": "ana",
            "startDate": "2024-05-01",
            "dueDate": "2024-05-03",
            "priority": "High",
            "tags": "sales, follow-up,,",
            "status": "in-progress",
            "parentId": null,
            "description": null,
            "createdAt": "2024-05-01T10:00:00.000Z"
        }))
        .unwrap();

        assert_eq!(task.id, "7");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.tags, vec!["sales", "follow-up"]);
        assert_eq!(task.status, "in-progress");
        assert_eq!(task.description, "");
        assert_eq!(task.start_date.unwrap().to_string(), "2024-05-01");
    }

    #[test]
    fn test_null_status_and_priority_defaults() {
        let task = parse_task(&json!({"id": "3", "title": "x", "status": null, "priority": null}))
            .unwrap();
        assert_eq!(task.status, ColumnId::todo());
        assert_eq!(task.priority, Priority::Medium);

        let pending = parse_task(&json!({"id": 4, "title": "y", "status": "pending"})).unwrap();
        assert_eq!(pending.status, ColumnId::todo());
    }

    #[test]
    fn test_tags_as_array_and_parent_as_string() {
        let task =
            parse_task(&json!({"id": 5, "title": "t", "tags": ["a", " b "], "parentId": "2"}))
                .unwrap();
        assert_eq!(task.tags, vec!["a", "b"]);
        assert_eq!(task.parent_id, Some(TaskId::from("2")));

        let blank_parent = parse_task(&json!({"id": 6, "title": "t", "parentId": ""})).unwrap();
        assert_eq!(blank_parent.parent_id, None);
    }

    #[test]
    fn test_malformed_records_rejected() {
        assert!(parse_task(&json!({"title": "no id"})).is_err());
        assert!(parse_task(&json!({"id": 1, "title": "  "})).is_err());
        assert!(parse_task(&json!({"id": 1, "title": "x", "dueDate": "soon"})).is_err());
        assert!(parse_task(
            &json!({"id": 1, "title": "x", "startDate": "2024-02-02", "dueDate": "2024-02-01"})
        )
        .is_err());
    }

    #[test]
    fn test_parse_listing_counts_rejected() {
        let snapshot = parse_listing(json!([
            {"id": 1, "title": "ok"},
            {"id": 2},
            {"id": 3, "title": "also ok", "status": "done"}
        ]))
        .unwrap();
        assert_eq!(snapshot.tasks.len(), 2);
        assert_eq!(snapshot.rejected, 1);

        assert!(parse_listing(json!({"tasks": []})).is_err());
    }

    #[test]
    fn test_parse_created_envelope() {
        let wrapped = json!({"message": "created", "task": {"id": 9, "title": "x"}});
        assert_eq!(parse_created(&wrapped).unwrap().id, "9");
        let bare = json!({"id": 10, "title": "y"});
        assert_eq!(parse_created(&bare).unwrap().id, "10");
    }

    #[test]
    fn test_parse_move_receipt() {
        let receipt = parse_move_receipt(
            &json!({"message": "Task moved successfully", "taskId": "4", "status": "done"}),
            &TaskId::from("4"),
        )
        .unwrap();
        assert_eq!(receipt.status, "done");
        assert_eq!(receipt.id, "4");

        assert!(parse_move_receipt(&json!({"message": "?"}), &TaskId::from("4")).is_err());
    }

    #[test]
    fn test_outgoing_bodies() {
        let draft = TaskDraft::new(" Demo ").with_tags(["crm"]).with_parent("1");
        let body = draft_body(&draft);
        assert_eq!(body["title"], "Demo");
        assert_eq!(body["parentId"], "1");
        assert_eq!(body["status"], "todo");
        assert_eq!(body["priority"], "medium");

        let patch = TaskPatch::new().with_parent(None).with_title("New");
        let body = patch_body(&patch);
        assert!(body["parentId"].is_null());
        assert!(body.get("parentId").is_some());
        assert!(body.get("status").is_none());

        assert_eq!(move_body(&ColumnId::from("done")), json!({"destinationColumn": "done"}));
    }
}
