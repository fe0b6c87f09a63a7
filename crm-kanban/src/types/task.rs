//! Task types: the stored record, the create payload and the partial update

use super::ids::{ColumnId, TaskId};
use crate::error::{KanbanError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = KanbanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(KanbanError::validation(
                "priority",
                format!("expected low, medium or high, got '{}'", other),
            )),
        }
    }
}

/// A task as held by the store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub assigned_to: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Id of the column that lists this task
    pub status: ColumnId,
    /// Parent task, for subtasks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<TaskId>,
}

impl Task {
    /// Build a task from a draft and the id the backend assigned to it
    pub fn from_draft(id: TaskId, draft: &TaskDraft) -> Self {
        Self {
            id,
            title: draft.title.trim().to_string(),
            description: draft.description.clone(),
            start_date: draft.start_date,
            due_date: draft.due_date,
            assigned_to: draft.assigned_to.clone(),
            priority: draft.priority,
            tags: draft.tags.clone(),
            status: draft.status.clone(),
            parent_id: draft.parent_id.clone(),
        }
    }

    /// Whether this task is nested under another
    pub fn is_subtask(&self) -> bool {
        self.parent_id.is_some()
    }

    /// Check the fields that are checkable without the rest of the board
    pub fn validate(&self) -> Result<()> {
        validate_fields(&self.title, self.start_date, self.due_date)?;
        if self.parent_id.as_ref() == Some(&self.id) {
            return Err(KanbanError::validation(
                "parent_id",
                "a task cannot be its own parent",
            ));
        }
        Ok(())
    }
}

fn validate_fields(title: &str, start: Option<NaiveDate>, due: Option<NaiveDate>) -> Result<()> {
    if title.trim().is_empty() {
        return Err(KanbanError::validation("title", "must not be empty"));
    }
    if let (Some(start), Some(due)) = (start, due) {
        if due < start {
            return Err(KanbanError::validation(
                "due_date",
                format!("due date {} is before start date {}", due, start),
            ));
        }
    }
    Ok(())
}

/// Payload for creating a task; the backend assigns the id
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub assigned_to: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "ColumnId::todo")]
    pub status: ColumnId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<TaskId>,
}

impl TaskDraft {
    /// A draft with only a title, landing in `todo`
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            start_date: None,
            due_date: None,
            assigned_to: String::new(),
            priority: Priority::default(),
            tags: Vec::new(),
            status: ColumnId::todo(),
            parent_id: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_dates(mut self, start: Option<NaiveDate>, due: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.due_date = due;
        self
    }

    pub fn with_assigned_to(mut self, assignee: impl Into<String>) -> Self {
        self.assigned_to = assignee.into();
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_status(mut self, status: impl Into<ColumnId>) -> Self {
        self.status = status.into();
        self
    }

    pub fn with_parent(mut self, parent: impl Into<TaskId>) -> Self {
        self.parent_id = Some(parent.into());
        self
    }

    /// Check title and date ordering
    pub fn validate(&self) -> Result<()> {
        validate_fields(&self.title, self.start_date, self.due_date)
    }
}

/// Partial update of a task
///
/// `None` leaves a field alone. For the clearable fields `Some(None)` clears
/// and `Some(Some(x))` sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_date: Option<Option<NaiveDate>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ColumnId>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_id: Option<Option<TaskId>>,
}

/// Distinguish an explicit `null` from a missing key
fn double_option<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_start_date(mut self, date: Option<NaiveDate>) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn with_due_date(mut self, date: Option<NaiveDate>) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn with_assigned_to(mut self, assignee: impl Into<String>) -> Self {
        self.assigned_to = Some(assignee.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_status(mut self, status: impl Into<ColumnId>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Set (`Some`) or clear (`None`) the parent
    pub fn with_parent(mut self, parent: Option<TaskId>) -> Self {
        self.parent_id = Some(parent);
        self
    }

    /// Whether the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Merge the patch over a task, returning the result
    pub fn apply_to(&self, task: &Task) -> Task {
        let mut merged = task.clone();
        if let Some(title) = &self.title {
            merged.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            merged.description = description.clone();
        }
        if let Some(start) = self.start_date {
            merged.start_date = start;
        }
        if let Some(due) = self.due_date {
            merged.due_date = due;
        }
        if let Some(assignee) = &self.assigned_to {
            merged.assigned_to = assignee.clone();
        }
        if let Some(priority) = self.priority {
            merged.priority = priority;
        }
        if let Some(tags) = &self.tags {
            merged.tags = tags.clone();
        }
        if let Some(status) = &self.status {
            merged.status = status.clone();
        }
        if let Some(parent) = &self.parent_id {
            merged.parent_id = parent.clone();
        }
        merged
    }
}
