//! AddTask command

use crate::command::{finish, input_of, result_id, Outcome};
use crate::context::BoardContext;
use crate::error::{KanbanError, Result};
use crate::types::{ColumnId, Priority, TaskDraft, TaskId};
use chrono::NaiveDate;
use crm_operations::{async_trait, operation, Execute, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Create a task on the backend, then add it to the end of its column
#[derive(Debug, Deserialize, Serialize)]
pub struct AddTask {
    #[serde(flatten)]
    pub draft: TaskDraft,
}

operation!(AddTask, verb = "add", noun = "task", description = "Create a new task");

impl AddTask {
    /// Create a new AddTask command for a task in `todo`
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            draft: TaskDraft::new(title),
        }
    }

    /// Create from a complete draft
    pub fn from_draft(draft: TaskDraft) -> Self {
        Self { draft }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.draft = self.draft.with_description(description);
        self
    }

    pub fn with_status(mut self, status: impl Into<ColumnId>) -> Self {
        self.draft = self.draft.with_status(status);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.draft = self.draft.with_priority(priority);
        self
    }

    pub fn with_assigned_to(mut self, assignee: impl Into<String>) -> Self {
        self.draft = self.draft.with_assigned_to(assignee);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.draft = self.draft.with_tags(tags);
        self
    }

    pub fn with_dates(mut self, start: Option<NaiveDate>, due: Option<NaiveDate>) -> Self {
        self.draft = self.draft.with_dates(start, due);
        self
    }

    /// Make the new task a subtask of `parent`
    pub fn with_parent(mut self, parent: impl Into<TaskId>) -> Self {
        self.draft = self.draft.with_parent(parent);
        self
    }

    async fn run(&self, ctx: &BoardContext) -> Result<Outcome> {
        self.draft.validate()?;
        {
            let store = ctx.read_store().await;
            store.require_column(&self.draft.status)?;
            if let Some(parent) = &self.draft.parent_id {
                store.validate_parent(None, parent)?;
            }
        }

        let task = ctx.gateway().create_task(&self.draft).await?;
        debug!(id = %task.id, status = %task.status, "task created");

        let mut store = ctx.write_store().await;
        if store.ensure_column(&task.status) {
            warn!(id = %task.id, status = %task.status, "backend stored task under an unknown column");
        }
        if store.contains_task(&task.id) {
            // A reload already picked up the created task
            debug!(id = %task.id, "created task already loaded");
            store.replace(task.clone())?;
        } else {
            store.insert(task.clone())?;
        }
        Ok(Outcome::Applied(serde_json::to_value(&task)?))
    }
}

#[async_trait]
impl Execute<BoardContext, KanbanError> for AddTask {
    async fn execute(&self, ctx: &BoardContext) -> ExecutionResult<Value, KanbanError> {
        let start = std::time::Instant::now();
        let input = input_of(self);
        let result = self.run(ctx).await;
        finish(self, input, start, result)
    }

    fn affected_resource_ids(&self, result: &Value) -> Vec<String> {
        result_id(result)
    }
}
