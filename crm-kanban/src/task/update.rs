//! UpdateTask command

use crate::command::{finish, input_of, result_id, Outcome};
use crate::context::BoardContext;
use crate::error::{KanbanError, Result};
use crate::types::{ColumnId, Priority, TaskId, TaskPatch};
use chrono::NaiveDate;
use crm_operations::{async_trait, operation, Execute, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Update an existing task
///
/// A status change relocates the task in the same step, exactly as a move would.
#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateTask {
    /// The task ID to update
    pub id: TaskId,
    #[serde(flatten)]
    pub patch: TaskPatch,
}

operation!(UpdateTask, verb = "update", noun = "task", description = "Update task properties");

impl UpdateTask {
    /// Create a new UpdateTask command
    pub fn new(id: impl Into<TaskId>) -> Self {
        Self {
            id: id.into(),
            patch: TaskPatch::default(),
        }
    }

    /// Replace the whole patch
    pub fn with_patch(mut self, patch: TaskPatch) -> Self {
        self.patch = patch;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.patch = self.patch.with_title(title);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.patch = self.patch.with_description(description);
        self
    }

    pub fn with_start_date(mut self, date: Option<NaiveDate>) -> Self {
        self.patch = self.patch.with_start_date(date);
        self
    }

    pub fn with_due_date(mut self, date: Option<NaiveDate>) -> Self {
        self.patch = self.patch.with_due_date(date);
        self
    }

    pub fn with_assigned_to(mut self, assignee: impl Into<String>) -> Self {
        self.patch = self.patch.with_assigned_to(assignee);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.patch = self.patch.with_priority(priority);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patch = self.patch.with_tags(tags);
        self
    }

    pub fn with_status(mut self, status: impl Into<ColumnId>) -> Self {
        self.patch = self.patch.with_status(status);
        self
    }

    /// Set (`Some`) or clear (`None`) the parent
    pub fn with_parent(mut self, parent: Option<TaskId>) -> Self {
        self.patch = self.patch.with_parent(parent);
        self
    }

    async fn run(&self, ctx: &BoardContext) -> Result<Outcome> {
        {
            let store = ctx.read_store().await;
            let current = store.require_task(&self.id)?;
            if self.patch.is_empty() {
                return Ok(Outcome::Unchanged(serde_json::to_value(current)?));
            }

            let merged = self.patch.apply_to(current);
            merged.validate()?;
            if merged.status != current.status {
                store.require_column(&merged.status)?;
            }
            if let Some(Some(parent)) = &self.patch.parent_id {
                store.validate_parent(Some(&self.id), parent)?;
            }
        }

        ctx.gateway().update_task(&self.id, &self.patch).await?;

        // Merge over whatever the store holds now; a reload may have landed meanwhile
        let mut store = ctx.write_store().await;
        let merged = self.patch.apply_to(store.require_task(&self.id)?);
        store.replace(merged.clone())?;
        debug!(id = %self.id, status = %merged.status, "task updated");
        Ok(Outcome::Applied(serde_json::to_value(&merged)?))
    }
}

#[async_trait]
impl Execute<BoardContext, KanbanError> for UpdateTask {
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
