//! DeleteTask command

use crate::command::{finish, input_of, result_id, Outcome};
use crate::context::BoardContext;
use crate::error::{KanbanError, Result};
use crate::types::TaskId;
use crm_operations::{async_trait, operation, Execute, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Delete a task; its subtasks become root tasks
#[derive(Debug, Deserialize, Serialize)]
pub struct DeleteTask {
    /// The task ID to delete
    pub id: TaskId,
}

operation!(DeleteTask, verb = "delete", noun = "task", description = "Delete a task");

impl DeleteTask {
    pub fn new(id: impl Into<TaskId>) -> Self {
        Self { id: id.into() }
    }

    async fn run(&self, ctx: &BoardContext) -> Result<Outcome> {
        ctx.read_store().await.require_task(&self.id)?;

        ctx.gateway().delete_task(&self.id).await?;

        let mut store = ctx.write_store().await;
        let promoted = match store.remove(&self.id) {
            Some((_, promoted)) => promoted,
            // a reload already dropped it
            None => Vec::new(),
        };
        debug!(id = %self.id, promoted = promoted.len(), "task deleted");

        Ok(Outcome::Applied(serde_json::json!({
            "deleted": true,
            "id": self.id,
            "promoted": promoted,
        })))
    }
}

#[async_trait]
impl Execute<BoardContext, KanbanError> for DeleteTask {
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
