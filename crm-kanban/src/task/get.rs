//! GetTask command

use crate::command::finish_read;
use crate::context::BoardContext;
use crate::error::{KanbanError, Result};
use crate::projection::BoardProjection;
use crate::types::TaskId;
use crm_operations::{async_trait, operation, Execute, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Get a task by ID, with the ids of its subtasks
#[derive(Debug, Deserialize, Serialize)]
pub struct GetTask {
    /// The task ID to retrieve
    pub id: TaskId,
}

operation!(GetTask, verb = "get", noun = "task", description = "Get a task by ID");

impl GetTask {
    pub fn new(id: impl Into<TaskId>) -> Self {
        Self { id: id.into() }
    }

    async fn run(&self, ctx: &BoardContext) -> Result<Value> {
        let store = ctx.read_store().await;
        let task = store.require_task(&self.id)?;
        let subtasks: Vec<&TaskId> = BoardProjection::new(&store)
            .subtasks_of(&self.id)
            .into_iter()
            .map(|t| &t.id)
            .collect();

        let mut result = serde_json::to_value(task)?;
        result["subtasks"] = serde_json::to_value(subtasks)?;
        Ok(result)
    }
}

#[async_trait]
impl Execute<BoardContext, KanbanError> for GetTask {
    async fn execute(&self, ctx: &BoardContext) -> ExecutionResult<Value, KanbanError> {
        finish_read(self.run(ctx).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::InMemoryGateway;
    use crate::task::AddTask;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_get_task_with_subtasks() {
        let ctx = BoardContext::new(Arc::new(InMemoryGateway::new()));
        AddTask::new("Deal").execute(&ctx).await.into_result().unwrap();
        AddTask::new("Send NDA")
            .with_parent("1")
            .execute(&ctx)
            .await
            .into_result()
            .unwrap();

        let result = GetTask::new("1").execute(&ctx).await;
        assert!(!result.should_log());
        let value = result.into_result().unwrap();
        assert_eq!(value["title"], "Deal");
        assert_eq!(value["subtasks"], serde_json::json!(["2"]));
    }

    #[tokio::test]
    async fn test_get_task_not_found() {
        let ctx = BoardContext::new(Arc::new(InMemoryGateway::new()));
        let result = GetTask::new("nope").execute(&ctx).await;
        assert!(!result.should_log());
        assert!(result.into_result().unwrap_err().is_not_found());
    }
}
