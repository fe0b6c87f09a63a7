//! MoveTask command

use crate::command::{finish, input_of, result_id, Outcome};
use crate::context::BoardContext;
use crate::error::{GatewayError, KanbanError, Result};
use crate::types::{ColumnId, TaskId};
use crm_operations::{async_trait, operation, Execute, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Move a task to the end of another column
///
/// The backend confirms first; the store only changes once it has. The
/// task's recorded status is authoritative: a `source` that disagrees with it
/// is reported and otherwise ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MoveTask {
    /// The task ID to move
    pub id: TaskId,
    /// Column the caller believes the task is in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<ColumnId>,
    /// Column to move the task to
    pub destination: ColumnId,
}

operation!(MoveTask, verb = "move", noun = "task", description = "Move a task to a different column");

impl MoveTask {
    /// Create a MoveTask command from a known source column
    pub fn new(
        id: impl Into<TaskId>,
        source: impl Into<ColumnId>,
        destination: impl Into<ColumnId>,
    ) -> Self {
        Self {
            id: id.into(),
            source: Some(source.into()),
            destination: destination.into(),
        }
    }

    /// Create a MoveTask command to move to a column, wherever the task is now
    pub fn to_column(id: impl Into<TaskId>, destination: impl Into<ColumnId>) -> Self {
        Self {
            id: id.into(),
            source: None,
            destination: destination.into(),
        }
    }

    async fn run(&self, ctx: &BoardContext) -> Result<Outcome> {
        let current = {
            let store = ctx.read_store().await;
            let task = store.require_task(&self.id)?;
            store.require_column(&self.destination)?;
            task.status.clone()
        };

        if self.source.as_ref() == Some(&self.destination) || current == self.destination {
            return Ok(Outcome::Unchanged(json!({
                "moved": false,
                "id": self.id,
                "status": current,
            })));
        }
        if let Some(source) = self.source.as_ref().filter(|s| **s != current) {
            warn!(id = %self.id, %source, recorded = %current, "move source disagrees with recorded status");
        }

        let receipt = ctx.gateway().move_task(&self.id, &self.destination).await?;
        if receipt.status != self.destination {
            return Err(GatewayError::rejected(format!(
                "task {} reported in '{}' after move to '{}'",
                self.id, receipt.status, self.destination
            ))
            .into());
        }

        let mut store = ctx.write_store().await;
        let from = store.require_task(&self.id)?.status.clone();
        store.relocate(&self.id, &self.destination)?;
        debug!(id = %self.id, %from, to = %self.destination, "task moved");

        Ok(Outcome::Applied(json!({
            "moved": true,
            "id": self.id,
            "from": from,
            "status": self.destination,
        })))
    }
}

#[async_trait]
impl Execute<BoardContext, KanbanError> for MoveTask {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{FailOn, InMemoryGateway};
    use crate::task::AddTask;
    use std::sync::Arc;

    async fn setup() -> (Arc<InMemoryGateway>, BoardContext) {
        let gateway = Arc::new(InMemoryGateway::new());
        let ctx = BoardContext::new(gateway.clone());
        AddTask::new("First").execute(&ctx).await.into_result().unwrap();
        AddTask::new("Second").execute(&ctx).await.into_result().unwrap();
        (gateway, ctx)
    }

    fn members(store: &crate::store::TaskStore, column: &str) -> Vec<String> {
        store
            .column(&ColumnId::from(column))
            .unwrap()
            .task_ids
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_move_task_to_column() {
        let (gw, ctx) = setup().await;

        let result = MoveTask::new("1", "todo", "done")
            .execute(&ctx)
            .await
            .into_result()
            .unwrap();

        assert_eq!(result["moved"], true);
        assert_eq!(result["status"], "done");
        let store = ctx.read_store().await;
        assert_eq!(members(&store, "todo"), vec!["2"]);
        assert_eq!(members(&store, "done"), vec!["1"]);
        assert_eq!(store.task(&TaskId::from("1")).unwrap().status, "done");
        store.check_invariants().unwrap();
        assert!(gw.calls().await.contains(&"move 1 done".to_string()));
    }

    #[tokio::test]
    async fn test_move_appends_to_end() {
        let (_gw, ctx) = setup().await;
        MoveTask::to_column("2", "done").execute(&ctx).await.into_result().unwrap();
        MoveTask::to_column("1", "done").execute(&ctx).await.into_result().unwrap();
        assert_eq!(members(&*ctx.read_store().await, "done"), vec!["2", "1"]);
    }

    #[tokio::test]
    async fn test_same_column_is_noop_without_gateway_call() {
        let (gw, ctx) = setup().await;

        let result = MoveTask::new("1", "todo", "todo").execute(&ctx).await;
        assert!(!result.should_log());
        assert_eq!(result.into_result().unwrap()["moved"], false);

        let result = MoveTask::to_column("1", "todo").execute(&ctx).await;
        assert_eq!(result.into_result().unwrap()["moved"], false);

        assert_eq!(members(&*ctx.read_store().await, "todo"), vec!["1", "2"]);
        assert!(!gw.calls().await.iter().any(|c| c.starts_with("move")));
    }

    #[tokio::test]
    async fn test_stale_source_uses_recorded_status() {
        let (_gw, ctx) = setup().await;
        MoveTask::new("1", "in-progress", "done")
            .execute(&ctx)
            .await
            .into_result()
            .unwrap();
        let store = ctx.read_store().await;
        assert_eq!(members(&store, "todo"), vec!["2"]);
        store.check_invariants().unwrap();
    }

    #[tokio::test]
    async fn test_move_invalid_column() {
        let (_gw, ctx) = setup().await;
        let result = MoveTask::to_column("1", "nonexistent").execute(&ctx).await;
        assert!(matches!(
            result.into_result(),
            Err(KanbanError::ColumnNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_move_unknown_task() {
        let (_gw, ctx) = setup().await;
        let result = MoveTask::to_column("77", "done").execute(&ctx).await;
        assert!(matches!(
            result.into_result(),
            Err(KanbanError::TaskNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_gateway_failure_leaves_board() {
        let (gw, ctx) = setup().await;
        gw.fail_on(FailOn::Move).await;

        let result = MoveTask::new("1", "todo", "done").execute(&ctx).await;
        assert!(result.should_log());
        assert!(result.into_result().unwrap_err().is_persistence());

        let store = ctx.read_store().await;
        assert_eq!(members(&store, "todo"), vec!["1", "2"]);
        assert!(members(&store, "done").is_empty());
    }

    #[tokio::test]
    async fn test_unconfirmed_status_is_rejected() {
        let (gw, ctx) = setup().await;
        gw.fail_on(FailOn::IgnoreMove).await;

        let err = MoveTask::to_column("1", "done")
            .execute(&ctx)
            .await
            .into_result()
            .unwrap_err();
        assert!(matches!(
            err,
            KanbanError::Persistence(GatewayError::Rejected { .. })
        ));
        assert_eq!(ctx.read_store().await.task(&TaskId::from("1")).unwrap().status, "todo");
    }
}
