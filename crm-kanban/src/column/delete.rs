//! DeleteColumn command

use crate::command::{finish, input_of, result_id, Outcome};
use crate::context::BoardContext;
use crate::error::{GatewayError, KanbanError, Result};
use crate::types::{board, ColumnId, TaskId};
use crm_operations::{async_trait, operation, Execute, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Passes over the column before giving up on tasks that keep arriving
const MAX_ROUNDS: usize = 5;

/// Delete a column, moving its tasks to the end of `todo`
///
/// Permanent columns are never deleted. Each member's move is confirmed with
/// the backend first; if any confirmation fails the column stays, holding
/// the members that could not be moved.
#[derive(Debug, Deserialize, Serialize)]
pub struct DeleteColumn {
    /// The column ID to delete
    pub id: ColumnId,
}

operation!(
    DeleteColumn,
    verb = "delete",
    noun = "column",
    description = "Delete a column, moving its tasks to Todo"
);

impl DeleteColumn {
    pub fn new(id: impl Into<ColumnId>) -> Self {
        Self { id: id.into() }
    }

    async fn run(&self, ctx: &BoardContext) -> Result<Outcome> {
        if board::is_permanent(&self.id) {
            return Ok(Outcome::Unchanged(json!({
                "deleted": false,
                "id": self.id,
            })));
        }

        ctx.read_store().await.require_column(&self.id)?;

        let todo = ColumnId::todo();
        let mut moved: Vec<TaskId> = Vec::new();
        for _ in 0..MAX_ROUNDS {
            let members = ctx
                .read_store()
                .await
                .column(&self.id)
                .map(|c| c.task_ids.clone())
                .unwrap_or_default();
            let (confirmed, failure) = confirm_moves(ctx, &members, &todo).await;

            let mut store = ctx.write_store().await;
            for id in &confirmed {
                if let Err(e) = store.relocate(id, &todo) {
                    debug!(id = %id, error = %e, "confirmed task vanished before relocation");
                }
            }
            moved.extend(confirmed);
            if let Some(error) = failure {
                return Err(error.into());
            }

            // A reload may have listed new tasks here while the moves were in flight
            let remaining = store.column(&self.id).map_or(0, |c| c.task_ids.len());
            if remaining == 0 {
                store.remove_column(&self.id);
                debug!(id = %self.id, moved = moved.len(), "column deleted");
                return Ok(Outcome::Applied(json!({
                    "deleted": true,
                    "id": self.id,
                    "moved_to_todo": moved,
                })));
            }
            warn!(column = %self.id, remaining, "tasks arrived during column delete");
        }

        Err(GatewayError::rejected(format!(
            "column '{}' kept receiving tasks while being deleted",
            self.id
        ))
        .into())
    }
}

/// Move each task to `todo` on the backend, collecting the confirmed ids and the first error
async fn confirm_moves(
    ctx: &BoardContext,
    members: &[TaskId],
    todo: &ColumnId,
) -> (Vec<TaskId>, Option<GatewayError>) {
    let mut confirmed = Vec::new();
    let mut first_error: Option<GatewayError> = None;
    for id in members {
        match ctx.gateway().move_task(id, todo).await {
            Ok(receipt) if &receipt.status == todo => confirmed.push(id.clone()),
            Ok(receipt) => {
                first_error.get_or_insert_with(|| {
                    GatewayError::rejected(format!(
                        "task {} reported in '{}' after move to '{}'",
                        id, receipt.status, todo
                    ))
                });
            }
            Err(e) => {
                warn!(id = %id, error = %e, "could not move task out of deleted column");
                first_error.get_or_insert(e);
            }
        }
    }
    (confirmed, first_error)
}

#[async_trait]
impl Execute<BoardContext, KanbanError> for DeleteColumn {
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
    use crate::board::LoadBoard;
    use crate::column::AddColumn;
    use crate::gateway::{FailOn, InMemoryGateway};
    use crate::task::AddTask;
    use crate::types::{Task, TaskDraft};
    use std::sync::Arc;

    async fn setup() -> (Arc<InMemoryGateway>, BoardContext) {
        let gateway = Arc::new(InMemoryGateway::new());
        let ctx = BoardContext::new(gateway.clone());
        AddColumn::new("Review").execute(&ctx).await.into_result().unwrap();
        AddTask::new("Existing").execute(&ctx).await.into_result().unwrap();
        for title in ["A", "B"] {
            AddTask::new(title)
                .with_status("review")
                .execute(&ctx)
                .await
                .into_result()
                .unwrap();
        }
        (gateway, ctx)
    }

    #[tokio::test]
    async fn test_delete_column_moves_tasks_to_todo() {
        let (gw, ctx) = setup().await;

        let result = DeleteColumn::new("review")
            .execute(&ctx)
            .await
            .into_result()
            .unwrap();
        assert_eq!(result["deleted"], true);
        assert_eq!(result["moved_to_todo"], json!(["2", "3"]));

        let store = ctx.read_store().await;
        assert!(!store.has_column(&ColumnId::from("review")));
        let todo: Vec<&str> = store
            .column(&ColumnId::todo())
            .unwrap()
            .task_ids
            .iter()
            .map(|t| t.as_str())
            .collect();
        assert_eq!(todo, vec!["1", "2", "3"]);
        store.check_invariants().unwrap();

        assert!(gw.snapshot().await.iter().all(|t| t.status == "todo"));
    }

    #[tokio::test]
    async fn test_delete_permanent_column_is_noop() {
        let (gw, ctx) = setup().await;
        let before = gw.mutation_count().await;

        for id in ["todo", "in-progress", "done"] {
            let result = DeleteColumn::new(id).execute(&ctx).await;
            assert!(!result.should_log());
            assert_eq!(result.into_result().unwrap()["deleted"], false);
        }
        assert_eq!(ctx.read_store().await.columns().len(), 4);
        assert_eq!(gw.mutation_count().await, before);
    }

    #[tokio::test]
    async fn test_delete_unknown_column() {
        let (_gw, ctx) = setup().await;
        let result = DeleteColumn::new("nonexistent").execute(&ctx).await.into_result();
        assert!(matches!(result, Err(KanbanError::ColumnNotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_empty_column() {
        let (_gw, ctx) = setup().await;
        AddColumn::new("Blocked").execute(&ctx).await.into_result().unwrap();
        let result = DeleteColumn::new("blocked")
            .execute(&ctx)
            .await
            .into_result()
            .unwrap();
        assert_eq!(result["moved_to_todo"], json!([]));
    }

    #[tokio::test]
    async fn test_task_arriving_mid_delete_is_moved_on_backend() {
        let (gw, ctx) = setup().await;
        let hold = gw.hold_next_commit().await;

        let other_client = async {
            hold.committed().await;
            let late = Task::from_draft(
                TaskId::from("9"),
                &TaskDraft::new("Late").with_status("review"),
            );
            gw.seed(late).await;
            LoadBoard::new().execute(&ctx).await.into_result().unwrap();
            hold.release();
        };
        let delete = DeleteColumn::new("review");
        let (result, ()) = tokio::join!(delete.execute(&ctx), other_client);

        let value = result.into_result().unwrap();
        assert_eq!(value["moved_to_todo"], json!(["2", "3", "9"]));
        assert!(gw.calls().await.contains(&"move 9 todo".to_string()));
        assert!(gw.snapshot().await.iter().all(|t| t.status == "todo"));

        // The next poll does not bring the column back
        LoadBoard::new().execute(&ctx).await.into_result().unwrap();
        let store = ctx.read_store().await;
        assert!(!store.has_column(&ColumnId::from("review")));
        store.check_invariants().unwrap();
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_column() {
        let (gw, ctx) = setup().await;
        gw.fail_on(FailOn::MoveOf(TaskId::from("3"))).await;

        let err = DeleteColumn::new("review")
            .execute(&ctx)
            .await
            .into_result()
            .unwrap_err();
        assert!(err.is_persistence());

        let store = ctx.read_store().await;
        let review = store.column(&ColumnId::from("review")).unwrap();
        assert_eq!(review.task_ids, vec![TaskId::from("3")]);
        assert_eq!(store.task(&TaskId::from("2")).unwrap().status, "todo");
        store.check_invariants().unwrap();
    }
}
