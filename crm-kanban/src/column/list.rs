//! ListColumns command

use crate::command::finish_read;
use crate::context::BoardContext;
use crate::error::KanbanError;
use crm_operations::{async_trait, operation, Execute, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// List all columns in board order with their task counts
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ListColumns;

operation!(ListColumns, verb = "list", noun = "columns", description = "List all columns");

impl ListColumns {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Execute<BoardContext, KanbanError> for ListColumns {
    async fn execute(&self, ctx: &BoardContext) -> ExecutionResult<Value, KanbanError> {
        let store = ctx.read_store().await;
        let columns: Vec<Value> = store
            .columns()
            .iter()
            .map(|c| {
                json!({
                    "id": c.id,
                    "title": c.title,
                    "permanent": c.is_permanent(),
                    "task_count": c.task_ids.len(),
                })
            })
            .collect();

        finish_read(Ok(json!({
            "columns": columns,
            "count": columns.len(),
        })))
    }
}
