//! LoadBoard command

use crate::command::finish_read;
use crate::context::BoardContext;
use crate::error::{KanbanError, Result};
use crm_operations::{async_trait, operation, Execute, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Replace the board with the backend's full task listing
///
/// The last full refresh wins over anything applied locally in between.
/// Loading the same listing twice leaves the board unchanged.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoadBoard;

operation!(LoadBoard, verb = "load", noun = "board", description = "Reload every task from the backend");

impl LoadBoard {
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, ctx: &BoardContext) -> Result<Value> {
        let snapshot = ctx.gateway().list_tasks().await?;
        let stats = ctx.write_store().await.load(snapshot.tasks);
        debug!(
            tasks = stats.tasks,
            rejected = snapshot.rejected,
            "board loaded"
        );

        let mut value = serde_json::to_value(&stats)?;
        value["rejected"] = snapshot.rejected.into();
        Ok(value)
    }
}

#[async_trait]
impl Execute<BoardContext, KanbanError> for LoadBoard {
    async fn execute(&self, ctx: &BoardContext) -> ExecutionResult<Value, KanbanError> {
        finish_read(self.run(ctx).await)
    }
}
