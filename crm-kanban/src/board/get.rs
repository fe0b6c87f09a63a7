//! GetBoard command

use crate::command::finish_read;
use crate::context::BoardContext;
use crate::error::KanbanError;
use crate::projection::BoardProjection;
use crm_operations::{async_trait, operation, Execute, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Get the board: every column with its task cards
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GetBoard;

operation!(GetBoard, verb = "get", noun = "board", description = "Get the board with all columns and tasks");

impl GetBoard {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Execute<BoardContext, KanbanError> for GetBoard {
    async fn execute(&self, ctx: &BoardContext) -> ExecutionResult<Value, KanbanError> {
        let store = ctx.read_store().await;
        let board = BoardProjection::new(&store).board();
        finish_read(serde_json::to_value(board).map_err(KanbanError::from))
    }
}
