//! AddColumn command

use crate::command::{finish, input_of, result_id, Outcome};
use crate::context::BoardContext;
use crate::error::{KanbanError, Result};
use crate::types::Column;
use crm_operations::{async_trait, operation, Execute, ExecutionResult};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

/// Add a new column at the end of the board
///
/// The id is the trimmed title in lower case. Blank titles are ignored.
#[derive(Debug, Deserialize, Serialize)]
pub struct AddColumn {
    /// The column display title
    pub title: String,
}

operation!(AddColumn, verb = "add", noun = "column", description = "Add a new column to the board");

impl AddColumn {
    /// Create a new AddColumn command
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    async fn run(&self, ctx: &BoardContext) -> Result<Outcome> {
        if self.title.trim().is_empty() {
            return Ok(Outcome::Unchanged(json!({ "added": false })));
        }

        let column = Column::from_title(&self.title);
        ctx.write_store().await.add_column(column.clone())?;
        debug!(id = %column.id, "column added");

        Ok(Outcome::Applied(json!({
            "added": true,
            "id": column.id,
            "title": column.title,
        })))
    }
}

#[async_trait]
impl Execute<BoardContext, KanbanError> for AddColumn {
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
