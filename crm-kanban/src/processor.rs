//! Kanban operation processor
//!
//! Runs a command against a [`BoardContext`] and records its log entry, if
//! any, in the context's activity log. Reads and no-op mutations produce no
//! entry and leave the log alone.

use crate::context::BoardContext;
use crate::error::{KanbanError, Result};
use async_trait::async_trait;
use crm_operations::{Execute, LogEntry, OperationProcessor};
use serde_json::Value;
use tracing::{debug, warn};

/// Processor that stamps entries with an actor and keeps the activity log
#[derive(Debug, Clone, Default)]
pub struct KanbanOperationProcessor {
    actor: Option<String>,
}

impl KanbanOperationProcessor {
    /// Create a new processor
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute every entry to `actor`, e.g. the signed-in user's email
    pub fn with_actor(actor: impl Into<String>) -> Self {
        Self {
            actor: Some(actor.into()),
        }
    }

    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }
}

#[async_trait]
impl OperationProcessor<BoardContext, KanbanError> for KanbanOperationProcessor {
    async fn process<T>(&self, operation: &T, ctx: &BoardContext) -> Result<Value>
    where
        T: Execute<BoardContext, KanbanError> + Send + Sync,
    {
        let op = operation.op_string();
        let exec_result = operation.execute(ctx).await;
        let (result, log_entry) = exec_result.split();

        match &result {
            Ok(_) => debug!(%op, "operation completed"),
            Err(e) => warn!(%op, error = %e, "operation failed"),
        }

        if let Some(mut entry) = log_entry {
            if entry.actor.is_none() {
                entry.actor = self.actor.clone();
            }
            let affected = match &result {
                Ok(value) => operation.affected_resource_ids(value),
                Err(_) => Vec::new(),
            };
            self.write_log(ctx, &entry, &affected).await?;
        }

        result
    }

    async fn write_log(
        &self,
        ctx: &BoardContext,
        log_entry: &LogEntry,
        affected_resources: &[String],
    ) -> Result<()> {
        debug!(
            op = %log_entry.op,
            id = %log_entry.id,
            duration_ms = log_entry.duration_ms,
            affected = ?affected_resources,
            "recording activity"
        );
        ctx.append_activity(log_entry.clone()).await;
        Ok(())
    }
}
