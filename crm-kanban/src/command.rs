//! Shared tail of every command: time it, log it, classify it

use crate::error::{KanbanError, Result};
use crm_operations::{ExecutionResult, LogEntry, Operation};
use serde::Serialize;
use serde_json::Value;
use std::time::Instant;

/// What a command body produced
pub(crate) enum Outcome {
    /// A confirmed change; goes to the activity log
    Applied(Value),
    /// A read, or a request that turned out to change nothing
    Unchanged(Value),
}

/// Serialized command parameters for the log entry
pub(crate) fn input_of<T: Serialize>(op: &T) -> Value {
    serde_json::to_value(op).unwrap_or(Value::Null)
}

/// Wrap a command body's result into an [`ExecutionResult`]
///
/// Failures are logged with the error text so rejected attempts stay visible
/// in the activity log.
pub(crate) fn finish<T: Operation>(
    op: &T,
    input: Value,
    start: Instant,
    result: Result<Outcome>,
) -> ExecutionResult<Value, KanbanError> {
    let duration_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(Outcome::Applied(value)) => ExecutionResult::Logged {
            value: value.clone(),
            log_entry: LogEntry::new(op.op_string(), input, value, None, duration_ms),
        },
        Ok(Outcome::Unchanged(value)) => ExecutionResult::Unlogged { value },
        Err(error) => {
            let error_msg = error.to_string();
            ExecutionResult::Failed {
                error,
                log_entry: Some(LogEntry::new(
                    op.op_string(),
                    input,
                    serde_json::json!({"error": error_msg}),
                    None,
                    duration_ms,
                )),
            }
        }
    }
}

/// Like [`finish`] for read-only commands: failures are not logged
pub(crate) fn finish_read(result: Result<Value>) -> ExecutionResult<Value, KanbanError> {
    match result {
        Ok(value) => ExecutionResult::Unlogged { value },
        Err(error) => ExecutionResult::Failed {
            error,
            log_entry: None,
        },
    }
}

/// Pull the `id` field out of a command result
pub(crate) fn result_id(result: &Value) -> Vec<String> {
    result
        .get("id")
        .and_then(|v| v.as_str())
        .map(|id| vec![id.to_string()])
        .unwrap_or_default()
}
