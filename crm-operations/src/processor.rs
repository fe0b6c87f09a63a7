//! Operation processor trait

use crate::{Execute, LogEntry};
use async_trait::async_trait;
use serde_json::Value;

/// Runs operations and persists their log entries
///
/// Implementations decide where log entries go (activity log, tracing,
/// nowhere). `process` is the only entry point callers should need.
#[async_trait]
pub trait OperationProcessor<C, E>
where
    C: Send + Sync,
    E: Send,
{
    /// Execute the operation and record its log entry if it produced one
    async fn process<T>(&self, operation: &T, ctx: &C) -> Result<Value, E>
    where
        T: Execute<C, E> + Send + Sync;

    /// Persist a log entry for the given resources
    async fn write_log(
        &self,
        ctx: &C,
        log_entry: &LogEntry,
        affected_resources: &[String],
    ) -> Result<(), E>;
}
