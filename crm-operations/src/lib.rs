//! # CRM Operations
//!
//! Shared plumbing for command-style operations. Every board mutation or query
//! is a struct whose fields are its parameters; executing it against a context
//! yields an [`ExecutionResult`] that tells the processor whether the call
//! should land in the activity log.
//!
//! ## Example
//!
//! ```ignore
//! use crm_operations::*;
//!
//! #[derive(Debug, Deserialize, Serialize)]
//! pub struct AddColumn {
//!     pub title: String,
//! }
//!
//! operation!(AddColumn, verb = "add", noun = "column", description = "Add a column");
//!
//! #[async_trait]
//! impl Execute<BoardContext, KanbanError> for AddColumn {
//!     async fn execute(&self, ctx: &BoardContext) -> ExecutionResult<Value, KanbanError> {
//!         // returns ExecutionResult::Logged or Unlogged
//!     }
//! }
//! ```

mod execution_result;
mod log;
mod operation;
mod processor;

pub use execution_result::ExecutionResult;
pub use log::LogEntry;
pub use operation::{Execute, Operation};
pub use processor::OperationProcessor;

// Re-export for use in implementations
pub use async_trait::async_trait;
pub use serde_json::Value;
