//! Kanban task core for the CRM
//!
//! This crate keeps the CRM's tasks in an in-memory board, mirrors every
//! change to the REST backend and reconciles with it by polling.
//!
//! ## Overview
//!
//! - **Task store** - tasks by id plus columns listing their members in order;
//!   a task's `status` always names the one column that lists it
//! - **Confirm, then apply** - commands call the backend first and touch the
//!   store only once it has answered
//! - **Commands** - one struct per operation, run through [`Execute`] or a
//!   [`KanbanOperationProcessor`] that keeps an activity log
//! - **Polling** - [`BoardSync`] reloads the whole board on an interval; the
//!   last full load wins
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use crm_kanban::{BoardContext, HttpGateway, task::{AddTask, MoveTask}, Execute};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = HttpGateway::new("http://localhost:5000", Duration::from_secs(10))?;
//! let ctx = BoardContext::new(Arc::new(gateway));
//!
//! let task = AddTask::new("Call Acme about renewal")
//!     .execute(&ctx)
//!     .await
//!     .into_result()?;
//!
//! let id = task["id"].as_str().unwrap_or_default();
//! MoveTask::to_column(id, "in-progress")
//!     .execute(&ctx)
//!     .await
//!     .into_result()?;
//! # Ok(())
//! # }
//! ```

mod command;
pub mod config;
mod context;
pub mod drag;
mod error;
pub mod gateway;
mod processor;
pub mod projection;
mod store;
pub mod sync;
pub mod types;
pub mod wire;

// Command modules
pub mod board;
pub mod column;
pub mod task;

// Re-export Execute trait and types from operations crate
pub use crm_operations::{
    async_trait, Execute, ExecutionResult, LogEntry, Operation, OperationProcessor,
};

pub use config::{ConfigProvider, KanbanConfig};
pub use context::{BoardContext, ACTIVITY_CAPACITY};
pub use drag::{DragGesture, DropTarget};
pub use error::{ConfigError, GatewayError, KanbanError, Result};
pub use gateway::{HttpGateway, InMemoryGateway, MoveReceipt, PersistenceGateway, TaskSnapshot};
pub use processor::KanbanOperationProcessor;
pub use projection::BoardProjection;
pub use store::{LoadStats, TaskStore};
pub use sync::{BoardSync, SyncStatus};

// Re-export commonly used types
pub use types::{Column, ColumnId, Priority, Task, TaskDraft, TaskId, TaskPatch};
