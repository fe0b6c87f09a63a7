//! Persistence gateway - the boundary to the task backend
//!
//! Every mutation is confirmed here before the store changes. Two
//! implementations ship with the crate: [`HttpGateway`] for the CRM REST
//! backend and [`InMemoryGateway`] for tests and offline use.

mod http;
mod memory;

pub use http::HttpGateway;
pub use memory::{CommitHold, FailOn, InMemoryGateway};

use crate::error::GatewayError;
use crate::types::{ColumnId, Task, TaskDraft, TaskId, TaskPatch};
use async_trait::async_trait;
use serde::Serialize;

/// Result type for gateway calls
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// Full task listing, with records that could not be understood set aside
#[derive(Debug, Clone, Default)]
pub struct TaskSnapshot {
    pub tasks: Vec<Task>,
    /// Number of records dropped at the wire boundary
    pub rejected: usize,
}

/// Backend confirmation of a move
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveReceipt {
    pub id: TaskId,
    pub status: ColumnId,
}

/// Task backend
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Fetch every task
    async fn list_tasks(&self) -> GatewayResult<TaskSnapshot>;

    /// Create a task; the returned record carries the assigned id
    async fn create_task(&self, draft: &TaskDraft) -> GatewayResult<Task>;

    /// Apply a partial update
    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> GatewayResult<Task>;

    /// Delete a task
    async fn delete_task(&self, id: &TaskId) -> GatewayResult<()>;

    /// Change a task's status
    async fn move_task(&self, id: &TaskId, destination: &ColumnId) -> GatewayResult<MoveReceipt>;
}
