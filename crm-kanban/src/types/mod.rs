//! Core types for the kanban core

pub mod board;
mod ids;
mod task;

// Re-export all types
pub use board::{Column, DONE, IN_PROGRESS, PERMANENT_COLUMNS, TODO};
pub use ids::{ColumnId, TaskId};
pub use task::{Priority, Task, TaskDraft, TaskPatch};
