//! TaskStore - the authoritative in-memory board
//!
//! Tasks are kept in insertion order, keyed by id. Each column keeps the ids
//! of its members in display order. The store owns one invariant: a task's
//! `status` names exactly one column, and that column is the only one whose
//! `task_ids` lists the task.
//!
//! Mutating methods are crate-private. Commands confirm a change with the
//! persistence gateway first and only then apply it here.

use crate::error::{KanbanError, Result};
use crate::types::{board, Column, ColumnId, Task, TaskId};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::warn;

/// What a full reload changed beyond replacing the tasks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    /// Tasks now held by the store
    pub tasks: usize,
    /// Records sharing an id with an earlier record in the same snapshot
    pub duplicates_skipped: usize,
    /// Columns created because a task's status named no known column
    pub columns_created: Vec<ColumnId>,
    /// Tasks whose parent was missing or itself nested, now root tasks
    pub parents_cleared: Vec<TaskId>,
}

/// Task map plus the derived column index
#[derive(Debug, Clone)]
pub struct TaskStore {
    tasks: IndexMap<TaskId, Task>,
    columns: Vec<Column>,
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore {
    /// An empty store with the permanent columns
    pub fn new() -> Self {
        Self {
            tasks: IndexMap::new(),
            columns: Column::defaults(),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// Look up a task or fail with `TaskNotFound`
    pub fn require_task(&self, id: &TaskId) -> Result<&Task> {
        self.task(id).ok_or_else(|| KanbanError::task_not_found(id))
    }

    pub fn contains_task(&self, id: &TaskId) -> bool {
        self.tasks.contains_key(id)
    }

    /// All tasks in insertion order
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Columns in board order, permanent ones first
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, id: &ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| &c.id == id)
    }

    /// Look up a column or fail with `ColumnNotFound`
    pub fn require_column(&self, id: &ColumnId) -> Result<&Column> {
        self.column(id)
            .ok_or_else(|| KanbanError::column_not_found(id))
    }

    pub fn has_column(&self, id: &ColumnId) -> bool {
        self.column(id).is_some()
    }

    /// Direct subtasks of a task, in insertion order
    pub fn children_of<'a>(&'a self, id: &'a TaskId) -> impl Iterator<Item = &'a Task> + 'a {
        self.tasks
            .values()
            .filter(move |t| t.parent_id.as_ref() == Some(id))
    }

    /// Check that `parent` may be the parent of `task` (`None` for a task
    /// that does not exist yet). Nesting is a single level deep.
    pub fn validate_parent(&self, task: Option<&TaskId>, parent: &TaskId) -> Result<()> {
        if task == Some(parent) {
            return Err(KanbanError::validation(
                "parent_id",
                "a task cannot be its own parent",
            ));
        }
        let parent_task = self.task(parent).ok_or_else(|| {
            KanbanError::validation("parent_id", format!("parent task {} does not exist", parent))
        })?;
        if parent_task.is_subtask() {
            return Err(KanbanError::validation(
                "parent_id",
                format!("task {} is itself a subtask", parent),
            ));
        }
        if let Some(task) = task {
            if self.children_of(task).next().is_some() {
                return Err(KanbanError::validation(
                    "parent_id",
                    format!("task {} has subtasks and cannot become one", task),
                ));
            }
        }
        Ok(())
    }

    // =========================================================================
    // Full refresh
    // =========================================================================

    /// Replace every task and rebuild the column index from their statuses
    ///
    /// Permanent and user-added columns are kept (emptied first); columns are
    /// created for statuses nobody knows about. Applying the same snapshot
    /// twice leaves the store unchanged.
    pub(crate) fn load(&mut self, snapshot: Vec<Task>) -> LoadStats {
        let mut stats = LoadStats::default();

        for column in &mut self.columns {
            column.task_ids.clear();
        }
        self.tasks.clear();

        for task in snapshot {
            if self.tasks.contains_key(&task.id) {
                warn!(id = %task.id, "skipping duplicate task id in snapshot");
                stats.duplicates_skipped += 1;
                continue;
            }
            if self.ensure_column(&task.status) {
                warn!(id = %task.id, status = %task.status, "created column for unknown status");
                stats.columns_created.push(task.status.clone());
            }
            if let Some(column) = self.column_mut(&task.status) {
                column.push(task.id.clone());
            }
            self.tasks.insert(task.id.clone(), task);
        }

        stats.parents_cleared = self.normalize_parents();
        stats.tasks = self.tasks.len();
        stats
    }

    /// Clear parents that are missing, self-referencing or nested
    fn normalize_parents(&mut self) -> Vec<TaskId> {
        let invalid: Vec<TaskId> = self
            .tasks
            .values()
            .filter(|t| match &t.parent_id {
                None => false,
                Some(parent) if parent == &t.id => true,
                Some(parent) => self.tasks.get(parent).is_none_or(|p| p.is_subtask()),
            })
            .map(|t| t.id.clone())
            .collect();

        for id in &invalid {
            if let Some(task) = self.tasks.get_mut(id) {
                warn!(id = %id, parent = ?task.parent_id, "promoting task with invalid parent to root");
                task.parent_id = None;
            }
        }
        invalid
    }

    // =========================================================================
    // Confirmed mutations
    // =========================================================================

    /// Add a new task at the end of its status column
    pub(crate) fn insert(&mut self, task: Task) -> Result<()> {
        if self.contains_task(&task.id) {
            return Err(KanbanError::duplicate_id("task", task.id.to_string()));
        }
        let column = self
            .column_mut(&task.status)
            .ok_or_else(|| KanbanError::column_not_found(&task.status))?;
        column.push(task.id.clone());
        self.tasks.insert(task.id.clone(), task);
        Ok(())
    }

    /// Overwrite a task record, relocating it if its status changed
    pub(crate) fn replace(&mut self, task: Task) -> Result<()> {
        let previous = self.require_task(&task.id)?.status.clone();
        if previous != task.status {
            self.require_column(&task.status)?;
            self.unlist(&task.id);
            if let Some(column) = self.column_mut(&task.status) {
                column.push(task.id.clone());
            }
        }
        self.tasks.insert(task.id.clone(), task);
        Ok(())
    }

    /// Move a task to the end of another column and update its status
    ///
    /// Returns false when the task already sits in `destination`.
    pub(crate) fn relocate(&mut self, id: &TaskId, destination: &ColumnId) -> Result<bool> {
        self.require_column(destination)?;
        let current = self.require_task(id)?.status.clone();
        if &current == destination {
            return Ok(false);
        }
        self.unlist(id);
        if let Some(column) = self.column_mut(destination) {
            column.push(id.clone());
        }
        if let Some(task) = self.tasks.get_mut(id) {
            task.status = destination.clone();
        }
        Ok(true)
    }

    /// Remove a task from the map and every column; its subtasks become root tasks
    pub(crate) fn remove(&mut self, id: &TaskId) -> Option<(Task, Vec<TaskId>)> {
        let task = self.tasks.shift_remove(id)?;
        self.unlist(id);

        let mut promoted = Vec::new();
        for child in self.tasks.values_mut() {
            if child.parent_id.as_ref() == Some(id) {
                child.parent_id = None;
                promoted.push(child.id.clone());
            }
        }
        Some((task, promoted))
    }

    /// Append a new empty column
    pub(crate) fn add_column(&mut self, column: Column) -> Result<()> {
        if self.has_column(&column.id) {
            return Err(KanbanError::duplicate_id("column", column.id.to_string()));
        }
        self.columns.push(column);
        Ok(())
    }

    /// Create a column titled after its id if none exists; true if created
    pub(crate) fn ensure_column(&mut self, id: &ColumnId) -> bool {
        if self.has_column(id) {
            return false;
        }
        self.columns.push(Column::new(id.clone(), id.as_str()));
        true
    }

    /// Drop a column. Its members must already have been relocated.
    pub(crate) fn remove_column(&mut self, id: &ColumnId) -> Option<Column> {
        let index = self.columns.iter().position(|c| &c.id == id)?;
        Some(self.columns.remove(index))
    }

    fn column_mut(&mut self, id: &ColumnId) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| &c.id == id)
    }

    fn unlist(&mut self, id: &TaskId) {
        for column in &mut self.columns {
            column.remove(id);
        }
    }

    // =========================================================================
    // Consistency
    // =========================================================================

    /// Verify the status/membership and nesting invariants, describing the first violation
    pub fn check_invariants(&self) -> std::result::Result<(), String> {
        for (i, (id, _)) in board::PERMANENT_COLUMNS.iter().enumerate() {
            match self.columns.get(i) {
                Some(c) if c.id == *id => {}
                _ => return Err(format!("permanent column '{}' missing or out of order", id)),
            }
        }

        for column in &self.columns {
            for id in &column.task_ids {
                let task = self
                    .task(id)
                    .ok_or_else(|| format!("column '{}' lists unknown task {}", column.id, id))?;
                if task.status != column.id {
                    return Err(format!(
                        "task {} listed in '{}' but has status '{}'",
                        id, column.id, task.status
                    ));
                }
            }
        }

        for task in self.tasks.values() {
            let listings: usize = self
                .columns
                .iter()
                .map(|c| c.task_ids.iter().filter(|t| *t == &task.id).count())
                .sum();
            if listings != 1 {
                return Err(format!("task {} listed {} times", task.id, listings));
            }
            if let Some(parent) = &task.parent_id {
                match self.task(parent) {
                    None => return Err(format!("task {} has missing parent {}", task.id, parent)),
                    Some(p) if p.is_subtask() => {
                        return Err(format!("task {} is nested under subtask {}", task.id, parent))
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }
}
