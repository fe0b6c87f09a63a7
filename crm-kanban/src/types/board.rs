//! Board-level types: Column and the permanent column set

use super::ids::{ColumnId, TaskId};
use serde::{Deserialize, Serialize};

/// Id of the column tasks land in by default and fall back to
pub const TODO: &str = "todo";
/// Id of the work-in-progress column
pub const IN_PROGRESS: &str = "in-progress";
/// Id of the terminal column
pub const DONE: &str = "done";

/// Columns that always exist and can never be deleted, in board order
pub const PERMANENT_COLUMNS: [(&str, &str); 3] =
    [(TODO, "Todo"), (IN_PROGRESS, "In Progress"), (DONE, "Done")];

/// Whether a column id names one of the permanent columns
pub fn is_permanent(id: &ColumnId) -> bool {
    PERMANENT_COLUMNS.iter().any(|(pid, _)| id == *pid)
}

/// A column defines a workflow stage and holds its members in display order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Column {
    pub id: ColumnId,
    pub title: String,
    #[serde(default)]
    pub task_ids: Vec<TaskId>,
}

impl Column {
    /// Create an empty column
    pub fn new(id: impl Into<ColumnId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            task_ids: Vec::new(),
        }
    }

    /// Create an empty column whose id is derived from its title
    pub fn from_title(title: &str) -> Self {
        Self::new(ColumnId::from_title(title), title.trim())
    }

    /// The permanent columns, empty
    pub fn defaults() -> Vec<Column> {
        PERMANENT_COLUMNS
            .iter()
            .map(|(id, title)| Column::new(*id, *title))
            .collect()
    }

    /// Whether this column is one of the permanent ones
    pub fn is_permanent(&self) -> bool {
        is_permanent(&self.id)
    }

    /// Whether the column lists the given task
    pub fn contains(&self, id: &TaskId) -> bool {
        self.task_ids.contains(id)
    }

    /// Append a task id unless it is already a member
    pub(crate) fn push(&mut self, id: TaskId) -> bool {
        if self.contains(&id) {
            return false;
        }
        self.task_ids.push(id);
        true
    }

    /// Remove every occurrence of a task id, returning whether any was removed
    pub(crate) fn remove(&mut self, id: &TaskId) -> bool {
        let before = self.task_ids.len();
        self.task_ids.retain(|t| t != id);
        self.task_ids.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_columns() {
        let cols = Column::defaults();
        assert_eq!(cols.len(), 3);
        assert_eq!(cols[0].id.as_str(), "todo");
        assert_eq!(cols[1].title, "In Progress");
        assert_eq!(cols[2].id.as_str(), "done");
        assert!(cols.iter().all(|c| c.is_permanent() && c.task_ids.is_empty()));
    }

    #[test]
    fn test_column_from_title() {
        let col = Column::from_title(" Review ");
        assert_eq!(col.id.as_str(), "review");
        assert_eq!(col.title, "Review");
        assert!(!col.is_permanent());
    }

    #[test]
    fn test_push_is_set_like() {
        let mut col = Column::new("todo", "Todo");
        assert!(col.push(TaskId::from("1")));
        assert!(!col.push(TaskId::from("1")));
        assert_eq!(col.task_ids.len(), 1);
        assert!(col.remove(&TaskId::from("1")));
        assert!(!col.remove(&TaskId::from("1")));
    }
}
