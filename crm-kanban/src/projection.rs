//! Read-only views over a [`TaskStore`]
//!
//! Nothing here mutates or caches; every call walks the store it borrows.

use crate::store::TaskStore;
use crate::types::{ColumnId, Task, TaskId};
use serde::Serialize;

/// A task as shown on a card, with the ids of its subtasks
#[derive(Debug, Clone, Serialize)]
pub struct TaskCard<'a> {
    #[serde(flatten)]
    pub task: &'a Task,
    pub subtasks: Vec<&'a TaskId>,
}

/// A column with its resolved members
#[derive(Debug, Clone, Serialize)]
pub struct ColumnView<'a> {
    pub id: &'a ColumnId,
    pub title: &'a str,
    pub permanent: bool,
    pub count: usize,
    pub tasks: Vec<TaskCard<'a>>,
}

/// The whole board
#[derive(Debug, Clone, Serialize)]
pub struct BoardView<'a> {
    pub task_count: usize,
    pub columns: Vec<ColumnView<'a>>,
}

/// Derived views of a store
#[derive(Debug, Clone, Copy)]
pub struct BoardProjection<'a> {
    store: &'a TaskStore,
}

impl<'a> BoardProjection<'a> {
    pub fn new(store: &'a TaskStore) -> Self {
        Self { store }
    }

    /// Tasks without a parent, in insertion order
    pub fn root_tasks(&self) -> Vec<&'a Task> {
        self.store.tasks().filter(|t| !t.is_subtask()).collect()
    }

    /// Direct subtasks of `id`, in insertion order
    pub fn subtasks_of(&self, id: &TaskId) -> Vec<&'a Task> {
        self.store
            .tasks()
            .filter(|t| t.parent_id.as_ref() == Some(id))
            .collect()
    }

    /// Members of a column in display order; ids that no longer resolve are skipped
    pub fn tasks_by_column(&self, id: &ColumnId) -> Vec<&'a Task> {
        let store = self.store;
        store
            .column(id)
            .map(|c| c.task_ids.iter().filter_map(|t| store.task(t)).collect())
            .unwrap_or_default()
    }

    /// Every column with its cards
    pub fn column_views(&self) -> Vec<ColumnView<'a>> {
        self.store
            .columns()
            .iter()
            .map(|column| {
                let tasks: Vec<TaskCard<'a>> = self
                    .tasks_by_column(&column.id)
                    .into_iter()
                    .map(|task| self.card(task))
                    .collect();
                ColumnView {
                    id: &column.id,
                    title: &column.title,
                    permanent: column.is_permanent(),
                    count: tasks.len(),
                    tasks,
                }
            })
            .collect()
    }

    /// The board as a single serializable value
    pub fn board(&self) -> BoardView<'a> {
        BoardView {
            task_count: self.store.task_count(),
            columns: self.column_views(),
        }
    }

    fn card(&self, task: &'a Task) -> TaskCard<'a> {
        TaskCard {
            task,
            subtasks: self.subtasks_of(&task.id).into_iter().map(|t| &t.id).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaskDraft;

    fn store() -> TaskStore {
        let mut store = TaskStore::new();
        let mut child = Task::from_draft(TaskId::from("2"), &TaskDraft::new("child").with_status("done"));
        child.parent_id = Some(TaskId::from("1"));
        store.load(vec![
            Task::from_draft(TaskId::from("1"), &TaskDraft::new("parent")),
            child,
            Task::from_draft(TaskId::from("3"), &TaskDraft::new("other")),
        ]);
        store
    }

    #[test]
    fn test_root_and_subtasks() {
        let store = store();
        let projection = BoardProjection::new(&store);

        let roots: Vec<&str> = projection.root_tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(roots, vec!["1", "3"]);

        let subs = projection.subtasks_of(&TaskId::from("1"));
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].id, "2");
        assert!(projection.subtasks_of(&TaskId::from("3")).is_empty());
    }

    #[test]
    fn test_tasks_by_column() {
        let store = store();
        let projection = BoardProjection::new(&store);
        assert_eq!(projection.tasks_by_column(&ColumnId::todo()).len(), 2);
        assert_eq!(projection.tasks_by_column(&ColumnId::from("done"))[0].id, "2");
        assert!(projection.tasks_by_column(&ColumnId::from("missing")).is_empty());
    }

    #[test]
    fn test_board_view_serializes() {
        let store = store();
        let value = serde_json::to_value(BoardProjection::new(&store).board()).unwrap();
        assert_eq!(value["task_count"], 3);
        assert_eq!(value["columns"][0]["id"], "todo");
        assert_eq!(value["columns"][0]["count"], 2);
        assert_eq!(value["columns"][0]["tasks"][0]["subtasks"][0], "2");
        assert_eq!(value["columns"][0]["tasks"][0]["title"], "parent");
        assert_eq!(value["columns"][2]["permanent"], true);
    }
}
