//! Pointer drag gestures over the board
//!
//! A gesture starts on a task card, may hover over any number of targets and
//! commits at most one [`MoveTask`] when released. Hovering never touches the
//! store; only the returned command does, once executed.

use crate::store::TaskStore;
use crate::task::MoveTask;
use crate::types::{ColumnId, TaskId};
use serde::{Deserialize, Serialize};

/// What the pointer is over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum DropTarget {
    /// A column body; the task goes to that column
    Column(ColumnId),
    /// Another task card; the task goes to that card's column
    Task(TaskId),
}

impl DropTarget {
    /// Classify a raw droppable id: column ids take precedence over task ids
    pub fn resolve(raw: &str, store: &TaskStore) -> Option<Self> {
        let column = ColumnId::from(raw);
        if store.has_column(&column) {
            return Some(Self::Column(column));
        }
        let task = TaskId::from(raw);
        store.contains_task(&task).then_some(Self::Task(task))
    }

    /// Column a task dropped here would land in
    pub fn column<'a>(&'a self, store: &'a TaskStore) -> Option<&'a ColumnId> {
        match self {
            Self::Column(id) => store.column(id).map(|c| &c.id),
            Self::Task(id) => store.task(id).map(|t| &t.status),
        }
    }
}

/// An in-progress drag of one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragGesture {
    task: TaskId,
    hover: Option<DropTarget>,
}

impl DragGesture {
    /// Pick up a task
    pub fn start(task: impl Into<TaskId>) -> Self {
        Self {
            task: task.into(),
            hover: None,
        }
    }

    pub fn task(&self) -> &TaskId {
        &self.task
    }

    /// Track the pointer; presentation only
    pub fn hover(&mut self, target: Option<DropTarget>) {
        self.hover = target;
    }

    /// Target currently under the pointer
    pub fn hovered(&self) -> Option<&DropTarget> {
        self.hover.as_ref()
    }

    /// Drop the task, producing the move to execute if there is one
    ///
    /// Releasing over nothing, over the dragged card itself, or over the
    /// column the task already sits in yields `None`.
    pub fn release(self, target: Option<DropTarget>, store: &TaskStore) -> Option<MoveTask> {
        let target = target?;
        if target == DropTarget::Task(self.task.clone()) {
            return None;
        }
        let source = &store.task(&self.task)?.status;
        let destination = target.column(store)?;
        if source == destination {
            return None;
        }
        Some(MoveTask::new(self.task, source.clone(), destination.clone()))
    }

    /// Abandon the gesture
    pub fn cancel(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Task, TaskDraft};

    fn store() -> TaskStore {
        let mut store = TaskStore::new();
        store.load(vec![
            Task::from_draft(TaskId::from("1"), &TaskDraft::new("a")),
            Task::from_draft(TaskId::from("2"), &TaskDraft::new("b").with_status("done")),
        ]);
        store
    }

    #[test]
    fn test_resolve_prefers_columns() {
        let store = store();
        assert_eq!(
            DropTarget::resolve("done", &store),
            Some(DropTarget::Column(ColumnId::from("done")))
        );
        assert_eq!(
            DropTarget::resolve("2", &store),
            Some(DropTarget::Task(TaskId::from("2")))
        );
        assert_eq!(DropTarget::resolve("zzz", &store), None);
    }

    #[test]
    fn test_release_on_column() {
        let store = store();
        let mv = DragGesture::start("1")
            .release(Some(DropTarget::Column(ColumnId::from("in-progress"))), &store)
            .unwrap();
        assert_eq!(mv, MoveTask::new("1", "todo", "in-progress"));
    }

    #[test]
    fn test_release_on_task_inherits_its_column() {
        let store = store();
        let mut gesture = DragGesture::start("1");
        gesture.hover(Some(DropTarget::Task(TaskId::from("2"))));
        assert!(gesture.hovered().is_some());

        let mv = gesture
            .release(Some(DropTarget::Task(TaskId::from("2"))), &store)
            .unwrap();
        assert_eq!(mv.destination, "done");
    }

    #[test]
    fn test_release_without_move() {
        let store = store();
        assert!(DragGesture::start("1").release(None, &store).is_none());
        assert!(DragGesture::start("1")
            .release(Some(DropTarget::Task(TaskId::from("1"))), &store)
            .is_none());
        assert!(DragGesture::start("1")
            .release(Some(DropTarget::Column(ColumnId::todo())), &store)
            .is_none());
        assert!(DragGesture::start("9")
            .release(Some(DropTarget::Column(ColumnId::todo())), &store)
            .is_none());
    }

    #[test]
    fn test_hover_does_not_touch_store() {
        let store = store();
        let before = store.columns().to_vec();
        let mut gesture = DragGesture::start("1");
        gesture.hover(Some(DropTarget::Column(ColumnId::from("done"))));
        gesture.cancel();
        assert_eq!(store.columns(), before.as_slice());
    }
}
