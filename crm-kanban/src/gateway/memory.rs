//! In-memory gateway, behaving like the REST backend without the network

use super::{GatewayResult, MoveReceipt, PersistenceGateway, TaskSnapshot};
use crate::error::GatewayError;
use crate::types::{ColumnId, Task, TaskDraft, TaskId, TaskPatch};
use crate::wire;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};

/// Which calls an [`InMemoryGateway`] should fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailOn {
    List,
    Create,
    Update,
    Delete,
    /// Every move
    Move,
    /// Moves of one task only
    MoveOf(TaskId),
    /// Answer moves with the task's unchanged status
    IgnoreMove,
}

#[derive(Debug, Default)]
struct State {
    tasks: IndexMap<TaskId, Task>,
    malformed: Vec<Value>,
    next_id: u64,
    failures: Vec<FailOn>,
    calls: Vec<String>,
    latency: Option<Duration>,
    hold: Option<Arc<CommitHold>>,
}

impl State {
    fn fails(&self, kind: &FailOn) -> bool {
        self.failures.contains(kind)
    }

    fn allocate_id(&mut self) -> TaskId {
        loop {
            self.next_id += 1;
            let id = TaskId::from(self.next_id.to_string());
            if !self.tasks.contains_key(&id) {
                return id;
            }
        }
    }
}

fn unavailable() -> GatewayError {
    GatewayError::Status {
        status: 503,
        message: "backend unavailable".into(),
    }
}

fn not_found() -> GatewayError {
    GatewayError::Status {
        status: 404,
        message: "Task not found".into(),
    }
}

/// Pauses one mutating call after the backend has applied it
///
/// Lets a test interleave other work, such as a reload, between the backend
/// committing a change and the caller seeing the answer.
#[derive(Debug, Default)]
pub struct CommitHold {
    committed: Notify,
    release: Notify,
}

impl CommitHold {
    /// Wait until the held call has been applied
    pub async fn committed(&self) {
        self.committed.notified().await;
    }

    /// Let the held call answer
    pub fn release(&self) {
        self.release.notify_one();
    }
}

/// Backend stand-in that assigns sequential ids ("1", "2", ...)
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    state: Mutex<State>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with these tasks already stored
    pub async fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let gateway = Self::new();
        for task in tasks {
            gateway.seed(task).await;
        }
        gateway
    }

    /// Store a task as-is, overwriting any task with the same id
    pub async fn seed(&self, task: Task) {
        let mut state = self.state.lock().await;
        state.tasks.insert(task.id.clone(), task);
    }

    /// Store a raw backend record; records that do not parse are served back verbatim
    pub async fn insert_raw(&self, record: Value) {
        let mut state = self.state.lock().await;
        match wire::parse_task(&record) {
            Ok(task) => {
                state.tasks.insert(task.id.clone(), task);
            }
            Err(_) => state.malformed.push(record),
        }
    }

    /// Tasks currently stored, in creation order
    pub async fn snapshot(&self) -> Vec<Task> {
        self.state.lock().await.tasks.values().cloned().collect()
    }

    /// Make matching calls fail until [`recover`](Self::recover)
    pub async fn fail_on(&self, kind: FailOn) {
        self.state.lock().await.failures.push(kind);
    }

    /// Stop injecting failures
    pub async fn recover(&self) {
        self.state.lock().await.failures.clear();
    }

    /// Delay every call by `latency`
    pub async fn set_latency(&self, latency: Option<Duration>) {
        self.state.lock().await.latency = latency;
    }

    /// Hold the next create, update, delete or move once it is applied
    pub async fn hold_next_commit(&self) -> Arc<CommitHold> {
        let hold = Arc::new(CommitHold::default());
        self.state.lock().await.hold = Some(hold.clone());
        hold
    }

    /// Calls received so far, e.g. `"move 3 done"`
    pub async fn calls(&self) -> Vec<String> {
        self.state.lock().await.calls.clone()
    }

    /// Number of mutating calls received so far
    pub async fn mutation_count(&self) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|c| *c != "list")
            .count()
    }

    async fn enter(&self, call: String) {
        let latency = {
            let mut state = self.state.lock().await;
            state.calls.push(call);
            state.latency
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }

    async fn committed<T>(&self, result: GatewayResult<T>) -> GatewayResult<T> {
        if result.is_ok() {
            let hold = self.state.lock().await.hold.take();
            if let Some(hold) = hold {
                hold.committed.notify_one();
                hold.release.notified().await;
            }
        }
        result
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn list_tasks(&self) -> GatewayResult<TaskSnapshot> {
        self.enter("list".into()).await;
        let state = self.state.lock().await;
        if state.fails(&FailOn::List) {
            return Err(unavailable());
        }
        Ok(TaskSnapshot {
            tasks: state.tasks.values().cloned().collect(),
            rejected: state.malformed.len(),
        })
    }

    async fn create_task(&self, draft: &TaskDraft) -> GatewayResult<Task> {
        self.enter("create".into()).await;
        let result = {
            let mut state = self.state.lock().await;
            if state.fails(&FailOn::Create) {
                Err(unavailable())
            } else if draft.title.trim().is_empty() {
                Err(GatewayError::Status {
                    status: 400,
                    message: "Title is required".into(),
                })
            } else {
                let id = state.allocate_id();
                let task = Task::from_draft(id.clone(), draft);
                state.tasks.insert(id, task.clone());
                Ok(task)
            }
        };
        self.committed(result).await
    }

    async fn update_task(&self, id: &TaskId, patch: &TaskPatch) -> GatewayResult<Task> {
        self.enter(format!("update {}", id)).await;
        let result = {
            let mut state = self.state.lock().await;
            if state.fails(&FailOn::Update) {
                Err(unavailable())
            } else {
                state.tasks.get_mut(id).ok_or_else(not_found).map(|task| {
                    *task = patch.apply_to(task);
                    task.clone()
                })
            }
        };
        self.committed(result).await
    }

    async fn delete_task(&self, id: &TaskId) -> GatewayResult<()> {
        self.enter(format!("delete {}", id)).await;
        let result = {
            let mut state = self.state.lock().await;
            if state.fails(&FailOn::Delete) {
                Err(unavailable())
            } else {
                state.tasks.shift_remove(id).map(|_| ()).ok_or_else(not_found)
            }
        };
        self.committed(result).await
    }

    async fn move_task(&self, id: &TaskId, destination: &ColumnId) -> GatewayResult<MoveReceipt> {
        self.enter(format!("move {} {}", id, destination)).await;
        let result = {
            let mut state = self.state.lock().await;
            if state.fails(&FailOn::Move) || state.fails(&FailOn::MoveOf(id.clone())) {
                Err(unavailable())
            } else {
                let ignore = state.fails(&FailOn::IgnoreMove);
                state.tasks.get_mut(id).ok_or_else(not_found).map(|task| {
                    if !ignore {
                        task.status = destination.clone();
                    }
                    MoveReceipt {
                        id: id.clone(),
                        status: task.status.clone(),
                    }
                })
            }
        };
        self.committed(result).await
    }
}
