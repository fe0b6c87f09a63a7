//! BoardContext - shared state handed to every command
//!
//! The context provides access to the store, the gateway and the activity
//! log. No business logic lives here; commands do all the work.
//!
//! Lock discipline: commands read what they need, release the lock, await the
//! gateway, then take the write lock to apply the confirmed change. No guard
//! is ever held across a gateway call.

use crate::gateway::PersistenceGateway;
use crate::store::TaskStore;
use crm_operations::LogEntry;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Entries kept in the in-memory activity log
pub const ACTIVITY_CAPACITY: usize = 500;

/// Context passed to every command - provides access, not logic
pub struct BoardContext {
    store: RwLock<TaskStore>,
    gateway: Arc<dyn PersistenceGateway>,
    activity: Mutex<VecDeque<LogEntry>>,
}

impl BoardContext {
    /// Create a context with an empty board backed by `gateway`
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self::with_store(gateway, TaskStore::new())
    }

    /// Create a context around an existing store
    pub fn with_store(gateway: Arc<dyn PersistenceGateway>, store: TaskStore) -> Self {
        Self {
            store: RwLock::new(store),
            gateway,
            activity: Mutex::new(VecDeque::new()),
        }
    }

    // =========================================================================
    // Store access
    // =========================================================================

    pub async fn read_store(&self) -> RwLockReadGuard<'_, TaskStore> {
        self.store.read().await
    }

    pub(crate) async fn write_store(&self) -> RwLockWriteGuard<'_, TaskStore> {
        self.store.write().await
    }

    /// Clone of the current store, for callers that want to hold on to it
    pub async fn snapshot(&self) -> TaskStore {
        self.store.read().await.clone()
    }

    // =========================================================================
    // Gateway access
    // =========================================================================

    pub fn gateway(&self) -> &dyn PersistenceGateway {
        self.gateway.as_ref()
    }

    // =========================================================================
    // Activity log
    // =========================================================================

    /// Record an entry, dropping the oldest beyond [`ACTIVITY_CAPACITY`]
    pub async fn append_activity(&self, entry: LogEntry) {
        let mut log = self.activity.lock().await;
        log.push_front(entry);
        log.truncate(ACTIVITY_CAPACITY);
    }

    /// Activity entries, newest first
    pub async fn read_activity(&self, limit: Option<usize>) -> Vec<LogEntry> {
        let log = self.activity.lock().await;
        log.iter()
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::InMemoryGateway;
    use serde_json::json;

    fn setup() -> BoardContext {
        BoardContext::new(Arc::new(InMemoryGateway::new()))
    }

    #[tokio::test]
    async fn test_new_context_has_default_board() {
        let ctx = setup();
        assert_eq!(ctx.read_store().await.columns().len(), 3);
        assert!(ctx.read_activity(None).await.is_empty());
    }

    #[tokio::test]
    async fn test_activity_newest_first_and_bounded() {
        let ctx = setup();
        for i in 0..(ACTIVITY_CAPACITY + 5) {
            ctx.append_activity(LogEntry::new("add task", json!({ "n": i }), json!({}), None, 0))
                .await;
        }
        let all = ctx.read_activity(None).await;
        assert_eq!(all.len(), ACTIVITY_CAPACITY);
        assert_eq!(all[0].input["n"], ACTIVITY_CAPACITY + 4);

        let two = ctx.read_activity(Some(2)).await;
        assert_eq!(two.len(), 2);
    }
}
