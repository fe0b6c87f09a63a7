//! Periodic reconciliation with the backend
//!
//! [`BoardSync`] runs [`LoadBoard`] on a fixed interval in a background task.
//! One poll runs at a time; ticks that fall due while a poll is still running
//! are skipped rather than queued. Shutdown cancels an in-flight poll.

use crate::board::LoadBoard;
use crate::context::BoardContext;
use crm_operations::Execute;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Observable state of the poller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStatus {
    /// Completed successful loads
    pub generation: u64,
    /// Message of the most recent failed load, cleared by the next success
    pub last_error: Option<String>,
}

/// Handle to a running poller
pub struct BoardSync {
    shutdown: watch::Sender<bool>,
    refresh: Arc<Notify>,
    status: watch::Receiver<SyncStatus>,
    handle: JoinHandle<()>,
}

impl BoardSync {
    /// Start polling `ctx` every `period`; the first poll runs immediately
    pub fn spawn(ctx: Arc<BoardContext>, period: Duration) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);
        let (status_tx, status) = watch::channel(SyncStatus::default());
        let refresh = Arc::new(Notify::new());

        let handle = tokio::spawn(run(ctx, period, shutdown_rx, status_tx, refresh.clone()));

        Self {
            shutdown,
            refresh,
            status,
            handle,
        }
    }

    /// Poll now instead of waiting for the next tick
    pub fn refresh_now(&self) {
        self.refresh.notify_one();
    }

    /// Subscribe to status changes
    pub fn status(&self) -> watch::Receiver<SyncStatus> {
        self.status.clone()
    }

    /// Stop polling and wait for the background task to finish
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            warn!(error = %e, "board sync task ended abnormally");
        }
    }
}

async fn run(
    ctx: Arc<BoardContext>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    status: watch::Sender<SyncStatus>,
    refresh: Arc<Notify>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(period_ms = period.as_millis() as u64, "board sync started");

    let load = LoadBoard::new();
    loop {
        if *shutdown.borrow() {
            break;
        }

        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
            _ = refresh.notified() => ticker.reset(),
        }

        let result = tokio::select! {
            _ = shutdown.changed() => break,
            result = load.execute(ctx.as_ref()) => result.into_result(),
        };

        match result {
            Ok(value) => {
                debug!(tasks = %value["tasks"], "board sync poll completed");
                status.send_modify(|s| {
                    s.generation += 1;
                    s.last_error = None;
                });
            }
            Err(e) => {
                warn!(error = %e, "board sync poll failed");
                status.send_modify(|s| s.last_error = Some(e.to_string()));
            }
        }
    }

    info!("board sync stopped");
}
