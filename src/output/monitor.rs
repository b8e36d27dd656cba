//! Periodic status monitor
//!
//! Samples the session counters and the store size on a fixed interval and
//! hands the snapshot to a [`StatusReporter`]. The monitor only reads; a
//! failing reporter is logged and the next tick carries on.

use crate::state::Session;
use crate::storage::ContactStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Error type reporters may return
pub type ReportError = Box<dyn std::error::Error + Send + Sync>;

/// One sample of crawl progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub active_tasks: usize,
    pub visited_count: usize,
    pub processing_count: usize,
    pub stored_records: usize,
    pub taken_at: DateTime<Utc>,
}

/// Destination for status snapshots
pub trait StatusReporter: Send + Sync {
    fn report(&self, snapshot: &StatusSnapshot) -> Result<(), ReportError>;
}

/// Emits each snapshot as a structured `tracing` event
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl StatusReporter for TracingReporter {
    fn report(&self, snapshot: &StatusSnapshot) -> Result<(), ReportError> {
        tracing::info!(
            active_tasks = snapshot.active_tasks,
            visited = snapshot.visited_count,
            processing = snapshot.processing_count,
            stored = snapshot.stored_records,
            "Crawl status"
        );
        Ok(())
    }
}

/// Read-only sampler over a session and its store
pub struct Monitor {
    session: Arc<Session>,
    store: Arc<ContactStore>,
    reporter: Arc<dyn StatusReporter>,
    interval: Duration,
}

impl Monitor {
    pub fn new(
        session: Arc<Session>,
        store: Arc<ContactStore>,
        reporter: Arc<dyn StatusReporter>,
        interval: Duration,
    ) -> Self {
        Self {
            session,
            store,
            reporter,
            interval,
        }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let status = self.session.status();
        StatusSnapshot {
            active_tasks: status.active_tasks,
            visited_count: status.visited_count,
            processing_count: status.processing_count,
            stored_records: self.store.count(),
            taken_at: Utc::now(),
        }
    }

    /// Takes one snapshot and reports it, logging any reporter failure
    pub fn tick(&self) {
        let snapshot = self.snapshot();
        if let Err(e) = self.reporter.report(&snapshot) {
            tracing::warn!("Status report failed: {}", e);
        }
    }

    /// Runs the monitor on the current runtime until the handle is stopped
    ///
    /// The first report is made one interval after spawning.
    pub fn spawn(self) -> MonitorHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => self.tick(),
                    _ = &mut stop_rx => break,
                }
            }
            tracing::debug!("Monitor stopped");
        });

        MonitorHandle { stop_tx, task }
    }
}

/// Stops a spawned [`Monitor`]
pub struct MonitorHandle {
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Signals the monitor and waits for its task to exit
    pub async fn stop(self) {
        let _ = self.stop_tx.send(());
        if let Err(e) = self.task.await {
            tracing::warn!("Monitor task ended abnormally: {}", e);
        }
    }
}
