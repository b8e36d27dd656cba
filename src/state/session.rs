//! Session object shared by every task of a crawl run

use crate::state::{DedupRegistry, TaskCounter};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

/// Point-in-time view of a session, as reported by `status()` and the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStatus {
    pub active_tasks: usize,
    pub visited_count: usize,
    pub processing_count: usize,
}

/// Process-wide crawl state for the lifetime of a service
///
/// Created once, shared behind an `Arc` by the dispatcher, its tasks and the
/// monitor. Shutdown happens in two steps: [`close`](Self::close) stops new
/// work from being accepted, [`cancel`](Self::cancel) tells in-flight fetches
/// to abandon their request.
#[derive(Debug)]
pub struct Session {
    registry: DedupRegistry,
    active_tasks: TaskCounter,
    accepting: AtomicBool,
    cancel_tx: watch::Sender<bool>,
}

impl Session {
    pub fn new() -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            registry: DedupRegistry::new(),
            active_tasks: TaskCounter::new(),
            accepting: AtomicBool::new(true),
            cancel_tx,
        }
    }

    pub fn registry(&self) -> &DedupRegistry {
        &self.registry
    }

    pub fn active_tasks(&self) -> &TaskCounter {
        &self.active_tasks
    }

    pub fn status(&self) -> SessionStatus {
        let (visited_count, processing_count) = self.registry.sizes();
        SessionStatus {
            active_tasks: self.active_tasks.get(),
            visited_count,
            processing_count,
        }
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::SeqCst)
    }

    /// Stops accepting new crawl tasks; in-flight tasks keep running
    pub fn close(&self) {
        self.accepting.store(false, Ordering::SeqCst);
    }

    /// Signals in-flight fetches to give up
    pub fn cancel(&self) {
        self.close();
        self.cancel_tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    /// A receiver that observes `true` once [`cancel`](Self::cancel) is called
    pub fn cancellation(&self) -> watch::Receiver<bool> {
        self.cancel_tx.subscribe()
    }

    /// Resolves once no crawl task is in flight
    pub async fn wait_idle(&self) {
        self.active_tasks.wait_drained().await;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
