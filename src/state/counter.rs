//! In-flight task counter with an awaitable "drained" condition

use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Counts in-flight tasks and wakes waiters whenever the count returns to zero
#[derive(Debug, Default)]
pub struct TaskCounter {
    count: AtomicUsize,
    drained: Notify,
}

impl TaskCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    /// Decrements the counter, notifying waiters if this was the last task
    pub fn decrement(&self) {
        let previous = self
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));

        match previous {
            Ok(1) => self.drained.notify_waiters(),
            Ok(_) => {}
            Err(_) => tracing::warn!("Task counter decremented below zero"),
        }
    }

    pub fn get(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Resolves once the counter reads zero
    pub async fn wait_drained(&self) {
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            // Register before checking so a decrement between the check and
            // the await cannot be missed.
            notified.as_mut().enable();

            if self.get() == 0 {
                return;
            }
            notified.await;
        }
    }
}
