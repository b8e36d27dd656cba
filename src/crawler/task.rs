//! Crawl tasks, branches and the claim guard

use crate::state::{Session, TaskCounter};
use std::sync::Arc;

/// Depth and page-budget limits of one `start_session` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlLimits {
    /// Seeds are depth 0; pages deeper than this are never fetched
    pub max_depth: u32,

    /// Soft bound on the number of visited URLs
    pub max_pages: usize,
}

/// Everything reachable from one seed
///
/// Tasks of a branch count themselves in and out of `in_flight`, so the
/// branch is finished once that count drains to zero.
#[derive(Debug)]
pub struct Branch {
    seed: String,
    limits: CrawlLimits,
    in_flight: TaskCounter,
}

impl Branch {
    pub fn new(seed: impl Into<String>, limits: CrawlLimits) -> Self {
        Self {
            seed: seed.into(),
            limits,
            in_flight: TaskCounter::new(),
        }
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }

    pub fn limits(&self) -> CrawlLimits {
        self.limits
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.get()
    }

    /// Resolves once no task of this branch is in flight
    pub async fn join(&self) {
        self.in_flight.wait_drained().await;
    }
}

/// One URL to crawl at a given depth
#[derive(Debug, Clone)]
pub struct CrawlTask {
    pub url: String,
    pub depth: u32,
    pub branch: Arc<Branch>,
}

impl CrawlTask {
    /// The depth-0 task rooting `branch`
    pub fn seed(branch: Arc<Branch>) -> Self {
        Self {
            url: branch.seed().to_string(),
            depth: 0,
            branch,
        }
    }

    /// A task for a link discovered on this task's page
    pub fn child(&self, url: String) -> Self {
        Self {
            url,
            depth: self.depth + 1,
            branch: Arc::clone(&self.branch),
        }
    }
}

/// Completion handle returned by `start_session`
#[derive(Debug, Clone)]
pub struct SessionHandle {
    branches: Vec<Arc<Branch>>,
}

impl SessionHandle {
    pub(crate) fn new(branches: Vec<Arc<Branch>>) -> Self {
        Self { branches }
    }

    pub fn branches(&self) -> &[Arc<Branch>] {
        &self.branches
    }

    /// Tasks of this session still in flight across all branches
    pub fn in_flight(&self) -> usize {
        self.branches.iter().map(|b| b.in_flight()).sum()
    }

    pub fn is_finished(&self) -> bool {
        self.in_flight() == 0
    }

    /// Resolves once every branch has finished
    pub async fn join(&self) {
        for branch in &self.branches {
            branch.join().await;
        }
    }
}

/// Held by a task from successful claim to completion
///
/// Counts the task into the session and its branch on creation. Dropping it,
/// on any exit path including panics and cancelled fetches, releases the
/// claim and counts the task back out.
pub(crate) struct ClaimGuard {
    session: Arc<Session>,
    branch: Arc<Branch>,
    url: String,
}

impl ClaimGuard {
    /// Must only be called after `try_claim(url)` succeeded
    pub(crate) fn new(session: Arc<Session>, task: &CrawlTask) -> Self {
        session.active_tasks().increment();
        task.branch.in_flight.increment();

        Self {
            session,
            branch: Arc::clone(&task.branch),
            url: task.url.clone(),
        }
    }
}

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        if !self.session.registry().release(&self.url) {
            tracing::warn!("Released {} but it was not claimed", self.url);
        }
        self.session.active_tasks().decrement();
        self.branch.in_flight.decrement();
    }
}
