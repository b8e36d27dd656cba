//! Crawl service facade
//!
//! Wires one session, store, dispatcher and optional monitor together and
//! exposes the crawl control and query surface.

use crate::config::Config;
use crate::crawler::{Dispatcher, SessionHandle};
use crate::output::{Monitor, MonitorHandle, StatusReporter, TracingReporter};
use crate::state::{Session, SessionStatus};
use crate::storage::{ContactRecord, ContactStore, SortField, StoreStats};
use crate::Result;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Entry point for running crawls and querying harvested contacts
pub struct CrawlService {
    config: Config,
    session: Arc<Session>,
    store: Arc<ContactStore>,
    dispatcher: Arc<Dispatcher>,
    monitor: Mutex<Option<MonitorHandle>>,
}

impl CrawlService {
    /// Opens the configured store and builds a dispatcher on the current runtime
    pub fn new(config: Config) -> Result<Self> {
        let store = Arc::new(ContactStore::open(&config.storage)?);
        Self::with_store(config, store)
    }

    /// Builds the service around an already opened store
    pub fn with_store(config: Config, store: Arc<ContactStore>) -> Result<Self> {
        let session = Arc::new(Session::new());
        let dispatcher = Arc::new(Dispatcher::new(
            &config,
            Arc::clone(&session),
            Arc::clone(&store),
        )?);

        Ok(Self {
            config,
            session,
            store,
            dispatcher,
            monitor: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Starts the monitor with the default tracing reporter
    pub fn start_monitor(&self) {
        self.start_monitor_with(Arc::new(TracingReporter));
    }

    /// Starts the monitor with a custom reporter, replacing any running one
    ///
    /// A replaced monitor is stopped in the background.
    pub fn start_monitor_with(&self, reporter: Arc<dyn StatusReporter>) {
        let monitor = Monitor::new(
            Arc::clone(&self.session),
            Arc::clone(&self.store),
            reporter,
            self.config.monitor.interval(),
        );
        let previous = self
            .monitor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(monitor.spawn());

        if let Some(previous) = previous {
            tokio::spawn(previous.stop());
        }
    }

    /// Starts crawling `seeds`; returns as soon as the seeds are submitted
    pub fn start_session(
        &self,
        seeds: &[String],
        max_depth: u32,
        max_pages: usize,
    ) -> Result<SessionHandle> {
        self.dispatcher.start_session(seeds, max_depth, max_pages)
    }

    /// Starts crawling the configured seeds with the configured limits
    pub fn start_configured_session(&self) -> Result<SessionHandle> {
        self.start_session(
            &self.config.seeds,
            self.config.crawler.max_depth,
            self.config.crawler.max_pages,
        )
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    pub fn records(&self) -> Vec<ContactRecord> {
        self.store.all()
    }

    pub fn sorted_records(&self, field: SortField, ascending: bool) -> Vec<ContactRecord> {
        self.store.sorted_by(field, ascending)
    }

    pub fn filtered_records(&self, term: &str) -> Vec<ContactRecord> {
        self.store.filter(term)
    }

    pub fn count(&self) -> usize {
        self.store.count()
    }

    pub fn clear(&self) -> Result<()> {
        self.store.clear()?;
        tracing::info!("Cleared all contact records");
        Ok(())
    }

    pub fn stats(&self) -> StoreStats {
        self.store.stats()
    }

    /// Writes every record to `path` in the flat-file format
    pub fn export_flat_file(&self, path: &Path) -> Result<usize> {
        Ok(self.store.export_flat_file(path)?)
    }

    /// Stops the monitor and shuts the dispatcher down
    ///
    /// In-flight tasks get `grace` to finish before their fetches are
    /// cancelled. Later `start_session` calls fail with `SessionClosed`.
    pub async fn shutdown(&self, grace: Duration) {
        let monitor = self
            .monitor
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(monitor) = monitor {
            monitor.stop().await;
        }

        self.dispatcher.shutdown(grace).await;
    }

    /// [`shutdown`](Self::shutdown) with the configured grace period
    pub async fn shutdown_gracefully(&self) {
        self.shutdown(self.config.crawler.shutdown_grace()).await;
    }
}
