//! Crawl dispatcher - the scheduling core
//!
//! Every URL goes through two hops:
//! - the fetch runs on the tokio runtime, bounded by an I/O semaphore
//! - extraction, the store write and link discovery run on a rayon pool
//!
//! Links discovered on a page are resubmitted from the compute worker, so a
//! branch keeps a task in flight for as long as it has work left.

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, fetch_url, FetchResult};
use crate::crawler::task::{Branch, ClaimGuard, CrawlLimits, CrawlTask, SessionHandle};
use crate::extract::ContactExtractor;
use crate::state::Session;
use crate::storage::ContactStore;
use crate::{CrawlerError, Result};
use rayon::{ThreadPool, ThreadPoolBuilder};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use url::Url;

/// Schedules crawl tasks across the I/O and compute pools
pub struct Dispatcher {
    session: Arc<Session>,
    store: Arc<ContactStore>,
    extractor: ContactExtractor,
    client: Client,
    io_permits: Arc<Semaphore>,
    runtime: Handle,
    compute: ThreadPool,
}

impl Dispatcher {
    /// Creates a dispatcher bound to the current tokio runtime
    ///
    /// # Arguments
    ///
    /// * `config` - Fetcher settings and pool sizes are taken from here
    /// * `session` - Shared registry and counters
    /// * `store` - Destination of extracted records
    ///
    /// # Returns
    ///
    /// * `Ok(Dispatcher)` - Ready to accept sessions
    /// * `Err(CrawlerError)` - No runtime, or the client, patterns or pool failed to build
    pub fn new(config: &Config, session: Arc<Session>, store: Arc<ContactStore>) -> Result<Self> {
        let runtime = Handle::try_current()?;
        let client = build_http_client(&config.fetcher)?;
        let extractor = ContactExtractor::new()?;

        let compute_threads = config.crawler.effective_compute_threads();
        let compute = ThreadPoolBuilder::new()
            .num_threads(compute_threads)
            .thread_name(|i| format!("compute-worker-{}", i))
            .panic_handler(|_| tracing::error!("Compute worker panicked while processing a page"))
            .build()?;

        tracing::info!(
            "Dispatcher ready: {} fetch slots, {} compute workers",
            config.crawler.io_concurrency,
            compute_threads
        );

        Ok(Self {
            session,
            store,
            extractor,
            client,
            io_permits: Arc::new(Semaphore::new(config.crawler.io_concurrency)),
            runtime,
            compute,
        })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn store(&self) -> &Arc<ContactStore> {
        &self.store
    }

    /// Submits one depth-0 task per seed and returns without waiting
    ///
    /// Every seed is parsed before anything is submitted, so an invalid seed
    /// rejects the whole call.
    ///
    /// # Returns
    ///
    /// * `Ok(SessionHandle)` - Handle whose `join()` waits for every branch
    /// * `Err(CrawlerError::SessionClosed)` - The dispatcher is shutting down
    /// * `Err(CrawlerError::UrlParse)` - A seed is not an absolute URL
    pub fn start_session(
        self: &Arc<Self>,
        seeds: &[String],
        max_depth: u32,
        max_pages: usize,
    ) -> Result<SessionHandle> {
        if !self.session.is_accepting() {
            return Err(CrawlerError::SessionClosed);
        }

        let seeds = seeds
            .iter()
            .map(|seed| Url::parse(seed.trim()).map(String::from))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let limits = CrawlLimits {
            max_depth,
            max_pages,
        };
        tracing::info!(
            "Starting crawl of {} seeds (max depth {}, max pages {})",
            seeds.len(),
            max_depth,
            max_pages
        );

        let branches: Vec<Arc<Branch>> = seeds
            .into_iter()
            .map(|seed| Arc::new(Branch::new(seed, limits)))
            .collect();

        for branch in &branches {
            self.submit(CrawlTask::seed(Arc::clone(branch)));
        }

        Ok(SessionHandle::new(branches))
    }

    /// Admits a task if it is within limits and not already claimed
    ///
    /// Admitted tasks are counted in and handed to the I/O side; refused
    /// tasks leave no trace.
    pub fn submit(self: &Arc<Self>, task: CrawlTask) {
        let limits = task.branch.limits();
        let registry = self.session.registry();

        if !self.session.is_accepting() {
            tracing::debug!("Not accepting new work, dropping {}", task.url);
            return;
        }
        if task.depth > limits.max_depth {
            tracing::debug!("Skipping {}: depth {} exceeds limit", task.url, task.depth);
            return;
        }
        if registry.visited_count() >= limits.max_pages {
            tracing::debug!("Skipping {}: page budget exhausted", task.url);
            return;
        }
        if !registry.try_claim(&task.url) {
            tracing::debug!("Skipping {}: already in flight", task.url);
            return;
        }

        let guard = ClaimGuard::new(Arc::clone(&self.session), &task);
        let this = Arc::clone(self);
        self.runtime.spawn(async move {
            this.fetch_stage(task, guard).await;
        });
    }

    async fn fetch_stage(self: Arc<Self>, task: CrawlTask, guard: ClaimGuard) {
        let mut cancelled = self.session.cancellation();

        let permit = tokio::select! {
            permit = Arc::clone(&self.io_permits).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => return,
            },
            _ = cancelled.wait_for(|c| *c) => {
                tracing::debug!("Cancelled {} before fetching", task.url);
                return;
            }
        };

        tracing::debug!("Fetching {} (depth {})", task.url, task.depth);
        let result = tokio::select! {
            result = fetch_url(&self.client, &task.url) => result,
            _ = cancelled.wait_for(|c| *c) => {
                tracing::debug!("Cancelled fetch of {}", task.url);
                return;
            }
        };
        drop(permit);

        match result {
            FetchResult::Success {
                final_url, body, ..
            } => {
                if final_url != task.url {
                    tracing::debug!("{} redirected to {}", task.url, final_url);
                }
                let this = Arc::clone(&self);
                self.compute
                    .spawn(move || this.process_page(task, body, guard));
            }
            FetchResult::HttpError { status_code } => {
                tracing::warn!("Failed to fetch {}: HTTP {}", task.url, status_code);
            }
            FetchResult::NetworkError { error } => {
                tracing::warn!("Failed to fetch {}: {}", task.url, error);
            }
        }
    }

    /// Extracts, stores and expands one fetched page on a compute worker
    fn process_page(self: &Arc<Self>, task: CrawlTask, body: String, guard: ClaimGuard) {
        let limits = task.branch.limits();
        let registry = self.session.registry();
        let follow = task.depth < limits.max_depth && registry.visited_count() < limits.max_pages;

        let page = self.extractor.extract_page(&task.url, &body, follow);
        tracing::info!(
            "Extracted {} phones, {} emails, {} addresses from {} (depth {})",
            page.record.phone_count(),
            page.record.email_count(),
            page.record.addresses.len(),
            task.url,
            task.depth
        );

        if let Err(e) = self.store.save(page.record) {
            tracing::error!("Failed to store contacts for {}: {}", task.url, e);
        }

        let mut scheduled = 0;
        for link in page.links {
            if registry.visited_count() >= limits.max_pages {
                tracing::debug!("Page budget reached while expanding {}", task.url);
                break;
            }
            if registry.mark_visited_if_new(&link) {
                self.submit(task.child(link));
                scheduled += 1;
            }
        }
        if follow {
            tracing::debug!("Scheduled {} new links from {}", scheduled, task.url);
        }

        drop(guard);
    }

    /// Stops accepting work, then waits up to `grace` for in-flight tasks
    ///
    /// Fetches still running after the grace period are cancelled. Pages
    /// already handed to the compute pool run to completion.
    pub async fn shutdown(&self, grace: Duration) {
        self.session.close();

        let active = self.session.active_tasks().get();
        tracing::info!(
            "Shutting down: waiting up to {:?} for {} in-flight tasks",
            grace,
            active
        );

        match tokio::time::timeout(grace, self.session.wait_idle()).await {
            Ok(()) => tracing::info!("All crawl tasks finished"),
            Err(_) => {
                tracing::warn!(
                    "Grace period elapsed with {} tasks in flight, cancelling",
                    self.session.active_tasks().get()
                );
                self.session.cancel();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> Config {
        let mut config = Config::default();
        config.crawler.compute_threads = 2;
        config.fetcher.connect_timeout_ms = 2_000;
        config.fetcher.read_timeout_ms = 2_000;
        config
    }

    fn dispatcher(config: &Config) -> Arc<Dispatcher> {
        let session = Arc::new(Session::new());
        let store = Arc::new(ContactStore::in_memory().unwrap());
        Arc::new(Dispatcher::new(config, session, store).unwrap())
    }

    async fn page(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(body),
            )
            .mount(server)
            .await;
    }

    #[test]
    fn test_new_requires_runtime() {
        let config = test_config();
        let session = Arc::new(Session::new());
        let store = Arc::new(ContactStore::in_memory().unwrap());
        let result = Dispatcher::new(&config, session, store);
        assert!(matches!(result, Err(CrawlerError::Runtime(_))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_single_page_is_stored() {
        let server = MockServer::start().await;
        page(&server, "/", "<title>Home</title><p>Tel 8-900-123-45-67</p>").await;

        let dispatcher = dispatcher(&test_config());
        let handle = dispatcher
            .start_session(&[format!("{}/", server.uri())], 0, 10)
            .unwrap();
        handle.join().await;

        let records = dispatcher.store().all();
        assert_eq!(records.len(), 1);
        assert!(records[0].phones.contains("+79001234567"));
        assert_eq!(dispatcher.session().status().processing_count, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_depth_limit_stops_expansion() {
        let server = MockServer::start().await;
        let base = server.uri();
        page(&server, "/", r#"<a href="/one">one</a>"#).await;
        page(&server, "/one", r#"<a href="/two">two</a>"#).await;
        page(&server, "/two", "<title>Too deep</title>").await;

        let dispatcher = dispatcher(&test_config());
        let handle = dispatcher
            .start_session(&[format!("{}/", base)], 1, 50)
            .unwrap();
        handle.join().await;

        let urls: Vec<String> = dispatcher.store().all().into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec![format!("{}/", base), format!("{}/one", base)]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failed_fetch_releases_claim() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dispatcher = dispatcher(&test_config());
        let handle = dispatcher
            .start_session(&[format!("{}/", server.uri())], 2, 10)
            .unwrap();
        handle.join().await;

        let status = dispatcher.session().status();
        assert_eq!(status.processing_count, 0);
        assert_eq!(status.active_tasks, 0);
        assert_eq!(dispatcher.store().count(), 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_invalid_seed_rejects_whole_call() {
        let dispatcher = dispatcher(&test_config());
        let result = dispatcher.start_session(
            &["https://example.com/".to_string(), "not a url".to_string()],
            1,
            10,
        );

        assert!(matches!(result, Err(CrawlerError::UrlParse(_))));
        assert_eq!(dispatcher.session().status().active_tasks, 0);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_start_after_shutdown_is_rejected() {
        let dispatcher = dispatcher(&test_config());
        dispatcher.shutdown(Duration::from_millis(100)).await;

        let result = dispatcher.start_session(&["https://example.com/".to_string()], 1, 10);
        assert!(matches!(result, Err(CrawlerError::SessionClosed)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_shutdown_cancels_slow_fetches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
            .mount(&server)
            .await;

        let mut config = test_config();
        config.fetcher.read_timeout_ms = 30_000;
        let dispatcher = dispatcher(&config);
        let handle = dispatcher
            .start_session(&[format!("{}/slow", server.uri())], 0, 10)
            .unwrap();
        assert_eq!(handle.in_flight(), 1);

        dispatcher.shutdown(Duration::from_millis(100)).await;
        tokio::time::timeout(Duration::from_secs(5), handle.join())
            .await
            .expect("cancelled fetch should finish its branch");

        assert!(dispatcher.session().is_cancelled());
        assert_eq!(dispatcher.session().status().processing_count, 0);
        assert_eq!(dispatcher.store().count(), 0);
    }
}
