use serde::Deserialize;
use std::time::Duration;

/// Default identifying header sent with every fetch
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 contact-crawler/1.0";

/// Main configuration structure for Contact-Crawler
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub seeds: Vec<String>,
}

/// Crawl session limits and pool sizing
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum depth to crawl from seed URLs (seeds are depth 0)
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Soft bound on the number of URLs scheduled per session
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: usize,

    /// Maximum number of fetches in flight at once
    #[serde(rename = "io-concurrency", default = "default_io_concurrency")]
    pub io_concurrency: usize,

    /// Number of compute workers; 0 means twice the available cores
    #[serde(rename = "compute-threads", default)]
    pub compute_threads: usize,

    /// How long shutdown waits for in-flight tasks before cancelling them
    #[serde(rename = "shutdown-grace-secs", default = "default_shutdown_grace")]
    pub shutdown_grace_secs: u64,
}

impl CrawlerConfig {
    /// Resolves `compute-threads`, substituting the core-relative default
    pub fn effective_compute_threads(&self) -> usize {
        if self.compute_threads > 0 {
            return self.compute_threads;
        }
        std::thread::available_parallelism()
            .map(|n| n.get() * 2)
            .unwrap_or(4)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_pages: default_max_pages(),
            io_concurrency: default_io_concurrency(),
            compute_threads: 0,
            shutdown_grace_secs: default_shutdown_grace(),
        }
    }
}

/// HTTP fetch behaviour
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    #[serde(rename = "connect-timeout-ms", default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(rename = "read-timeout-ms", default = "default_timeout_ms")]
    pub read_timeout_ms: u64,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_timeout_ms(),
            read_timeout_ms: default_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

/// Which durable engine backs the contact store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    FlatFile,
}

/// Durable storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Path to the SQLite database or the flat data file
    #[serde(default = "default_storage_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
        }
    }
}

/// Status monitor configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    #[serde(rename = "interval-secs", default = "default_monitor_interval")]
    pub interval_secs: u64,
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_monitor_interval(),
        }
    }
}

fn default_max_depth() -> u32 {
    2
}

fn default_max_pages() -> usize {
    50
}

fn default_io_concurrency() -> usize {
    10
}

fn default_shutdown_grace() -> u64 {
    60
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_storage_path() -> String {
    "./contacts.db".to_string()
}

fn default_monitor_interval() -> u64 {
    30
}
