//! Contact-Crawler: a bounded concurrent contact harvester
//!
//! This crate crawls a set of seed URLs to a bounded depth, extracts contact
//! signals (titles, phone numbers, emails, address snippets) from every page
//! it fetches, and keeps them in a write-through store that can be sorted,
//! filtered and counted while the crawl is still running.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod service;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Contact-Crawler operations
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid extraction pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Failed to build compute pool: {0}")]
    ComputePool(#[from] rayon::ThreadPoolBuildError),

    #[error("No async runtime available: {0}")]
    Runtime(#[from] tokio::runtime::TryCurrentError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Unknown sort field: {0}")]
    UnknownSortField(String),

    #[error("Crawl session has been shut down")]
    SessionClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Contact-Crawler operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Dispatcher, SessionHandle};
pub use extract::ContactExtractor;
pub use service::CrawlService;
pub use state::{DedupRegistry, Session, SessionStatus};
pub use storage::{ContactRecord, ContactStore, SortField};
