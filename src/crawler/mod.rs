//! Crawler module for fetching and expanding pages
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with bounded timeouts
//! - Task, branch and claim bookkeeping
//! - The dispatcher that drives fetches and page processing

mod dispatcher;
mod fetcher;
mod task;

pub use dispatcher::Dispatcher;
pub use fetcher::{build_http_client, fetch_url, FetchResult};
pub use task::{Branch, CrawlLimits, CrawlTask, SessionHandle};
