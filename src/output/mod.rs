//! Output module for progress reporting and summaries
//!
//! This module handles:
//! - Periodic status snapshots while a crawl runs
//! - Printing store statistics and records

pub mod monitor;
pub mod stats;

pub use monitor::{Monitor, MonitorHandle, StatusReporter, StatusSnapshot, TracingReporter};
pub use stats::{format_record, format_statistics, print_crawl_summary, print_records, print_statistics};
