//! Human-readable summaries of the contact store
//!
//! This module renders store statistics, records and end-of-crawl summaries
//! for the command line.

use crate::state::SessionStatus;
use crate::storage::{ContactRecord, StoreStats};
use std::fmt::Write;
use std::time::Duration;

/// Renders store statistics as an indented block
pub fn format_statistics(stats: &StoreStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Contact Store Statistics ===\n");
    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Total records: {}", stats.total);

    for (label, count) in [
        ("With phones", stats.with_phones),
        ("With emails", stats.with_emails),
        ("With addresses", stats.with_addresses),
    ] {
        let _ = writeln!(
            out,
            "  {}: {} ({:.1}%)",
            label,
            count,
            percentage(count, stats.total)
        );
    }
    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &StoreStats) {
    print!("{}", format_statistics(stats));
}

/// Renders one record as a multi-line entry
pub fn format_record(record: &ContactRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", record.url);
    let _ = writeln!(out, "  Title: {}", record.title.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "  Collected: {}", record.collected_at.to_rfc3339());

    for (label, values) in [
        ("Phones", &record.phones),
        ("Emails", &record.emails),
        ("Addresses", &record.addresses),
    ] {
        if !values.is_empty() {
            let joined: Vec<&str> = values.iter().map(String::as_str).collect();
            let _ = writeln!(out, "  {}: {}", label, joined.join(", "));
        }
    }
    out
}

/// Prints records to stdout followed by a count line
pub fn print_records(records: &[ContactRecord]) {
    for record in records {
        println!("{}", format_record(record));
    }
    println!("{} records", records.len());
}

/// Prints the end-of-crawl summary
pub fn print_crawl_summary(status: &SessionStatus, stats: &StoreStats, elapsed: Duration) {
    println!("=== Crawl Summary ===\n");
    println!("  Elapsed: {:.1}s", elapsed.as_secs_f64());
    println!("  URLs scheduled for expansion: {}", status.visited_count);
    println!("  Tasks still in flight: {}", status.active_tasks);
    println!();
    print_statistics(stats);
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}
