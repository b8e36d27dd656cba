//! Storage module for harvested contact records
//!
//! This module contains:
//! - The [`ContactRecord`] data model and query enums
//! - The [`ContactTable`] durable backend contract
//! - SQLite and flat-file backends
//! - The write-through [`ContactStore`] cache used by the crawler

mod flat_file;
mod schema;
mod sqlite;
mod store;
mod traits;

pub use flat_file::{write_flat_file, FlatFileTable};
pub use sqlite::SqliteTable;
pub use store::ContactStore;
pub use traits::{ContactTable, StorageError, StorageResult};

use crate::CrawlerError;
use chrono::{DateTime, TimeZone, Utc};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Separator used to join phone, email and address sets into one column
pub const SET_DELIMITER: &str = ";;";

/// Contact signals harvested from one page
///
/// Keyed by URL; the store holds at most one record per URL and a re-crawl
/// replaces the previous record wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactRecord {
    pub url: String,
    pub title: Option<String>,
    pub phones: BTreeSet<String>,
    pub emails: BTreeSet<String>,
    pub addresses: BTreeSet<String>,
    pub collected_at: DateTime<Utc>,
}

impl ContactRecord {
    /// Creates an empty record stamped with the current time
    ///
    /// The timestamp is truncated to milliseconds, the precision both durable
    /// backends store.
    pub fn new(url: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            url: url.into(),
            title: None,
            phones: BTreeSet::new(),
            emails: BTreeSet::new(),
            addresses: BTreeSet::new(),
            collected_at: datetime_from_millis(now.timestamp_millis()).unwrap_or(now),
        }
    }

    pub fn phone_count(&self) -> usize {
        self.phones.len()
    }

    pub fn email_count(&self) -> usize {
        self.emails.len()
    }

    /// Case-insensitive substring match over url, title and every set element
    ///
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        let hit = |value: &str| value.to_lowercase().contains(needle);

        hit(&self.url)
            || self.title.as_deref().map_or(false, hit)
            || self.phones.iter().any(|p| hit(p.as_str()))
            || self.emails.iter().any(|e| hit(e.as_str()))
            || self.addresses.iter().any(|a| hit(a.as_str()))
    }
}

/// Epoch milliseconds back to a UTC timestamp
pub(crate) fn datetime_from_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

/// Joins a set with [`SET_DELIMITER`]
pub(crate) fn join_set(values: &BTreeSet<String>) -> String {
    values
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(SET_DELIMITER)
}

/// Inverse of [`join_set`]; empty segments are dropped
pub(crate) fn split_set(joined: &str) -> BTreeSet<String> {
    joined
        .split(SET_DELIMITER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Fields records can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Url,
    Title,
    PhoneCount,
    EmailCount,
    Timestamp,
}

impl SortField {
    pub const ALL: [SortField; 5] = [
        SortField::Url,
        SortField::Title,
        SortField::PhoneCount,
        SortField::EmailCount,
        SortField::Timestamp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Title => "title",
            Self::PhoneCount => "phones",
            Self::EmailCount => "emails",
            Self::Timestamp => "timestamp",
        }
    }

    /// Parses a field name, falling back to [`SortField::Url`] when unknown
    pub fn from_str_lossy(name: &str) -> Self {
        name.parse().unwrap_or(Self::Url)
    }

    /// Ascending comparison of two records on this field alone
    pub fn compare(&self, a: &ContactRecord, b: &ContactRecord) -> Ordering {
        match self {
            Self::Url => a.url.cmp(&b.url),
            Self::Title => a.title.cmp(&b.title),
            Self::PhoneCount => a.phone_count().cmp(&b.phone_count()),
            Self::EmailCount => a.email_count().cmp(&b.email_count()),
            Self::Timestamp => a.collected_at.cmp(&b.collected_at),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = CrawlerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "url" => Ok(Self::Url),
            "title" => Ok(Self::Title),
            "phones" | "phonecount" | "phone-count" => Ok(Self::PhoneCount),
            "emails" | "emailcount" | "email-count" => Ok(Self::EmailCount),
            "timestamp" | "collected-at" => Ok(Self::Timestamp),
            _ => Err(CrawlerError::UnknownSortField(s.to_string())),
        }
    }
}

/// Aggregate counts over the stored records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub total: usize,
    pub with_phones: usize,
    pub with_emails: usize,
    pub with_addresses: usize,
}
