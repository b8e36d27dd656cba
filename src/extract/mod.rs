//! Contact extraction pipeline
//!
//! Turns a fetched page into a [`ContactRecord`]:
//! - title from the `<title>` element
//! - phone numbers normalized to `+7XXXXXXXXXX`
//! - lowercase emails from text and `mailto:` anchors
//! - one keyword-located address snippet
//! - outbound links to feed back into the dispatcher

mod addresses;
mod emails;
mod links;
mod phones;

pub use links::is_crawlable_link;
pub use phones::{is_valid_phone, normalize_phone};

use crate::storage::ContactRecord;
use crate::Result;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

/// Title used when a page has no usable `<title>`
pub const NO_TITLE: &str = "No Title";

/// Everything pulled out of one page
#[derive(Debug, Clone)]
pub struct ExtractedPage {
    pub record: ContactRecord,

    /// Crawlable outbound links, absolute, in document order
    pub links: Vec<String>,
}

/// Holds the compiled patterns; build once and share across workers
#[derive(Debug, Clone)]
pub struct ContactExtractor {
    phone_pattern: Regex,
    email_pattern: Regex,
}

impl ContactExtractor {
    /// Compiles the phone and email patterns
    pub fn new() -> Result<Self> {
        Ok(Self {
            phone_pattern: Regex::new(phones::PHONE_PATTERN)?,
            email_pattern: Regex::new(emails::EMAIL_PATTERN)?,
        })
    }

    /// Extracts the contact record for `url` from its HTML
    ///
    /// Never fails: missing signals give empty sets and the [`NO_TITLE`] title.
    pub fn extract(&self, url: &str, html: &str) -> ContactRecord {
        self.extract_page(url, html, false).record
    }

    /// Extracts the record and, when `with_links` is set, the outbound links
    ///
    /// # Arguments
    ///
    /// * `url` - The page URL, used as record key and as base for relative links
    /// * `html` - The page body
    /// * `with_links` - Whether to collect outbound links at all
    pub fn extract_page(&self, url: &str, html: &str, with_links: bool) -> ExtractedPage {
        let document = Html::parse_document(html);
        let text = visible_text(&document);

        let mut record = ContactRecord::new(url);
        record.title = Some(extract_title(&document));
        record.phones = phones::extract_phones(&self.phone_pattern, &text);
        record.emails = emails::extract_emails(&self.email_pattern, &text, &document);
        record.addresses = addresses::extract_address(&text).into_iter().collect();

        let links = if with_links {
            match Url::parse(url) {
                Ok(base_url) => links::extract_links(&document, &base_url),
                Err(e) => {
                    tracing::debug!("Not following links of {}: {}", url, e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        ExtractedPage { record, links }
    }
}

/// Page text with markup stripped, text nodes separated by single spaces
fn visible_text(document: &Html) -> String {
    document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_title(document: &Html) -> String {
    Selector::parse("title")
        .ok()
        .and_then(|selector| {
            document
                .select(&selector)
                .next()
                .map(|element| element.text().collect::<String>().trim().to_string())
        })
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| NO_TITLE.to_string())
}
