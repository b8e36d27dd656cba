//! Email address matching

use regex::Regex;
use scraper::{Html, Selector};
use std::collections::BTreeSet;

pub(crate) const EMAIL_PATTERN: &str = r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b";

/// Collects lowercase emails from visible text plus every `mailto:` anchor
pub(crate) fn extract_emails(pattern: &Regex, text: &str, document: &Html) -> BTreeSet<String> {
    let mut emails: BTreeSet<String> = pattern
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect();

    if let Ok(mailto_selector) = Selector::parse(r#"a[href^="mailto:"]"#) {
        for element in document.select(&mailto_selector) {
            if let Some(email) = element.value().attr("href").and_then(mailto_address) {
                emails.insert(email);
            }
        }
    }

    emails
}

/// Address part of a `mailto:` href, without query parameters
fn mailto_address(href: &str) -> Option<String> {
    let address = href.trim().strip_prefix("mailto:")?;
    let address = address.split('?').next().unwrap_or_default().trim();

    if address.is_empty() {
        None
    } else {
        Some(address.to_lowercase())
    }
}
