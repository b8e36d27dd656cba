//! Outbound link discovery

use scraper::{Html, Selector};
use url::Url;

/// File extensions that are never worth fetching as pages
const DENIED_EXTENSIONS: &[&str] = &[
    ".pdf", ".doc", ".docx", ".jpg", ".png", ".gif", ".zip", ".rar",
];

const MAX_LINK_LEN: usize = 500;

/// Collects every crawlable `<a href>` target, resolved against `base_url`
///
/// Links are returned in document order; duplicates are left for the dedup
/// registry to collapse.
pub(crate) fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    if is_crawlable_link(&absolute_url) {
                        links.push(absolute_url);
                    }
                }
            }
        }
    }

    links
}

/// Resolves an href to an absolute http(s) URL
///
/// Returns None for empty hrefs, non-page schemes (`javascript:`, `mailto:`,
/// `tel:`, `data:`), same-page anchors and anything that does not parse.
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url.to_string()),
        _ => None,
    }
}

/// Link validity predicate applied after resolution
///
/// A crawlable link uses http(s), carries no fragment, does not point at a
/// document, image or archive, and is shorter than 500 characters.
pub fn is_crawlable_link(link: &str) -> bool {
    if !(link.starts_with("http://") || link.starts_with("https://")) {
        return false;
    }
    if link.contains('#') || link.len() >= MAX_LINK_LEN {
        return false;
    }

    let lowered = link.to_ascii_lowercase();
    !DENIED_EXTENSIONS.iter().any(|ext| lowered.ends_with(ext))
}
