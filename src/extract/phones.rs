//! Phone number matching and normalization

use regex::Regex;
use std::collections::BTreeSet;

/// Country-code or trunk prefix followed by ten or eleven digits, with
/// spaces, dashes and parentheses allowed anywhere between them
pub(crate) const PHONE_PATTERN: &str = r"(\+7|8|7)[\s\-()]*(\d[\s\-()]*){9,10}";

/// Finds every phone number in `text` and returns the valid ones in canonical form
pub(crate) fn extract_phones(pattern: &Regex, text: &str) -> BTreeSet<String> {
    pattern
        .find_iter(text)
        .map(|m| normalize_phone(m.as_str()))
        .filter(|phone| is_valid_phone(phone))
        .collect()
}

/// Normalizes a raw phone match to `+7XXXXXXXXXX` where possible
///
/// Everything except digits and `+` is stripped first. A leading `8` or `7`
/// on an eleven digit number is rewritten to the `+7` prefix. Anything else
/// is returned stripped but otherwise untouched, so [`is_valid_phone`] can
/// reject it.
///
/// # Example
///
/// ```
/// use contact_crawler::extract::normalize_phone;
///
/// assert_eq!(normalize_phone("8-900-123-45-67"), "+79001234567");
/// assert_eq!(normalize_phone("+7 (999) 123-45-67"), "+79991234567");
/// ```
pub fn normalize_phone(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();

    if cleaned.len() == 11 {
        if let Some(rest) = cleaned.strip_prefix('8') {
            return format!("+7{}", rest);
        }
        if cleaned.starts_with('7') {
            return format!("+{}", cleaned);
        }
    }

    cleaned
}

/// Accepts the international `+7` form (12 chars) or the domestic `8` form (11 chars)
pub fn is_valid_phone(phone: &str) -> bool {
    (phone.starts_with("+7") && phone.len() == 12) || (phone.starts_with('8') && phone.len() == 11)
}
