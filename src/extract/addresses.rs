//! Keyword-driven postal address snippets

/// Indicator keywords, checked in order; the first one found wins
const ADDRESS_KEYWORDS: &[&str] = &[
    "ул.", "улица", "проспект", "пр.", "дом", "д.", "г.", "город", "address", "адрес",
];

const LEAD_CHARS: usize = 50;
const TRAIL_CHARS: usize = 150;
const MAX_SNIPPET_CHARS: usize = 200;

/// Cuts a single address snippet out of markup-free text
///
/// Keywords are tried in priority order and only the first hit is used. The
/// snippet spans up to 50 characters before the hit and 150 after it, with
/// whitespace runs collapsed. Offsets count characters, not bytes.
pub(crate) fn extract_address(text: &str) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let lowered: Vec<char> = chars
        .iter()
        .map(|c| c.to_lowercase().next().unwrap_or(*c))
        .collect();

    ADDRESS_KEYWORDS.iter().find_map(|keyword| {
        let needle: Vec<char> = keyword.chars().collect();
        let index = find_chars(&lowered, &needle)?;

        let start = index.saturating_sub(LEAD_CHARS);
        let end = (index + TRAIL_CHARS).min(chars.len());
        let window: String = chars[start..end].iter().collect();

        let snippet = window.split_whitespace().collect::<Vec<_>>().join(" ");
        if snippet.is_empty() {
            return None;
        }
        Some(truncate_snippet(snippet))
    })
}

fn find_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn truncate_snippet(snippet: String) -> String {
    if snippet.chars().count() > MAX_SNIPPET_CHARS {
        let mut cut: String = snippet.chars().take(MAX_SNIPPET_CHARS).collect();
        cut.push_str("...");
        cut
    } else {
        snippet
    }
}
