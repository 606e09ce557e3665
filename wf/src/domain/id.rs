//! Identifier helpers
//!
//! Session ids are UUIDv7 strings. Record ids are derived from a record's
//! dedup key so the same logical record always gets the same id.

use chrono::Utc;

use super::Category;

/// Current time as Unix milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Generate a fresh session id
pub fn generate_session_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// Build a record id from its category and dedup key parts
///
/// Format: `{category}:{part}:{part}...` where each part is slugified.
/// Example: `activities:serpapi:tokyo-national-museum`
pub fn record_id(category: Category, parts: &[&str]) -> String {
    let mut id = category.as_str().to_string();
    for part in parts.iter().filter(|p| !p.is_empty()) {
        id.push(':');
        id.push_str(&slugify(part));
    }
    id
}

/// Slugify text for use in ids
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        // Strip apostrophes entirely, replace other non-alphanumeric with hyphens
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c == '\'' || c == '\u{2019}' || c == '\u{2018}' {
                None
            } else {
                Some('-')
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
