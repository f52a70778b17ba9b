//! Turning raw column identifiers into chart labels.

use std::collections::HashSet;

/// Marker word; it and everything before it is dropped from a title.
const ROLLING: &str = "rolling";

/// Format a column identifier as a human-readable title
///
/// The identifier is split on `_`. If one of the words is `rolling` (any case),
/// only the words after its first occurrence are kept. Remaining words are
/// deduplicated case-insensitively, all-caps words are kept as-is and every
/// other word is capitalized. The words are joined with a single space.
///
/// # Arguments
/// * `identifier` - Raw column name, e.g. a CSV header
///
/// # Returns
/// * `String` - Display title; empty if no word survives
///
/// # Examples
/// ```
/// use sheetdash::title::format_title;
///
/// assert_eq!(format_title("30_day_rolling_avg_price"), "Avg Price");
/// assert_eq!(format_title("USD_rolling_usd_rate"), "Usd Rate");
/// assert_eq!(format_title("x_rolling_USD_rate"), "USD Rate");
/// assert_eq!(format_title("rolling"), "");
/// ```
pub fn format_title(identifier: &str) -> String {
    let words: Vec<&str> = identifier.split('_').collect();

    let start = words
        .iter()
        .position(|word| word.to_lowercase() == ROLLING)
        .map_or(0, |index| index + 1);

    let mut seen = HashSet::new();
    let mut clean_words = Vec::new();

    for word in &words[start..] {
        let lower = word.to_lowercase();
        if word.trim().is_empty() || lower == ROLLING || !seen.insert(lower) {
            continue;
        }

        if is_all_caps(word) {
            clean_words.push((*word).to_string());
        } else {
            clean_words.push(capitalize(word));
        }
    }

    clean_words.join(" ")
}

/// True when the word has at least one cased character and none of them are lowercase.
fn is_all_caps(word: &str) -> bool {
    let mut has_cased = false;
    for c in word.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            has_cased = true;
        }
    }
    has_cased
}

/// Upper-case the first character and lower-case the rest.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
