//! Parser for `key: value` pairs embedded in an item's notes.
//!
//! Operators keep extra settings in the free-text notes of an item, one pair
//! per line, in either list style or bare style:
//!
//! ```text
//! - api_key: secret123
//! region: us-east-1
//! # comments are skipped
//! ```
//!
//! A line that starts with `"- "` is always treated as a pair if it has a
//! colon, so `"- # key: value"` yields the key `"# key"`. Comment detection
//! only applies to bare lines.

use crate::FieldMap;

/// Parses notes text into a [`FieldMap`].
///
/// Lines are trimmed before matching. Each pair splits on the first colon,
/// so values may themselves contain colons. Lines without a colon, blank
/// lines and bare `#` comments are ignored. A later line wins over an
/// earlier one with the same key.
///
/// # Example
///
/// ```
/// use credmux::notes::parse_notes;
///
/// let fields = parse_notes("- api_key: secret123\n- region: us-east-1");
/// assert_eq!(fields.get("api_key").map(String::as_str), Some("secret123"));
/// assert_eq!(fields.get("region").map(String::as_str), Some("us-east-1"));
/// ```
pub fn parse_notes(text: &str) -> FieldMap {
    let mut fields = FieldMap::new();

    for line in text.lines().map(str::trim) {
        let pair = match line.strip_prefix("- ") {
            Some(rest) if line.contains(':') => rest,
            _ if !line.starts_with('#') => line,
            _ => continue,
        };

        if let Some((key, value)) = pair.split_once(':') {
            fields.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    fields
}
