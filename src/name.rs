//! Display-name resolution for data rows.
//!
//! The contacts provider does not expose a clean display name on every row, so the
//! name is recovered from the collation columns. On Chinese-locale devices the sort
//! key interleaves ideographs and their pinyin (`张 Zhang 三 San`); [`SortKeyDecoder`]
//! undoes that interleaving. Other locales can plug in their own [`NameDecoder`].

use crate::config::{DISPLAY_NAME_ALT_SUFFIX, SORT_KEY_MARKER, UNKNOWN_NAME};
use crate::models::RawRow;
use once_cell::sync::Lazy;
use regex::Regex;

static HAN_IDEOGRAPH: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\x{4E00}-\x{9FFF}]").unwrap());

/// Turns the raw value of a name column into a display name.
pub trait NameDecoder {
    fn decode(&self, raw: &str) -> String;
}

/// Decoder for interleaved `ideograph pinyin ideograph pinyin ...` sort keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct SortKeyDecoder;

impl NameDecoder for SortKeyDecoder {
    fn decode(&self, raw: &str) -> String {
        if is_cjk(raw) {
            decode_interleaved(raw)
        } else {
            raw.to_string()
        }
    }
}

/// True if any whitespace-separated token holds a CJK unified ideograph.
pub fn is_cjk(value: &str) -> bool {
    value.split_whitespace().any(|t| HAN_IDEOGRAPH.is_match(t))
}

/// Keeps the tokens at odd positions. Two survivors are space-joined, any other
/// count is concatenated.
pub fn decode_interleaved(value: &str) -> String {
    let picked: Vec<&str> = value.split_whitespace().skip(1).step_by(2).collect();
    if picked.len() == 2 {
        picked.join(" ")
    } else {
        picked.concat()
    }
}

/// Resolves a row's display name with the default sort-key decoder.
pub fn resolve_name(row: &RawRow) -> String {
    resolve_name_with(row, &SortKeyDecoder)
}

/// Picks the name column (`*sort_key*`, then `*display_name_alt`) and decodes it.
///
/// Returns an empty string when the row has no name column with a value. A value
/// that decodes to nothing resolves to [`UNKNOWN_NAME`].
pub fn resolve_name_with(row: &RawRow, decoder: &dyn NameDecoder) -> String {
    let Some(raw) = name_source(row) else {
        return String::new();
    };
    let decoded = decoder.decode(raw);
    if decoded.trim().is_empty() {
        UNKNOWN_NAME.to_string()
    } else {
        decoded
    }
}

fn name_source(row: &RawRow) -> Option<&str> {
    column_value(row.find_column(|k| k.contains(SORT_KEY_MARKER))).or_else(|| {
        column_value(row.find_column(|k| k.ends_with(DISPLAY_NAME_ALT_SUFFIX)))
    })
}

fn column_value<'a>(column: Option<(&'a str, &'a str)>) -> Option<&'a str> {
    column.map(|(_, v)| v).filter(|v| !v.is_empty())
}
