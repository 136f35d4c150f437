//! Tokenizer for the text printed by `content query`.
//!
//! Each row arrives as one line:
//!
//! ```text
//! Row: 0 _id=1, mimetype=vnd.android.cursor.item/note, data1=call back, maybe
//! ```
//!
//! Pairs are separated by `", "`, but values may contain that separator and even
//! `=`, so splitting is followed by a repair pass that glues stray tokens back
//! onto the value they belong to.

use crate::config::{FIELD_SEPARATOR, NULL_LITERAL, ROW_MARKER};
use crate::models::RawRow;
use crate::observer::ScanObserver;
use std::str::Lines;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("line does not start with the row marker")]
    MissingMarker,

    #[error("row has no columns")]
    Empty,

    #[error("row has no key=value pair")]
    NoPairs,
}

/// Iterates the rows of a dump, reporting every other line to the observer.
pub struct DumpRows<'a> {
    lines: Lines<'a>,
    observer: &'a dyn ScanObserver,
}

impl<'a> DumpRows<'a> {
    pub fn new(text: &'a str, observer: &'a dyn ScanObserver) -> Self {
        Self {
            lines: text.lines(),
            observer,
        }
    }
}

impl Iterator for DumpRows<'_> {
    type Item = RawRow;

    fn next(&mut self) -> Option<RawRow> {
        for line in self.lines.by_ref() {
            if !is_row_line(line) {
                if !line.trim().is_empty() {
                    self.observer.line_ignored(line);
                }
                continue;
            }
            match parse_row(line) {
                Ok(row) => {
                    self.observer.row_parsed();
                    return Some(row);
                }
                Err(e) => self.observer.row_malformed(line, &e),
            }
        }
        None
    }
}

/// Parses every `Row:` line of `text`. Blank input yields no rows.
pub fn parse_dump(text: &str, observer: &dyn ScanObserver) -> Vec<RawRow> {
    DumpRows::new(text, observer).collect()
}

pub fn is_row_line(line: &str) -> bool {
    line.trim_start().starts_with(ROW_MARKER)
}

/// Decomposes a single `Row:` line into its columns.
pub fn parse_row(line: &str) -> Result<RawRow, RowError> {
    let body = line
        .trim_start()
        .strip_prefix(ROW_MARKER)
        .ok_or(RowError::MissingMarker)?;
    let body = strip_index(body.trim());
    if body.is_empty() {
        return Err(RowError::Empty);
    }

    let tokens: Vec<&str> = body.split(FIELD_SEPARATOR).collect();
    let mut row = RawRow::new();
    let mut last_key: Option<String> = None;
    let mut i = 0;

    while i < tokens.len() {
        let token = tokens[i];
        i += 1;

        let key = match token.split_once('=') {
            Some((k, _)) if !k.trim().is_empty() => k.trim(),
            // A pair with no key has nowhere to go, and neither does what follows it.
            Some(_) => {
                last_key = None;
                continue;
            }
            None => {
                append_continuation(&mut row, last_key.as_deref(), token);
                continue;
            }
        };

        if token.matches('=').count() == 1 {
            let (_, value) = token.split_once('=').unwrap_or_default();
            row.insert(key, canonical_value(value));
        } else {
            // The value holds a literal '='; absorb tokens until a real pair shows up.
            let (_, first) = token.split_once('=').unwrap_or_default();
            let mut value = first.to_string();
            while i < tokens.len() && !looks_like_pair(tokens[i]) {
                value.push_str(FIELD_SEPARATOR);
                value.push_str(tokens[i]);
                i += 1;
            }
            row.insert(key, canonical_value(&value));
        }
        last_key = Some(key.to_string());
    }

    if row.is_empty() {
        return Err(RowError::NoPairs);
    }
    Ok(row)
}

/// Drops the numeric row index that follows the marker.
fn strip_index(body: &str) -> &str {
    match body.split_once(char::is_whitespace) {
        Some((first, rest)) if first.parse::<u64>().is_ok() => rest.trim_start(),
        None if body.parse::<u64>().is_ok() => "",
        _ => body,
    }
}

/// True when `token` reads as a fresh `key=value` with content on both sides.
fn looks_like_pair(token: &str) -> bool {
    match token.split_once('=') {
        Some((k, v)) => !k.trim().is_empty() && !v.trim().is_empty(),
        None => false,
    }
}

/// A token without `=` belongs to the previous value, which was cut at a `", "`.
fn append_continuation(row: &mut RawRow, last_key: Option<&str>, token: &str) {
    let Some(value) = last_key.and_then(|k| row.get_mut(k)) else {
        return;
    };
    let token = token.trim_end();
    if value.is_empty() {
        value.push_str(token.trim_start());
    } else {
        value.push_str(FIELD_SEPARATOR);
        value.push_str(token);
    }
}

fn canonical_value(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == NULL_LITERAL {
        String::new()
    } else {
        trimmed.to_string()
    }
}
