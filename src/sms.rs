use crate::models::RawRow;
use crate::observer::{ScanObserver, SkipReason};
use crate::parser::DumpRows;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::num::ParseIntError;

/// One row of the short-message store. `date` is milliseconds since the epoch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SmsMessage {
    pub address: String,
    pub body: String,
    pub date: i64,
    #[serde(rename = "type")]
    pub kind: i32,
}

/// Serialized form: the message plus a readable timestamp.
#[derive(Serialize)]
struct SmsRecord<'a> {
    address: &'a str,
    body: &'a str,
    date: i64,
    #[serde(rename = "type")]
    kind: i32,
    datetime: String,
}

impl Serialize for SmsMessage {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SmsRecord {
            address: &self.address,
            body: &self.body,
            date: self.date,
            kind: self.kind,
            datetime: self.datetime(),
        }
        .serialize(serializer)
    }
}

impl SmsMessage {
    /// Missing `date` reads as 0 and missing `type` as 1 (inbox).
    pub fn from_row(row: &RawRow) -> Result<Self, ParseIntError> {
        let date = non_empty_or(row.get_or_empty("date"), "0").parse()?;
        let kind = non_empty_or(row.get_or_empty("type"), "1").parse()?;
        Ok(Self {
            address: row.get_or_empty("address").to_string(),
            body: row.get_or_empty("body").to_string(),
            date,
            kind,
        })
    }

    /// RFC 3339 rendering of `date` in UTC, empty if out of range.
    pub fn datetime(&self) -> String {
        DateTime::<Utc>::from_timestamp_millis(self.date)
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default()
    }
}

fn non_empty_or<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value
    }
}

/// Reads messages from a `content://sms` dump; rows with bad numbers are dropped.
pub fn read_messages(text: &str, observer: &dyn ScanObserver) -> Vec<SmsMessage> {
    let mut messages = Vec::new();
    for row in DumpRows::new(text, observer) {
        match SmsMessage::from_row(&row) {
            Ok(message) => messages.push(message),
            Err(_) => observer.row_skipped(SkipReason::BadNumber),
        }
    }
    messages
}

/// Messages grouped by address, each thread oldest first.
pub fn conversations(messages: &[SmsMessage]) -> BTreeMap<String, Vec<SmsMessage>> {
    let mut threads: BTreeMap<String, Vec<SmsMessage>> = BTreeMap::new();
    for message in messages {
        threads
            .entry(message.address.clone())
            .or_default()
            .push(message.clone());
    }
    for thread in threads.values_mut() {
        thread.sort_by_key(|m| m.date);
    }
    threads
}

/// Case-insensitive match against body or address.
pub fn search_sms<'a>(messages: &'a [SmsMessage], keyword: &str) -> Vec<&'a SmsMessage> {
    let keyword = keyword.to_lowercase();
    messages
        .iter()
        .filter(|m| {
            m.body.to_lowercase().contains(&keyword) || m.address.to_lowercase().contains(&keyword)
        })
        .collect()
}

/// Messages with `start_ms <= date <= end_ms`.
pub fn sms_in_range(messages: &[SmsMessage], start_ms: i64, end_ms: i64) -> Vec<&SmsMessage> {
    messages
        .iter()
        .filter(|m| (start_ms..=end_ms).contains(&m.date))
        .collect()
}
