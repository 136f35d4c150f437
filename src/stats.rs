use crate::models::RowKind;
use crate::observer::{ScanObserver, SkipReason};
use crate::parser::RowError;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters collected during a scan
#[derive(Default)]
pub struct ScanStats {
    pub lines_ignored: AtomicU64,
    pub rows_parsed: AtomicU64,
    pub rows_malformed: AtomicU64,
    pub rows_without_value: AtomicU64,
    pub rows_without_name: AtomicU64,
    pub groups_incomplete: AtomicU64,
    pub messages_unreadable: AtomicU64,
    pub phone_rows: AtomicU64,
    pub email_rows: AtomicU64,
    pub group_rows: AtomicU64,
    pub note_rows: AtomicU64,
    pub other_rows: AtomicU64,
    pub contacts_created: AtomicU64,
}

impl ScanStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignored(&self) -> u64 {
        self.lines_ignored.load(Ordering::Relaxed)
    }

    pub fn parsed(&self) -> u64 {
        self.rows_parsed.load(Ordering::Relaxed)
    }

    pub fn malformed(&self) -> u64 {
        self.rows_malformed.load(Ordering::Relaxed)
    }

    pub fn without_value(&self) -> u64 {
        self.rows_without_value.load(Ordering::Relaxed)
    }

    pub fn without_name(&self) -> u64 {
        self.rows_without_name.load(Ordering::Relaxed)
    }

    pub fn incomplete_groups(&self) -> u64 {
        self.groups_incomplete.load(Ordering::Relaxed)
    }

    pub fn bad_numbers(&self) -> u64 {
        self.messages_unreadable.load(Ordering::Relaxed)
    }

    /// Rows dropped for any reason, malformed lines included
    pub fn skipped(&self) -> u64 {
        self.malformed()
            + self.without_value()
            + self.without_name()
            + self.incomplete_groups()
            + self.bad_numbers()
    }

    pub fn phones(&self) -> u64 {
        self.phone_rows.load(Ordering::Relaxed)
    }

    pub fn emails(&self) -> u64 {
        self.email_rows.load(Ordering::Relaxed)
    }

    pub fn groups(&self) -> u64 {
        self.group_rows.load(Ordering::Relaxed)
    }

    pub fn notes(&self) -> u64 {
        self.note_rows.load(Ordering::Relaxed)
    }

    pub fn others(&self) -> u64 {
        self.other_rows.load(Ordering::Relaxed)
    }

    pub fn contacts(&self) -> u64 {
        self.contacts_created.load(Ordering::Relaxed)
    }
}

impl ScanObserver for ScanStats {
    fn line_ignored(&self, _line: &str) {
        self.lines_ignored.fetch_add(1, Ordering::Relaxed);
    }

    fn row_malformed(&self, _line: &str, _error: &RowError) {
        self.rows_malformed.fetch_add(1, Ordering::Relaxed);
    }

    fn row_parsed(&self) {
        self.rows_parsed.fetch_add(1, Ordering::Relaxed);
    }

    fn row_skipped(&self, reason: SkipReason) {
        let counter = match reason {
            SkipReason::NoValue => &self.rows_without_value,
            SkipReason::NoName => &self.rows_without_name,
            SkipReason::IncompleteGroup => &self.groups_incomplete,
            SkipReason::BadNumber => &self.messages_unreadable,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn row_merged(&self, kind: RowKind) {
        let counter = match kind {
            RowKind::Phone => &self.phone_rows,
            RowKind::Email => &self.email_rows,
            RowKind::GroupMembership => &self.group_rows,
            RowKind::Note => &self.note_rows,
            RowKind::Other => &self.other_rows,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn contact_created(&self, _name: &str) {
        self.contacts_created.fetch_add(1, Ordering::Relaxed);
    }
}
