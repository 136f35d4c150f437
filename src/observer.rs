use crate::models::RowKind;
use crate::parser::RowError;
use tracing::{debug, info, trace};

/// Why a parsed row was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Primary value column missing or empty
    NoValue,
    /// No name-bearing column with a value
    NoName,
    /// Group row without an id or a title
    IncompleteGroup,
    /// Message row whose `date` or `type` is not an integer
    BadNumber,
}

/// Diagnostics side-channel for a scan.
///
/// The parsing core reports here instead of logging globally, so callers decide
/// whether events become log lines, counters, or nothing.
pub trait ScanObserver {
    /// A line that is not a `Row:` line.
    fn line_ignored(&self, _line: &str) {}

    fn row_malformed(&self, _line: &str, _error: &RowError) {}

    fn row_parsed(&self) {}

    fn row_skipped(&self, _reason: SkipReason) {}

    fn row_merged(&self, _kind: RowKind) {}

    fn contact_created(&self, _name: &str) {}

    fn groups_indexed(&self, _groups: usize) {}

    /// One aggregation pass finished.
    fn rows_aggregated(&self, _rows: usize, _contacts: usize) {}
}

/// Discards every event.
pub struct NoopObserver;

impl ScanObserver for NoopObserver {}

/// Forwards events to `tracing` at TRACE/DEBUG.
pub struct TracingObserver;

impl ScanObserver for TracingObserver {
    fn line_ignored(&self, line: &str) {
        trace!(line, "Ignoring non-row line");
    }

    fn row_malformed(&self, line: &str, error: &RowError) {
        debug!(line, error = %error, "Skipping malformed row");
    }

    fn row_skipped(&self, reason: SkipReason) {
        debug!(?reason, "Skipping row");
    }

    fn contact_created(&self, name: &str) {
        trace!(name, "New contact");
    }

    fn groups_indexed(&self, groups: usize) {
        info!(groups, "Group index built");
    }

    fn rows_aggregated(&self, rows: usize, contacts: usize) {
        info!(rows, contacts, "Contact aggregation complete");
    }
}

/// Sends every event to two observers.
pub struct Tee<'a, A: ?Sized, B: ?Sized> {
    pub first: &'a A,
    pub second: &'a B,
}

impl<A, B> ScanObserver for Tee<'_, A, B>
where
    A: ScanObserver + ?Sized,
    B: ScanObserver + ?Sized,
{
    fn line_ignored(&self, line: &str) {
        self.first.line_ignored(line);
        self.second.line_ignored(line);
    }

    fn row_malformed(&self, line: &str, error: &RowError) {
        self.first.row_malformed(line, error);
        self.second.row_malformed(line, error);
    }

    fn row_parsed(&self) {
        self.first.row_parsed();
        self.second.row_parsed();
    }

    fn row_skipped(&self, reason: SkipReason) {
        self.first.row_skipped(reason);
        self.second.row_skipped(reason);
    }

    fn row_merged(&self, kind: RowKind) {
        self.first.row_merged(kind);
        self.second.row_merged(kind);
    }

    fn contact_created(&self, name: &str) {
        self.first.contact_created(name);
        self.second.contact_created(name);
    }

    fn groups_indexed(&self, groups: usize) {
        self.first.groups_indexed(groups);
        self.second.groups_indexed(groups);
    }

    fn rows_aggregated(&self, rows: usize, contacts: usize) {
        self.first.rows_aggregated(rows, contacts);
        self.second.rows_aggregated(rows, contacts);
    }
}
