use crate::config::{ID_COLUMN, TITLE_COLUMN};
use crate::models::RawRow;
use crate::observer::{ScanObserver, SkipReason};
use rustc_hash::FxHashMap;

/// Group row id to group title, built from one scan of the groups table.
#[derive(Debug, Default, Clone)]
pub struct GroupIndex {
    labels: FxHashMap<String, String>,
}

impl GroupIndex {
    /// Rows missing either the id or the title are skipped.
    pub fn build(rows: &[RawRow], observer: &dyn ScanObserver) -> Self {
        let mut labels = FxHashMap::default();

        for row in rows {
            let id = row.get_or_empty(ID_COLUMN);
            let title = row.get_or_empty(TITLE_COLUMN);
            if id.is_empty() || title.is_empty() {
                observer.row_skipped(SkipReason::IncompleteGroup);
                continue;
            }
            labels.insert(id.to_string(), title.to_string());
        }

        observer.groups_indexed(labels.len());
        Self { labels }
    }

    /// Label for a group id; unknown ids read as empty.
    pub fn label(&self, id: &str) -> &str {
        self.labels.get(id).map(String::as_str).unwrap_or("")
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.values().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NoopObserver;
    use crate::stats::ScanStats;

    fn group_row(id: &str, title: &str) -> RawRow {
        [(ID_COLUMN, id), (TITLE_COLUMN, title)].into_iter().collect()
    }

    #[test]
    fn resolves_known_ids() {
        let index = GroupIndex::build(
            &[group_row("1", "Friends"), group_row("2", "Work")],
            &NoopObserver,
        );
        assert_eq!(index.label("1"), "Friends");
        assert_eq!(index.label("2"), "Work");
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn unknown_id_is_empty() {
        let index = GroupIndex::build(&[group_row("1", "Friends")], &NoopObserver);
        assert_eq!(index.label("9"), "");
        assert_eq!(index.label(""), "");
    }

    #[test]
    fn skips_incomplete_rows() {
        let no_title: RawRow = [(ID_COLUMN, "3")].into_iter().collect();
        let stats = ScanStats::new();
        let index = GroupIndex::build(
            &[
                group_row("1", "Friends"),
                group_row("2", ""),
                group_row("", "Orphan"),
                no_title,
            ],
            &stats,
        );
        assert_eq!(index.len(), 1);
        assert_eq!(stats.incomplete_groups(), 3);
        assert_eq!(index.label("2"), "");
        assert_eq!(index.label("3"), "");
    }

    #[test]
    fn later_row_wins_for_duplicate_id() {
        let index = GroupIndex::build(
            &[group_row("1", "Old"), group_row("1", "New")],
            &NoopObserver,
        );
        assert_eq!(index.label("1"), "New");
    }

    #[test]
    fn empty_scan() {
        let index = GroupIndex::build(&[], &NoopObserver);
        assert!(index.is_empty());
        assert_eq!(index.label("1"), "");
    }

    #[test]
    fn case_sensitive_keys() {
        let index = GroupIndex::build(&[group_row("a1", "Family")], &NoopObserver);
        assert_eq!(index.label("a1"), "Family");
        assert_eq!(index.label("A1"), "");
    }
}
