use crate::config::{DATA_COLUMN, MIMETYPE_COLUMN};
use crate::index::GroupIndex;
use crate::models::{Contact, RawRow, RowKind};
use crate::name::{resolve_name_with, NameDecoder, SortKeyDecoder};
use crate::normalize::normalize_phone;
use crate::observer::{ScanObserver, SkipReason};
use rustc_hash::FxHashMap;

/// Folds rows of the unified data table into contacts keyed by display name.
///
/// Two rows belong to the same contact exactly when their resolved names are equal.
/// Contacts come out in the order their names were first seen.
pub struct ContactAggregator<'a> {
    groups: &'a GroupIndex,
    decoder: &'a dyn NameDecoder,
    observer: &'a dyn ScanObserver,
    contacts: Vec<Contact>,
    by_name: FxHashMap<String, usize>,
}

impl<'a> ContactAggregator<'a> {
    pub fn new(groups: &'a GroupIndex, observer: &'a dyn ScanObserver) -> Self {
        Self {
            groups,
            decoder: &SortKeyDecoder,
            observer,
            contacts: Vec::new(),
            by_name: FxHashMap::default(),
        }
    }

    pub fn with_decoder(mut self, decoder: &'a dyn NameDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn fold(&mut self, row: &RawRow) {
        let value = row.get_or_empty(DATA_COLUMN);
        if value.is_empty() {
            self.observer.row_skipped(SkipReason::NoValue);
            return;
        }

        let name = resolve_name_with(row, self.decoder);
        if name.is_empty() {
            self.observer.row_skipped(SkipReason::NoName);
            return;
        }

        let kind = RowKind::from_mimetype(row.get_or_empty(MIMETYPE_COLUMN));
        let groups = self.groups;
        let contact = self.contact_mut(name);

        match kind {
            RowKind::Phone => {
                contact.add_phone(normalize_phone(value));
            }
            RowKind::Email => {
                contact.add_email(value.to_string());
            }
            RowKind::GroupMembership => {
                contact.add_group(groups.label(value));
            }
            RowKind::Note => contact.add_note(value),
            RowKind::Other => {}
        }
        self.observer.row_merged(kind);
    }

    pub fn fold_all<'r, I>(&mut self, rows: I)
    where
        I: IntoIterator<Item = &'r RawRow>,
    {
        for row in rows {
            self.fold(row);
        }
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn finish(self) -> Vec<Contact> {
        self.contacts
    }

    fn contact_mut(&mut self, name: String) -> &mut Contact {
        let idx = match self.by_name.get(&name) {
            Some(&idx) => idx,
            None => {
                self.observer.contact_created(&name);
                let idx = self.contacts.len();
                self.contacts.push(Contact::new(name.clone()));
                self.by_name.insert(name, idx);
                idx
            }
        };
        &mut self.contacts[idx]
    }
}

/// One aggregation pass over `rows` with fresh state.
pub fn aggregate_contacts(
    rows: &[RawRow],
    groups: &GroupIndex,
    observer: &dyn ScanObserver,
) -> Vec<Contact> {
    let mut aggregator = ContactAggregator::new(groups, observer);
    aggregator.fold_all(rows);
    aggregator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        EMAIL_MIMETYPE, GROUP_MEMBERSHIP_MIMETYPE, ID_COLUMN, NOTE_MIMETYPE, PHONE_MIMETYPE,
        TITLE_COLUMN, UNKNOWN_NAME,
    };
    use crate::observer::NoopObserver;
    use crate::stats::ScanStats;
    use std::collections::BTreeSet;

    fn data_row(name: &str, mimetype: &str, value: &str) -> RawRow {
        [
            ("sort_key", name),
            (MIMETYPE_COLUMN, mimetype),
            (DATA_COLUMN, value),
        ]
        .into_iter()
        .collect()
    }

    fn make_index(groups: &[(&str, &str)]) -> GroupIndex {
        let rows: Vec<RawRow> = groups
            .iter()
            .map(|&(id, title)| [(ID_COLUMN, id), (TITLE_COLUMN, title)].into_iter().collect())
            .collect();
        GroupIndex::build(&rows, &NoopObserver)
    }

    fn groups() -> GroupIndex {
        make_index(&[("1", "Friends"), ("2", "Work"), ("3", "Friends Old")])
    }

    fn sample_rows() -> Vec<RawRow> {
        vec![
            data_row("Ann Lee", PHONE_MIMETYPE, "555-1234"),
            data_row("Bob Ray", EMAIL_MIMETYPE, "bob@example.com"),
            data_row("Ann Lee", PHONE_MIMETYPE, "5551234"),
            data_row("Ann Lee", EMAIL_MIMETYPE, "ann@example.com"),
            data_row("Ann Lee", GROUP_MEMBERSHIP_MIMETYPE, "1"),
            data_row("Ann Lee", GROUP_MEMBERSHIP_MIMETYPE, "3"),
            data_row("Bob Ray", GROUP_MEMBERSHIP_MIMETYPE, "2"),
            data_row("Ann Lee", GROUP_MEMBERSHIP_MIMETYPE, "1"),
            data_row("Bob Ray", NOTE_MIMETYPE, "met at conf"),
            data_row("Bob Ray", NOTE_MIMETYPE, "likes tea"),
            data_row("Bob Ray", PHONE_MIMETYPE, "+1 (555) 123-4567"),
        ]
    }

    /// Contact reduced to order-free content.
    type Shape = (
        String,
        BTreeSet<String>,
        BTreeSet<String>,
        BTreeSet<String>,
        BTreeSet<String>,
    );

    fn shape(contacts: &[Contact]) -> BTreeSet<Shape> {
        contacts
            .iter()
            .map(|c| {
                (
                    c.name.clone(),
                    c.phones.iter().cloned().collect(),
                    c.emails.iter().cloned().collect(),
                    c.group_labels().map(String::from).collect(),
                    c.notes
                        .split(" | ")
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect(),
                )
            })
            .collect()
    }

    #[test]
    fn merges_rows_by_name() {
        let contacts = aggregate_contacts(&sample_rows(), &groups(), &NoopObserver);
        assert_eq!(contacts.len(), 2);

        let ann = &contacts[0];
        assert_eq!(ann.name, "Ann Lee");
        assert_eq!(ann.phones, vec!["5551234"]);
        assert_eq!(ann.emails, vec!["ann@example.com"]);
        assert_eq!(ann.group(), "Friends, Friends Old");
        assert_eq!(ann.notes, "");

        let bob = &contacts[1];
        assert_eq!(bob.name, "Bob Ray");
        assert_eq!(bob.phones, vec!["15551234567"]);
        assert_eq!(bob.emails, vec!["bob@example.com"]);
        assert_eq!(bob.group(), "Work");
        assert_eq!(bob.notes, "met at conf | likes tea");
    }

    #[test]
    fn phone_variants_collapse() {
        let rows = vec![
            data_row("Ann", PHONE_MIMETYPE, "555-1234"),
            data_row("Ann", PHONE_MIMETYPE, "5551234"),
        ];
        let contacts = aggregate_contacts(&rows, &GroupIndex::default(), &NoopObserver);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].phones, vec!["5551234"]);
    }

    #[test]
    fn first_seen_order() {
        let rows = vec![
            data_row("Zed", EMAIL_MIMETYPE, "z@x.org"),
            data_row("Amy", EMAIL_MIMETYPE, "a@x.org"),
            data_row("Zed", PHONE_MIMETYPE, "1"),
            data_row("Mia", PHONE_MIMETYPE, "2"),
        ];
        let contacts = aggregate_contacts(&rows, &GroupIndex::default(), &NoopObserver);
        let names: Vec<&str> = contacts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Zed", "Amy", "Mia"]);
    }

    #[test]
    fn row_order_does_not_change_content() {
        let rows = sample_rows();
        let index = groups();
        let expected = shape(&aggregate_contacts(&rows, &index, &NoopObserver));

        let mut reversed = rows.clone();
        reversed.reverse();
        assert_eq!(
            shape(&aggregate_contacts(&reversed, &index, &NoopObserver)),
            expected
        );

        for shift in 1..rows.len() {
            let mut rotated = rows.clone();
            rotated.rotate_left(shift);
            assert_eq!(
                shape(&aggregate_contacts(&rotated, &index, &NoopObserver)),
                expected,
                "rotation by {shift}"
            );
        }

        let mut interleaved: Vec<RawRow> = rows.iter().step_by(2).cloned().collect();
        interleaved.extend(rows.iter().skip(1).step_by(2).cloned());
        assert_eq!(
            shape(&aggregate_contacts(&interleaved, &index, &NoopObserver)),
            expected
        );
    }

    #[test]
    fn rows_without_value_or_name_are_skipped() {
        let no_name: RawRow = [(MIMETYPE_COLUMN, PHONE_MIMETYPE), (DATA_COLUMN, "123")]
            .into_iter()
            .collect();
        let rows = vec![
            data_row("Ann", PHONE_MIMETYPE, ""),
            no_name,
            data_row("Ann", EMAIL_MIMETYPE, "ann@x.org"),
        ];
        let stats = ScanStats::new();
        let contacts = aggregate_contacts(&rows, &GroupIndex::default(), &stats);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].phones, Vec::<String>::new());
        assert_eq!(stats.without_value(), 1);
        assert_eq!(stats.without_name(), 1);
        assert_eq!(stats.emails(), 1);
    }

    #[test]
    fn other_kinds_create_contact_without_fields() {
        let rows = vec![data_row("Ann", "vnd.android.cursor.item/name", "Ann")];
        let stats = ScanStats::new();
        let contacts = aggregate_contacts(&rows, &GroupIndex::default(), &stats);
        assert_eq!(contacts, vec![Contact::new("Ann")]);
        assert_eq!(stats.others(), 1);
        assert_eq!(stats.contacts(), 1);
    }

    #[test]
    fn group_titles_containing_separator() {
        let index = make_index(&[("1", "Family, Close"), ("2", "Family")]);
        let fold = |ids: &[&str]| -> Vec<String> {
            let rows: Vec<RawRow> = ids
                .iter()
                .map(|id| data_row("Ann", GROUP_MEMBERSHIP_MIMETYPE, id))
                .collect();
            aggregate_contacts(&rows, &index, &NoopObserver)
                .remove(0)
                .groups
        };

        assert_eq!(fold(&["1", "1"]), vec!["Family, Close"]);
        assert_eq!(fold(&["1", "2"]), vec!["Family, Close", "Family"]);
        assert_eq!(fold(&["2", "1"]), vec!["Family", "Family, Close"]);
        assert_eq!(fold(&["2", "1", "2", "1"]), vec!["Family", "Family, Close"]);
    }

    #[test]
    fn unknown_group_id_is_ignored() {
        let rows = vec![data_row("Ann", GROUP_MEMBERSHIP_MIMETYPE, "42")];
        let contacts = aggregate_contacts(&rows, &groups(), &NoopObserver);
        assert!(contacts[0].groups.is_empty());
    }

    #[test]
    fn phone_without_digits_is_not_stored() {
        let rows = vec![data_row("Ann", PHONE_MIMETYPE, "n/a")];
        let contacts = aggregate_contacts(&rows, &GroupIndex::default(), &NoopObserver);
        assert!(contacts[0].phones.is_empty());
    }

    #[test]
    fn sort_key_names_are_decoded() {
        let rows = vec![
            data_row("张 Zhang 三 San", PHONE_MIMETYPE, "138 0000 0000"),
            data_row("张 Zhang 三 San", EMAIL_MIMETYPE, "zs@example.cn"),
            data_row("张", PHONE_MIMETYPE, "1"),
        ];
        let contacts = aggregate_contacts(&rows, &GroupIndex::default(), &NoopObserver);
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].name, "Zhang San");
        assert_eq!(contacts[0].phones, vec!["13800000000"]);
        assert_eq!(contacts[1].name, UNKNOWN_NAME);
    }

    #[test]
    fn same_name_fuses_distinct_people() {
        let rows = vec![
            data_row("Sam", PHONE_MIMETYPE, "111"),
            data_row("Sam", PHONE_MIMETYPE, "222"),
        ];
        let contacts = aggregate_contacts(&rows, &GroupIndex::default(), &NoopObserver);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].phones, vec!["111", "222"]);
    }

    #[test]
    fn empty_input() {
        let contacts = aggregate_contacts(&[], &GroupIndex::default(), &NoopObserver);
        assert!(contacts.is_empty());
    }

    struct Lower;

    impl NameDecoder for Lower {
        fn decode(&self, raw: &str) -> String {
            raw.to_lowercase()
        }
    }

    #[test]
    fn custom_decoder_changes_merge_key() {
        let rows = vec![
            data_row("ANN", PHONE_MIMETYPE, "1"),
            data_row("ann", PHONE_MIMETYPE, "2"),
        ];
        let index = GroupIndex::default();
        let mut aggregator = ContactAggregator::new(&index, &NoopObserver).with_decoder(&Lower);
        aggregator.fold_all(&rows);
        assert_eq!(aggregator.len(), 1);
        let contacts = aggregator.finish();
        assert_eq!(contacts[0].name, "ann");
    }
}
