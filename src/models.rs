use crate::config::{
    EMAIL_MIMETYPE, GROUP_MEMBERSHIP_MIMETYPE, GROUP_SEPARATOR, NOTE_MIMETYPE, NOTE_SEPARATOR,
    PHONE_MIMETYPE,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One `Row:` line of a content dump, as ordered `column -> value` pairs.
///
/// Rows carry no schema: any column may be missing and unknown columns are kept.
/// Values are already trimmed and `NULL` has been canonicalized to the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    fields: Vec<(String, String)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`. A repeated key keeps its first position but takes the new value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Missing columns read as empty, same as `NULL`.
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut String> {
        self.fields
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// First column, in row order, whose label satisfies `pred`.
    pub fn find_column<F>(&self, pred: F) -> Option<(&str, &str)>
    where
        F: Fn(&str) -> bool,
    {
        self.fields
            .iter()
            .find(|(k, _)| pred(k))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for RawRow
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = RawRow::new();
        for (k, v) in iter {
            row.insert(k, v);
        }
        row
    }
}

/// What a row of the unified data table describes, from its mimetype column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKind {
    Phone,
    Email,
    GroupMembership,
    Note,
    Other,
}

impl RowKind {
    pub fn from_mimetype(mimetype: &str) -> Self {
        match mimetype {
            PHONE_MIMETYPE => RowKind::Phone,
            EMAIL_MIMETYPE => RowKind::Email,
            GROUP_MEMBERSHIP_MIMETYPE => RowKind::GroupMembership,
            NOTE_MIMETYPE => RowKind::Note,
            _ => RowKind::Other,
        }
    }
}

/// A contact merged from every data row that resolved to the same display name.
///
/// The serialized form uses the keys `name`, `phone`, `email`, `group` and `notes`.
/// Group labels are kept as a list and only joined into the `group` string on output,
/// since a label may itself contain the separator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    #[serde(rename = "phone", default)]
    pub phones: Vec<String>,
    #[serde(rename = "email", default)]
    pub emails: Vec<String>,
    #[serde(
        rename = "group",
        default,
        serialize_with = "join_labels",
        deserialize_with = "split_labels"
    )]
    pub groups: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

impl Contact {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Returns false when the phone was already present.
    pub fn add_phone(&mut self, phone: String) -> bool {
        push_unique(&mut self.phones, phone)
    }

    pub fn add_email(&mut self, email: String) -> bool {
        push_unique(&mut self.emails, email)
    }

    /// Appends a group label unless an equal label is already listed.
    pub fn add_group(&mut self, label: &str) -> bool {
        push_unique(&mut self.groups, label.to_string())
    }

    pub fn add_note(&mut self, note: &str) {
        if !self.notes.is_empty() {
            self.notes.push_str(NOTE_SEPARATOR);
        }
        self.notes.push_str(note);
    }

    pub fn group_labels(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(String::as_str)
    }

    /// Labels joined with `", "`, as written to JSON and CSV.
    pub fn group(&self) -> String {
        self.groups.join(GROUP_SEPARATOR)
    }
}

fn join_labels<S: Serializer>(labels: &[String], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&labels.join(GROUP_SEPARATOR))
}

/// Saved files only hold the joined string, so a label containing `", "` reloads as
/// several labels.
fn split_labels<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let joined = String::deserialize(deserializer)?;
    Ok(joined
        .split(GROUP_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect())
}

fn push_unique(values: &mut Vec<String>, value: String) -> bool {
    if value.is_empty() || values.contains(&value) {
        return false;
    }
    values.push(value);
    true
}
