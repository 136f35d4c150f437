use crate::index::GroupIndex;
use crate::models::Contact;

/// Case-insensitive substring match over name, phones, emails and group.
pub fn search_contacts<'a>(contacts: &'a [Contact], keyword: &str) -> Vec<&'a Contact> {
    let keyword = keyword.to_lowercase();
    contacts
        .iter()
        .filter(|c| {
            std::iter::once(&c.name)
                .chain(&c.phones)
                .chain(&c.emails)
                .chain(&c.groups)
                .any(|field| field.to_lowercase().contains(&keyword))
        })
        .collect()
}

/// Distinct group labels, sorted.
pub fn group_names(index: &GroupIndex) -> Vec<String> {
    let mut names: Vec<String> = index.labels().map(String::from).collect();
    names.sort();
    names.dedup();
    names
}

/// Contacts whose group list holds `label` exactly.
pub fn contacts_in_group<'a>(contacts: &'a [Contact], label: &str) -> Vec<&'a Contact> {
    contacts
        .iter()
        .filter(|c| c.group_labels().any(|g| g == label))
        .collect()
}
