use crate::config::GROUP_SEPARATOR;
use crate::models::Contact;
use crate::sms::SmsMessage;
use anyhow::{Context, Result};
use csv::Writer;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Writes contacts as the JSON array `[{name, phone, email, group, notes}]`.
pub fn save_contacts(path: &Path, contacts: &[Contact]) -> Result<()> {
    write_json(path, contacts)?;
    info!(contacts = contacts.len(), path = ?path, "Contacts saved");
    Ok(())
}

/// Missing file reads as no contacts; a corrupt file is an error.
pub fn load_contacts(path: &Path) -> Result<Vec<Contact>> {
    read_json(path)
}

pub fn save_sms(path: &Path, messages: &[SmsMessage]) -> Result<()> {
    write_json(path, messages)?;
    info!(messages = messages.len(), path = ?path, "Messages saved");
    Ok(())
}

pub fn load_sms(path: &Path) -> Result<Vec<SmsMessage>> {
    read_json(path)
}

/// CSV with header `name,phone,email,group`; multi-valued fields are joined.
pub fn export_csv(path: &Path, contacts: &[Contact]) -> Result<()> {
    create_parent(path)?;
    let file =
        File::create(path).with_context(|| format!("Failed to create CSV file: {:?}", path))?;
    let mut writer = Writer::from_writer(BufWriter::new(file));

    writer.write_record(["name", "phone", "email", "group"])?;
    for contact in contacts {
        let phones = contact.phones.join(GROUP_SEPARATOR);
        let emails = contact.emails.join(GROUP_SEPARATOR);
        let group = contact.group();
        writer.write_record([
            contact.name.as_str(),
            phones.as_str(),
            emails.as_str(),
            group.as_str(),
        ])?;
    }
    writer.flush()?;

    info!(contacts = contacts.len(), path = ?path, "Contacts exported");
    Ok(())
}

/// Pretty JSON written to a temp file, then renamed over `path`.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    create_parent(path)?;

    let tmp_path = path.with_extension("json.tmp");
    let file = File::create(&tmp_path)
        .with_context(|| format!("Failed to create temp file: {:?}", tmp_path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).context("Failed to serialize JSON")?;
    writer.flush()?;

    fs::rename(&tmp_path, path)
        .with_context(|| format!("Failed to rename temp file to: {:?}", path))?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(path).with_context(|| format!("Failed to open: {:?}", path))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse JSON: {:?}", path))
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    Ok(())
}
