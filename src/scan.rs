//! One full pass from raw dumps to contacts.
//!
//! Every call builds its own [`GroupIndex`] and aggregator, so scans never share
//! state and may run side by side for different devices.

use crate::aggregate::aggregate_contacts;
use crate::config::{DATA_URI, GROUPS_URI, SMS_URI};
use crate::device::{AdbClient, ContentSource};
use crate::index::GroupIndex;
use crate::models::Contact;
use crate::observer::{ScanObserver, Tee, TracingObserver};
use crate::parser::parse_dump;
use crate::sms::{read_messages, SmsMessage};
use crate::stats::ScanStats;
use futures::stream::{FuturesUnordered, StreamExt};
use std::time::Instant;
use tracing::info;

/// Output of a contact scan.
#[derive(Debug, Default)]
pub struct ContactScan {
    pub contacts: Vec<Contact>,
    pub groups: GroupIndex,
}

/// Aggregates contacts from the text of a groups dump and a data dump.
pub fn contacts_from_dumps(
    groups_text: &str,
    data_text: &str,
    observer: &dyn ScanObserver,
) -> ContactScan {
    let groups = GroupIndex::build(&parse_dump(groups_text, observer), observer);
    let rows = parse_dump(data_text, observer);
    let contacts = aggregate_contacts(&rows, &groups, observer);
    observer.rows_aggregated(rows.len(), contacts.len());
    ContactScan { contacts, groups }
}

/// Queries the groups table, then the data table, and aggregates.
pub async fn scan_contacts<S: ContentSource>(
    source: &S,
    observer: &dyn ScanObserver,
) -> ContactScan {
    let start = Instant::now();
    let groups_text = source.run_query(GROUPS_URI).await.into_dump(GROUPS_URI);
    let data_text = source.run_query(DATA_URI).await.into_dump(DATA_URI);
    let scan = contacts_from_dumps(&groups_text, &data_text, observer);
    info!(
        duration_secs = start.elapsed().as_secs_f64(),
        "Contact scan complete"
    );
    scan
}

pub async fn scan_sms<S: ContentSource>(source: &S, observer: &dyn ScanObserver) -> Vec<SmsMessage> {
    let text = source.run_query(SMS_URI).await.into_dump(SMS_URI);
    let messages = read_messages(&text, observer);
    info!(messages = messages.len(), "SMS scan complete");
    messages
}

/// A contact scan of one device, with its own counters.
pub struct DeviceScan {
    pub serial: String,
    pub scan: ContactScan,
    pub stats: ScanStats,
}

/// Scans several devices concurrently; results arrive in completion order.
pub async fn scan_devices(clients: &[AdbClient]) -> Vec<DeviceScan> {
    let mut pending: FuturesUnordered<_> = clients
        .iter()
        .map(|client| async move {
            let stats = ScanStats::new();
            let observer = Tee {
                first: &TracingObserver,
                second: &stats,
            };
            let scan = scan_contacts(client, &observer).await;
            DeviceScan {
                serial: client.serial().unwrap_or_default().to_string(),
                scan,
                stats,
            }
        })
        .collect();

    let mut results = Vec::with_capacity(clients.len());
    while let Some(done) = pending.next().await {
        results.push(done);
    }
    results
}
