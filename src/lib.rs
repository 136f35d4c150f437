//! Droidscan: Android content-dump parsing and contact aggregation
//!
//! `adb shell content query` prints database rows as loosely delimited text. This crate
//! turns that text into typed records:
//!
//! 1. **Tokenizing** -- Split a dump into `Row:` lines and each line into ordered
//!    `column -> value` pairs, repairing values that contain the `", "` separator or `=`
//! 2. **Name resolution** -- Pick the best name column of a row and decode CJK sort keys
//! 3. **Normalization** -- Reduce phone numbers to digits for deduplication
//! 4. **Group indexing** -- Map group ids from the groups table to their titles
//! 5. **Aggregation** -- Fold phone, email, group and note rows into one contact per name
//!
//! # Architecture
//!
//! - **Synchronous core** -- Parsing and aggregation are pure functions over the dump text
//! - **No shared state** -- Each scan owns its group index and contact map
//! - **Injected diagnostics** -- The core reports skipped lines and rows to a
//!   [`observer::ScanObserver`] instead of a global logger
//! - **Transport at the edge** -- [`device::ContentSource`] abstracts the adb invocation;
//!   a failed query is an empty scan, never an error
//!
//! # Key Modules
//!
//! - [`parser`] -- Row tokenizer for `content query` output
//! - [`name`] -- Display-name selection and sort-key decoding
//! - [`normalize`] -- Phone and name canonicalization
//! - [`index`] -- Group id to label lookup
//! - [`aggregate`] -- Name-keyed contact merging
//! - [`scan`] -- End-to-end scans against dumps or devices
//! - [`device`] -- adb transport
//! - [`sms`] -- Short-message reader on the same tokenizer
//! - [`store`] -- JSON persistence and CSV export
//! - [`filter`] -- Contact search and group selection
//! - [`models`] -- Core data types (RawRow, Contact, RowKind)
//! - [`stats`] -- Atomic scan counters
//! - [`config`] -- URIs, column names, mimetypes and defaults
//!
//! # Example Usage
//!
//! ```bash
//! # Scan the first attached device and save the result
//! droidscan contacts --save out/contacts.json
//!
//! # Aggregate previously captured dumps
//! droidscan contacts --groups-dump groups.txt --data-dump data.txt --csv out/contacts.csv
//!
//! # Re-scan every 5 minutes
//! droidscan watch --interval 300 --save out/contacts.json
//! ```

pub mod aggregate;
pub mod config;
pub mod device;
pub mod filter;
pub mod index;
pub mod models;
pub mod name;
pub mod normalize;
pub mod observer;
pub mod parser;
pub mod scan;
pub mod sms;
pub mod stats;
pub mod store;
