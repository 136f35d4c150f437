use std::time::Duration;

/// Content URI of the contact groups table
pub const GROUPS_URI: &str = "content://com.android.contacts/groups";

/// Content URI of the unified contact data table
pub const DATA_URI: &str = "content://com.android.contacts/data";

/// Content URI of the short message store
pub const SMS_URI: &str = "content://sms";

/// Marker that opens every row line of a content dump
pub const ROW_MARKER: &str = "Row:";

/// Separator between `key=value` pairs inside a row line
pub const FIELD_SEPARATOR: &str = ", ";

/// Literal the content tool prints for SQL NULL
pub const NULL_LITERAL: &str = "NULL";

pub const ID_COLUMN: &str = "_id";
pub const TITLE_COLUMN: &str = "title";
pub const MIMETYPE_COLUMN: &str = "mimetype";
pub const DATA_COLUMN: &str = "data1";

/// Any column whose label contains this is a sort-key name source
pub const SORT_KEY_MARKER: &str = "sort_key";

/// Fallback name source, matched as a label suffix
pub const DISPLAY_NAME_ALT_SUFFIX: &str = "display_name_alt";

pub const PHONE_MIMETYPE: &str = "vnd.android.cursor.item/phone_v2";
pub const EMAIL_MIMETYPE: &str = "vnd.android.cursor.item/email_v2";
pub const GROUP_MEMBERSHIP_MIMETYPE: &str = "vnd.android.cursor.item/group_membership";
pub const NOTE_MIMETYPE: &str = "vnd.android.cursor.item/note";

/// Name given to a contact whose name column decodes to nothing
pub const UNKNOWN_NAME: &str = "unknown";

pub const NOTE_SEPARATOR: &str = " | ";
pub const GROUP_SEPARATOR: &str = ", ";

/// Permissions the readers expect the device to grant
pub const READ_CONTACTS_PERMISSION: &str = "android.permission.READ_CONTACTS";
pub const READ_SMS_PERMISSION: &str = "android.permission.READ_SMS";

pub const DEFAULT_ADB_PATH: &str = "adb";

/// Upper bound for a single adb invocation
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Seconds between re-scans in watch mode
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;
