use crate::config::{DEFAULT_ADB_PATH, DEFAULT_QUERY_TIMEOUT};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, error, warn};

/// Result of one content query. `text` holds stdout on success and the error otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOutput {
    pub success: bool,
    pub text: String,
}

impl QueryOutput {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            success: true,
            text: text.into(),
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            text: reason.into(),
        }
    }

    /// Dump text to parse; a failed query counts as an empty scan.
    pub fn into_dump(self, uri: &str) -> String {
        if self.success {
            self.text
        } else {
            warn!(uri, reason = %self.text.trim(), "Query failed, treating as empty");
            String::new()
        }
    }
}

/// Anything that can answer `content query --uri <uri>`.
pub trait ContentSource {
    fn run_query(&self, uri: &str) -> impl Future<Output = QueryOutput>;
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DeviceInfo {
    pub model: Option<String>,
    pub android_version: Option<String>,
    pub manufacturer: Option<String>,
}

/// Talks to one device through the `adb` binary.
#[derive(Debug, Clone)]
pub struct AdbClient {
    adb_path: String,
    serial: Option<String>,
    timeout: Duration,
}

impl Default for AdbClient {
    fn default() -> Self {
        Self::new(DEFAULT_ADB_PATH)
    }
}

impl AdbClient {
    pub fn new(adb_path: impl Into<String>) -> Self {
        Self {
            adb_path: adb_path.into(),
            serial: None,
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn with_serial(mut self, serial: impl Into<String>) -> Self {
        self.serial = Some(serial.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    /// Serials of attached devices in the `device` state.
    pub async fn devices(&self) -> Result<Vec<String>> {
        let output = self.run(&["devices"], false).await?;
        Ok(parse_devices(&output))
    }

    pub async fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            model: self.getprop("ro.product.model").await,
            android_version: self.getprop("ro.build.version.release").await,
            manufacturer: self.getprop("ro.product.manufacturer").await,
        }
    }

    /// Whether `permission` shows up among the device's dangerous permissions.
    pub async fn has_permission(&self, permission: &str) -> bool {
        match self
            .run(&["shell", "pm", "list", "permissions", "-g", "-d"], true)
            .await
        {
            Ok(output) => output.contains(permission),
            Err(e) => {
                warn!(permission, error = %e, "Permission check failed");
                false
            }
        }
    }

    async fn getprop(&self, key: &str) -> Option<String> {
        match self.run(&["shell", "getprop", key], true).await {
            Ok(value) => Some(value.trim().to_string()).filter(|v| !v.is_empty()),
            Err(e) => {
                debug!(key, error = %e, "getprop failed");
                None
            }
        }
    }

    async fn run(&self, args: &[&str], targeted: bool) -> Result<String> {
        let mut cmd = Command::new(&self.adb_path);
        if targeted {
            if let Some(serial) = &self.serial {
                cmd.arg("-s").arg(serial);
            }
        }
        cmd.args(args).kill_on_drop(true);
        debug!(adb = %self.adb_path, ?args, serial = ?self.serial, "Running adb");

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .with_context(|| format!("adb {} timed out after {:?}", args.join(" "), self.timeout))?
            .with_context(|| format!("Failed to run '{}'", self.adb_path))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("adb {} exited with {}: {}", args.join(" "), output.status, stderr.trim());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl ContentSource for AdbClient {
    async fn run_query(&self, uri: &str) -> QueryOutput {
        match self
            .run(&["shell", "content", "query", "--uri", uri], true)
            .await
        {
            Ok(text) => QueryOutput::ok(text),
            Err(e) => {
                error!(uri, error = %e, "Content query failed");
                QueryOutput::failed(format!("{e:#}"))
            }
        }
    }
}

/// Parses `adb devices` output, skipping the header and non-ready devices.
pub fn parse_devices(output: &str) -> Vec<String> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(serial), Some("device")) => Some(serial.to_string()),
                _ => None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_devices_ready_only() {
        let output = "List of devices attached\n\
                      emulator-5554\tdevice\n\
                      R58M12ABC\tunauthorized\n\
                      0123456789ABCDEF\tdevice\n\
                      \n";
        assert_eq!(
            parse_devices(output),
            vec!["emulator-5554", "0123456789ABCDEF"]
        );
    }

    #[test]
    fn parse_devices_none() {
        assert!(parse_devices("List of devices attached\n\n").is_empty());
        assert!(parse_devices("").is_empty());
    }

    #[test]
    fn failed_query_is_empty_dump() {
        let output = QueryOutput::failed("error: no devices/emulators found");
        assert_eq!(output.into_dump("content://sms"), "");
        assert_eq!(QueryOutput::ok("Row: 0 a=1").into_dump("x"), "Row: 0 a=1");
    }

    #[test]
    fn builder_sets_serial() {
        let client = AdbClient::new("/opt/adb").with_serial("emulator-5554");
        assert_eq!(client.serial(), Some("emulator-5554"));
        assert_eq!(AdbClient::default().serial(), None);
    }

    #[tokio::test]
    async fn missing_binary_is_failed_query() {
        let client = AdbClient::new("/nonexistent/adb-binary")
            .with_timeout(Duration::from_secs(5));
        let output = client.run_query("content://sms").await;
        assert!(!output.success);
        assert!(client.devices().await.is_err());
        assert!(!client.has_permission("android.permission.READ_SMS").await);
    }
}
