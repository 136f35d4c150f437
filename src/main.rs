use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use droidscan::config;
use droidscan::device::AdbClient;
use droidscan::filter::{contacts_in_group, group_names, search_contacts};
use droidscan::models::Contact;
use droidscan::observer::{Tee, TracingObserver};
use droidscan::scan::{self, ContactScan};
use droidscan::sms::{self, SmsMessage};
use droidscan::stats::ScanStats;
use droidscan::store;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "droidscan")]
#[command(about = "Read contacts and messages from Android content-query dumps")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List attached devices
    Devices(DeviceArgs),
    /// Scan contacts from a device or from captured dumps
    Contacts(ContactsArgs),
    /// Read short messages from a device or a captured dump
    Sms(SmsArgs),
    /// Re-scan contacts on a fixed interval
    Watch(WatchArgs),
}

#[derive(Args, Clone)]
struct DeviceArgs {
    /// Path to the adb executable
    #[arg(long, default_value = config::DEFAULT_ADB_PATH)]
    adb: String,

    /// Device serial (defaults to the first attached device)
    #[arg(short, long)]
    serial: Option<String>,

    /// Timeout for each adb invocation, in seconds
    #[arg(long, default_value_t = config::DEFAULT_QUERY_TIMEOUT.as_secs())]
    timeout: u64,
}

#[derive(Args)]
struct ContactsArgs {
    #[command(flatten)]
    device: DeviceArgs,

    /// Scan every attached device concurrently
    #[arg(long, conflicts_with = "serial")]
    all_devices: bool,

    /// Captured output of a groups-table query
    #[arg(long, requires = "data_dump")]
    groups_dump: Option<PathBuf>,

    /// Captured output of a data-table query (skips the device)
    #[arg(long)]
    data_dump: Option<PathBuf>,

    /// Save contacts as JSON
    #[arg(long)]
    save: Option<PathBuf>,

    /// Export contacts as CSV
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Only keep contacts matching this keyword
    #[arg(long)]
    search: Option<String>,

    /// Only keep contacts in this group
    #[arg(long)]
    group: Option<String>,

    /// Print the known group labels
    #[arg(long)]
    list_groups: bool,
}

#[derive(Args)]
struct SmsArgs {
    #[command(flatten)]
    device: DeviceArgs,

    /// Captured output of an sms query (skips the device)
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Only keep messages matching this keyword
    #[arg(long)]
    search: Option<String>,

    /// Save messages as JSON
    #[arg(long)]
    save: Option<PathBuf>,
}

#[derive(Args)]
struct WatchArgs {
    #[command(flatten)]
    device: DeviceArgs,

    /// Seconds between scans
    #[arg(long, default_value_t = config::DEFAULT_REFRESH_INTERVAL_SECS)]
    interval: u64,

    /// Stop after this many scans
    #[arg(long)]
    max_runs: Option<u64>,

    /// Save contacts as JSON after every scan
    #[arg(long)]
    save: Option<PathBuf>,
}

impl DeviceArgs {
    fn client(&self) -> AdbClient {
        let client = AdbClient::new(&self.adb).with_timeout(Duration::from_secs(self.timeout));
        match &self.serial {
            Some(serial) => client.with_serial(serial),
            None => client,
        }
    }

    /// Client bound to the requested device, or to the first attached one.
    async fn connect(&self) -> Result<AdbClient> {
        let client = self.client();
        if client.serial().is_some() {
            return Ok(client);
        }
        let devices = client.devices().await?;
        match devices.into_iter().next() {
            Some(serial) => {
                info!(serial = %serial, "Using first attached device");
                Ok(client.with_serial(serial))
            }
            None => bail!("No device attached"),
        }
    }
}

async fn run_devices(args: DeviceArgs) -> Result<()> {
    let client = args.client();
    let devices = client.devices().await?;
    if devices.is_empty() {
        println!("No devices attached.");
        return Ok(());
    }
    for serial in devices {
        let info = client.clone().with_serial(&serial).device_info().await;
        println!(
            "{}\t{}\t{}\tAndroid {}",
            serial,
            info.manufacturer.as_deref().unwrap_or("?"),
            info.model.as_deref().unwrap_or("?"),
            info.android_version.as_deref().unwrap_or("?"),
        );
    }
    Ok(())
}

async fn run_contacts(args: ContactsArgs) -> Result<()> {
    if args.all_devices && args.data_dump.is_none() {
        return run_contacts_all_devices(&args).await;
    }

    let stats = ScanStats::new();
    let observer = Tee {
        first: &TracingObserver,
        second: &stats,
    };

    let scan = match &args.data_dump {
        Some(data_path) => {
            let groups_text = match &args.groups_dump {
                Some(path) => read_dump(path)?,
                None => String::new(),
            };
            let data_text = read_dump(data_path)?;
            scan::contacts_from_dumps(&groups_text, &data_text, &observer)
        }
        None => {
            let client = args.device.connect().await?;
            if !client
                .has_permission(config::READ_CONTACTS_PERMISSION)
                .await
            {
                warn!("READ_CONTACTS not listed on device, scan may come back empty");
            }
            let pb = make_spinner("Querying contacts ...");
            let scan = scan::scan_contacts(&client, &observer).await;
            pb.finish_and_clear();
            scan
        }
    };

    report_contacts(&args, &scan, &stats, None)
}

async fn run_contacts_all_devices(args: &ContactsArgs) -> Result<()> {
    let serials = args.device.client().devices().await?;
    if serials.is_empty() {
        bail!("No device attached");
    }
    let clients: Vec<AdbClient> = serials
        .iter()
        .map(|serial| args.device.client().with_serial(serial))
        .collect();

    for result in scan::scan_devices(&clients).await {
        println!();
        println!("=== Device {} ===", result.serial);
        report_contacts(args, &result.scan, &result.stats, Some(result.serial.as_str()))?;
    }
    Ok(())
}

fn report_contacts(
    args: &ContactsArgs,
    scan: &ContactScan,
    stats: &ScanStats,
    serial: Option<&str>,
) -> Result<()> {
    let mut selected: Vec<Contact> = scan.contacts.clone();
    if let Some(keyword) = &args.search {
        selected = search_contacts(&selected, keyword).into_iter().cloned().collect();
    }
    if let Some(label) = &args.group {
        selected = contacts_in_group(&selected, label).into_iter().cloned().collect();
    }

    for contact in &selected {
        println!(
            "{} | {} | {} | {}",
            contact.name,
            contact.phones.join(", "),
            contact.emails.join(", "),
            contact.group()
        );
    }

    if args.list_groups {
        println!();
        println!("Groups:");
        for label in group_names(&scan.groups) {
            println!("  {}", label);
        }
    }

    if let Some(path) = &args.save {
        store::save_contacts(&per_device_path(path, serial), &selected)?;
    }
    if let Some(path) = &args.csv {
        store::export_csv(&per_device_path(path, serial), &selected)?;
    }

    println!();
    println!("=== Summary ===");
    println!("Contacts:           {}", scan.contacts.len());
    println!("Shown:              {}", selected.len());
    println!("Rows parsed:        {}", stats.parsed());
    println!("Rows skipped:       {}", stats.skipped());
    println!("Phone rows:         {}", stats.phones());
    println!("Email rows:         {}", stats.emails());
    println!("Group rows:         {}", stats.groups());
    println!("Note rows:          {}", stats.notes());
    Ok(())
}

/// `contacts.json` becomes `contacts_<serial>.json` when scanning several devices.
fn per_device_path(path: &Path, serial: Option<&str>) -> PathBuf {
    let Some(serial) = serial else {
        return path.to_path_buf();
    };
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, serial, ext.to_string_lossy()),
        None => format!("{}_{}", stem, serial),
    };
    path.with_file_name(name)
}

async fn run_sms(args: SmsArgs) -> Result<()> {
    let stats = ScanStats::new();
    let observer = Tee {
        first: &TracingObserver,
        second: &stats,
    };

    let messages = match &args.dump {
        Some(path) => sms::read_messages(&read_dump(path)?, &observer),
        None => {
            let client = args.device.connect().await?;
            if !client.has_permission(config::READ_SMS_PERMISSION).await {
                warn!("READ_SMS not listed on device, scan may come back empty");
            }
            scan::scan_sms(&client, &observer).await
        }
    };

    let selected: Vec<SmsMessage> = match &args.search {
        Some(keyword) => sms::search_sms(&messages, keyword)
            .into_iter()
            .cloned()
            .collect(),
        None => messages,
    };

    for (address, thread) in sms::conversations(&selected) {
        println!("--- {} ({} messages)", address, thread.len());
        for message in thread {
            println!("  [{}] {}", message.datetime(), message.body);
        }
    }

    if let Some(path) = &args.save {
        store::save_sms(path, &selected)?;
    }

    println!();
    println!("Messages:           {}", selected.len());
    println!("Rows skipped:       {}", stats.skipped());
    Ok(())
}

async fn run_watch(args: WatchArgs) -> Result<()> {
    if args.interval == 0 {
        bail!("--interval must be at least 1 second");
    }
    let client = args.device.connect().await?;
    let mut ticker = tokio::time::interval(Duration::from_secs(args.interval));
    let mut runs = 0u64;

    loop {
        ticker.tick().await;
        runs += 1;

        // Fresh state every tick; scans never share an index or contact map.
        let stats = ScanStats::new();
        let observer = Tee {
            first: &TracingObserver,
            second: &stats,
        };
        let scan = scan::scan_contacts(&client, &observer).await;
        info!(
            run = runs,
            contacts = scan.contacts.len(),
            skipped = stats.skipped(),
            "Watch scan complete"
        );
        println!("[scan {}] {} contacts", runs, scan.contacts.len());

        if let Some(path) = &args.save {
            if let Err(e) = store::save_contacts(path, &scan.contacts) {
                warn!(error = %e, "Failed to save contacts");
            }
        }

        if args.max_runs.is_some_and(|max| runs >= max) {
            return Ok(());
        }
    }
}

fn make_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(msg.to_string());
    pb
}

fn read_dump(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read dump file: {:?}", path))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    let result = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("droidscan-worker")
        .enable_io()
        .enable_time()
        .build()
        .context("Failed to start runtime")
        .and_then(|rt| {
            rt.block_on(async {
                match cli.command {
                    Commands::Devices(args) => run_devices(args).await,
                    Commands::Contacts(args) => run_contacts(args).await,
                    Commands::Sms(args) => run_sms(args).await,
                    Commands::Watch(args) => run_watch(args).await,
                }
            })
        });

    match result {
        Ok(()) => {
            info!("Completed successfully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
