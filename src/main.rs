/// Version injected at compile time via CLOUDQ_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("CLOUDQ_VERSION") {
    Some(v) => v,
    None => "dev",
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use cloudq::config::Config;
use cloudq::provider::{Endpoints, HttpTransport, QueryClient, RequestContext};
use cloudq::query::FanOutExecutor;
use cloudq::resource::{AlarmFilter, AlarmState, CloudAdapter, MetricFilter, VolumeFilter};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Query API resource adapter
#[derive(Parser, Debug)]
#[command(name = "cloudq", version, about, long_about = None)]
struct Args {
    /// Region to use
    #[arg(short, long)]
    region: Option<String>,

    /// Account number reported as resource owner
    #[arg(short, long)]
    account: Option<String>,

    /// Base URL replacing every service endpoint
    #[arg(long)]
    endpoint: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List volumes
    Volumes {
        /// Tag filter, `key=value`
        #[arg(long, value_parser = parse_pair)]
        tag: Vec<(String, String)>,
        /// Case-insensitive name match
        #[arg(long)]
        name: Option<String>,
        /// Only volumes attached to this server
        #[arg(long)]
        attached_to: Option<String>,
    },
    /// Show one volume
    Volume { id: String },
    /// List elastic addresses
    Addresses {
        /// Only addresses bound to nothing
        #[arg(long)]
        unassigned: bool,
    },
    /// Show one address, by literal or allocation id
    Address { id: String },
    /// List metric alarms
    Alarms {
        #[arg(long, value_enum)]
        state: Option<StateArg>,
    },
    /// List metrics
    Metrics {
        #[arg(long)]
        namespace: Option<String>,
        #[arg(long)]
        name: Option<String>,
    },
    /// List SSH keypairs
    Keypairs,
    /// List volumes, addresses, keypairs and alarms concurrently
    Inventory,
    /// Remember a region for later runs
    UseRegion { region: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StateArg {
    Ok,
    Alarm,
    InsufficientData,
}

impl From<StateArg> for AlarmState {
    fn from(value: StateArg) -> Self {
        match value {
            StateArg::Ok => AlarmState::Ok,
            StateArg::Alarm => AlarmState::Alarm,
            StateArg::InsufficientData => AlarmState::InsufficientData,
        }
    }
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {:?}: {}", log_path, e);
            return None;
        },
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("cloudq {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("cloudq").join("cloudq.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".cloudq").join("cloudq.log");
    }
    PathBuf::from("cloudq.log")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn build_adapter(args: &Args, config: &Config) -> Result<CloudAdapter> {
    let region = args.region.clone().unwrap_or_else(|| config.effective_region());
    let account = args.account.clone().unwrap_or_else(|| config.effective_account());

    let endpoint = match &args.endpoint {
        Some(raw) => Some(url::Url::parse(raw).with_context(|| format!("invalid endpoint '{}'", raw))?),
        None => config.endpoint_url()?,
    };
    let endpoints = match endpoint {
        Some(url) => Endpoints::Override(url),
        None => Endpoints::Regional(region.clone()),
    };

    tracing::info!("Using region: {}, endpoints: {:?}", region, endpoints);

    let transport = HttpTransport::new(endpoints).context("creating HTTP transport")?;
    let context = RequestContext::new(&region, &account).with_dialect(config.dialect);
    let client = QueryClient::new(Arc::new(transport), context);

    let adapter = CloudAdapter::new(client, FanOutExecutor::new(config.workers()), config.wait_policy());
    Ok(match &config.default_data_center {
        Some(dc) => adapter.with_default_data_center(dc),
        None => adapter,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let mut config = Config::load();

    if let Command::UseRegion { region } = &args.command {
        config.set_region(region).context("saving configuration")?;
        println!("Region set to {}", region);
        return Ok(());
    }

    let adapter = build_adapter(&args, &config)?;

    match &args.command {
        Command::Volumes { tag, name, attached_to } => {
            let mut filter = VolumeFilter::new();
            for (k, v) in tag {
                filter = filter.with_tag(k, v);
            }
            if let Some(name) = name {
                filter = filter.with_name(name);
            }
            if let Some(server) = attached_to {
                filter = filter.attached_to(server);
            }
            print_json(&adapter.volumes.list(Some(&filter)).await?)
        },
        Command::Volume { id } => print_json(&adapter.volumes.get(id).await?),
        Command::Addresses { unassigned } => {
            let filter = if *unassigned {
                cloudq::resource::AddressFilter::new().unassigned()
            } else {
                cloudq::resource::AddressFilter::new()
            };
            print_json(&adapter.addresses.list(Some(&filter)).await?)
        },
        Command::Address { id } => print_json(&adapter.addresses.get(id).await?),
        Command::Alarms { state } => {
            let mut filter = AlarmFilter::new();
            if let Some(state) = state {
                filter = filter.in_state((*state).into());
            }
            print_json(&adapter.monitoring.list_alarms(Some(&filter)).await?)
        },
        Command::Metrics { namespace, name } => {
            let mut filter = MetricFilter::new();
            if let Some(ns) = namespace {
                filter = filter.in_namespace(ns);
            }
            if let Some(name) = name {
                filter = filter.with_name(name);
            }
            print_json(&adapter.monitoring.list_metrics(Some(&filter)).await?)
        },
        Command::Keypairs => print_json(&adapter.keypairs.list(None).await?),
        Command::Inventory => print_json(&adapter.inventory().await?),
        Command::UseRegion { .. } => Ok(()),
    }
}
