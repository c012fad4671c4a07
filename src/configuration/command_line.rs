use crate::configuration::constants::cargo_env::CARGO_PKG_NAME;
use crate::time::timeunit::parse_duration;
use clap::arg_enum;
use log::LevelFilter;
use std::path::PathBuf;
use std::time::Duration;
use structopt::StructOpt;

arg_enum! {
    #[derive(Debug, Clone, Copy)]
    pub enum LogLevel {
        Off, Error, Warn, Info, Debug, Trace,
    }
}

/// Every setting is optional here; unset flags fall back to the settings file,
/// the environment and then the built-in defaults.
#[derive(StructOpt, Debug, Default)]
#[structopt(name = CARGO_PKG_NAME, about = "Soak tests a provisioner by creating and deleting installations in batches")]
pub struct Opt {
    /// Settings file. Supported: YAML, JSON, TOML, HJSON
    #[structopt(long, short = "c", parse(from_os_str))]
    pub config: Option<PathBuf>,

    /// Provisioner address
    #[structopt(long, short = "s")]
    pub server: Option<String>,

    /// Installations created sequentially by each concurrent worker
    #[structopt(long, short = "b")]
    pub batch_size: Option<usize>,

    /// Installations created per run
    #[structopt(long, short = "n")]
    pub total: Option<usize>,

    /// Number of runs
    #[structopt(long, short = "r")]
    pub runs: Option<usize>,

    #[structopt(long)]
    pub database: Option<String>,

    #[structopt(long)]
    pub filestore: Option<String>,

    /// Installation size class
    #[structopt(long)]
    pub size: Option<String>,

    #[structopt(long)]
    pub affinity: Option<String>,

    /// Owner recorded on every installation
    #[structopt(long)]
    pub owner: Option<String>,

    /// Domain appended to generated installation DNS names
    #[structopt(long)]
    pub dns_domain: Option<String>,

    /// Pause between polls while waiting for installations to stabilize, e.g. 5s
    #[structopt(long, parse(try_from_str = parse_duration))]
    pub poll_interval: Option<Duration>,

    /// Pause between cleanup passes
    #[structopt(long, parse(try_from_str = parse_duration))]
    pub cleanup_interval: Option<Duration>,

    /// Pause between lookups while waiting for the group to appear
    #[structopt(long, parse(try_from_str = parse_duration))]
    pub group_interval: Option<Duration>,

    /// Give up any single wait after this long, e.g. 30m. Waits forever when unset
    #[structopt(long, parse(try_from_str = parse_duration))]
    pub timeout: Option<Duration>,

    /// Timeout of a single provisioner request
    #[structopt(long, parse(try_from_str = parse_duration))]
    pub request_timeout: Option<Duration>,

    /// Write results and per-installation outcomes to this JSON file
    #[structopt(long, parse(from_os_str))]
    pub report_file: Option<PathBuf>,

    /// Sets a logging level
    #[structopt(case_insensitive = true, long, short = "L", possible_values = &LogLevel::variants(), env = "LOG_LEVEL")]
    pub logging: Option<LogLevel>,

    /// File to which application will write logs
    #[structopt(long, short = "O", env = "LOG_OUTPUT_FILE", parse(from_os_str))]
    pub log_output_file: Option<PathBuf>,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}
