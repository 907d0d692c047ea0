//! Command-line arguments.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use volsweep_core::config::BackendPreference;
use volsweep_core::model::VolumeKind;
use volsweep_core::report::ExportFormat;
use volsweep_core::SweepConfig;

#[derive(Debug, Parser)]
#[command(
    name = "volsweep",
    version,
    about = "Search every volume on this host for file names matching a regular expression"
)]
pub struct Cli {
    /// Regular expression matched against each file's base name.
    #[arg(required_unless_present = "list_volumes")]
    pub pattern: Option<String>,

    /// JSON configuration file; flags below override its values.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Maximum number of volumes scanned at once.
    #[arg(short = 'j', long, value_name = "N")]
    pub max_concurrent: Option<usize>,

    /// Progress display refresh interval in milliseconds.
    #[arg(long, value_name = "MS")]
    pub poll_interval: Option<u64>,

    /// Execution backend for the scan workers.
    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,

    /// Match file names case-insensitively.
    #[arg(short, long)]
    pub ignore_case: bool,

    /// Report network volumes without scanning them.
    #[arg(long)]
    pub no_network: bool,

    /// Scan these directories instead of the host's volumes.
    #[arg(long = "root", value_name = "PATH")]
    pub roots: Vec<PathBuf>,

    /// List the host's volumes and exit.
    #[arg(long)]
    pub list_volumes: bool,

    /// Write matches to this file instead of stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format for the match list.
    #[arg(short, long, value_enum, default_value_t = FormatArg::Plain)]
    pub format: FormatArg,

    /// Append structured log records to this file instead of stderr.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// More log output (repeat for trace level).
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Auto,
    FanOut,
    WorkerPool,
}

impl From<BackendArg> for BackendPreference {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Auto => Self::Auto,
            BackendArg::FanOut => Self::FanOut,
            BackendArg::WorkerPool => Self::WorkerPool,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Plain,
    Csv,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Plain => Self::Plain,
            FormatArg::Csv => Self::Csv,
            FormatArg::Json => Self::Json,
        }
    }
}

impl Cli {
    /// Apply flag overrides on top of a loaded (or default) configuration.
    pub fn apply(&self, config: &mut SweepConfig) {
        if let Some(n) = self.max_concurrent {
            config.max_concurrent = n;
        }
        if let Some(ms) = self.poll_interval {
            config.poll_interval_ms = ms;
        }
        if let Some(backend) = self.backend {
            config.backend = backend.into();
        }
        if self.ignore_case {
            config.ignore_case = true;
        }
        if self.no_network && !config.exclude_kinds.contains(&VolumeKind::Network) {
            config.exclude_kinds.push(VolumeKind::Network);
        }
    }

    /// Default log filter when `RUST_LOG` is unset. Per-volume records are
    /// info level: on by default in a log file, opt-in on the console.
    pub fn log_level(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "error",
            (false, 0) if self.log_file.is_some() => "info",
            (false, 0) => "warn",
            (false, 1) => "info",
            (false, 2) => "debug",
            _ => "trace",
        }
    }
}
