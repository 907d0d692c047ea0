//! VolSweep: concurrent file name search across every volume on a host.
//!
//! Thin binary entry point. All scanning logic lives in `volsweep-core`.

mod cli;
mod console;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;
use volsweep_core::platform::{HostVolumes, StaticVolumes, VolumeSource};
use volsweep_core::report::{write_matches, TracingLog};
use volsweep_core::scanner::Orchestrator;
use volsweep_core::{SweepConfig, SweepError};

/// Exit status for an empty or unparsable pattern.
const EXIT_BAD_PATTERN: u8 = 2;

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let mut config = match &cli.config {
        Some(path) => SweepConfig::from_json_file(path)?,
        None => SweepConfig::default(),
    };
    cli.apply(&mut config);
    config.validate()?;

    let source: Box<dyn VolumeSource> = if cli.roots.is_empty() {
        Box::new(HostVolumes)
    } else {
        Box::new(StaticVolumes::from_roots(cli.roots.clone()))
    };

    if cli.list_volumes {
        console::print_volumes(&source.volumes(), &config);
        return Ok(ExitCode::SUCCESS);
    }

    let pattern = cli.pattern.clone().unwrap_or_default();
    let orchestrator = Orchestrator::new(config, source, Arc::new(TracingLog));
    let mut display = console::ConsoleDisplay::stderr(cli.quiet);

    let report = match orchestrator.run(&pattern, &mut display) {
        Ok(report) => report,
        Err(err @ (SweepError::EmptyPattern | SweepError::InvalidPattern(_))) => {
            eprintln!("volsweep: {err}");
            return Ok(ExitCode::from(EXIT_BAD_PATTERN));
        }
        Err(err) => return Err(err.into()),
    };

    console::print_summary(&report);

    let format = cli.format.into();
    match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create {}", path.display()))?;
            write_matches(BufWriter::new(file), &report.matches, format)?;
        }
        None => write_matches(io::stdout().lock(), &report.matches, format)?,
    }

    Ok(ExitCode::SUCCESS)
}

/// Structured logging to stderr, or appended to `--log-file` when given.
fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level()));

    match &cli.log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
        }
    }

    tracing::debug!("volsweep starting");
    Ok(())
}
