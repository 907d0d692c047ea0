//! Console output: the live progress display, the volume list, and the
//! end-of-run summary. Everything here writes to stderr so stdout carries
//! only the exported match list.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, IsTerminal};
use volsweep_core::model::size::{format_count, format_elapsed, format_size};
use volsweep_core::model::{ProgressEntry, ScanStatus, Volume, VolumeId};
use volsweep_core::report::ProgressDisplay;
use volsweep_core::scanner::SweepReport;
use volsweep_core::SweepConfig;

/// Longest tail of the current path shown per volume line.
const PATH_TAIL_CHARS: usize = 60;

/// One progress bar per volume. Bars are drawn only on a terminal; when
/// stderr is redirected a plain line is printed each time a volume changes
/// status instead.
pub struct ConsoleDisplay {
    multi: MultiProgress,
    bars: HashMap<VolumeId, ProgressBar>,
    /// Print status-change lines (stderr is not a terminal and not quiet).
    log_lines: bool,
    last_status: HashMap<VolumeId, ScanStatus>,
}

impl ConsoleDisplay {
    pub fn stderr(quiet: bool) -> Self {
        let interactive = !quiet && io::stderr().is_terminal();
        let target = if interactive {
            ProgressDrawTarget::stderr()
        } else {
            ProgressDrawTarget::hidden()
        };
        Self {
            multi: MultiProgress::with_draw_target(target),
            bars: HashMap::new(),
            log_lines: !quiet && !interactive,
            last_status: HashMap::new(),
        }
    }

    fn bar(&mut self, volume: &VolumeId) -> ProgressBar {
        let multi = &self.multi;
        self.bars
            .entry(volume.clone())
            .or_insert_with(|| {
                let bar = multi.add(ProgressBar::new(100));
                bar.set_style(bar_style());
                bar.set_prefix(volume.to_string());
                bar
            })
            .clone()
    }

    fn log_changes(&mut self, snapshot: &[ProgressEntry]) {
        for entry in snapshot {
            let status = entry.progress.status;
            if self.last_status.insert(entry.volume.clone(), status) != Some(status) {
                eprintln!("{}", progress_line(entry));
            }
        }
    }
}

impl ProgressDisplay for ConsoleDisplay {
    fn render(&mut self, snapshot: &[ProgressEntry]) {
        for entry in snapshot {
            let bar = self.bar(&entry.volume);
            if bar.is_finished() {
                continue;
            }
            bar.set_position(u64::from(entry.progress.percent));
            if entry.progress.status.is_terminal() {
                bar.finish_with_message(status_message(entry));
            } else {
                bar.set_message(status_message(entry));
            }
        }
        if self.log_lines {
            self.log_changes(snapshot);
        }
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{prefix:<14} [{bar:30.cyan/blue}] {pos:>3}% {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ")
}

/// Status, match count and, while running, the tail of the current path.
fn status_message(entry: &ProgressEntry) -> String {
    let p = &entry.progress;
    let detail = match p.status {
        ScanStatus::Failed => p.error_message.clone().unwrap_or_default(),
        ScanStatus::Running => path_tail(&p.current_path),
        _ => String::new(),
    };
    format!(
        "{:<9} {:>9} matches  {}",
        p.status.label(),
        format_count(p.match_count),
        detail
    )
}

fn progress_line(entry: &ProgressEntry) -> String {
    format!(
        "{:<14} {:>3}% {}",
        entry.volume,
        entry.progress.percent,
        status_message(entry)
    )
}

fn path_tail(path: &str) -> String {
    let count = path.chars().count();
    if count <= PATH_TAIL_CHARS {
        return path.to_string();
    }
    let tail: String = path.chars().skip(count - (PATH_TAIL_CHARS - 3)).collect();
    format!("...{tail}")
}

/// Print the enumerated volumes and whether each would be scanned.
pub fn print_volumes(volumes: &[Volume], config: &SweepConfig) {
    if volumes.is_empty() {
        eprintln!("no volumes found");
        return;
    }
    eprintln!(
        "{:<14} {:<10} {:<10} {:>11} {:>11}  {}",
        "VOLUME", "KIND", "FS", "TOTAL", "FREE", "SCAN"
    );
    for v in volumes {
        eprintln!(
            "{:<14} {:<10} {:<10} {:>11} {:>11}  {}",
            v.id.as_str(),
            v.kind.label(),
            v.filesystem,
            format_size(v.total_bytes),
            format_size(v.free_bytes),
            if config.scans_kind(v.kind) { "yes" } else { "no" }
        );
    }
}

/// Per-volume outcome table and totals.
pub fn print_summary(report: &SweepReport) {
    eprintln!();
    for result in &report.results {
        let p = &result.progress;
        let mut line = format!(
            "{:<14} {:<9} {:>9} matches {:>12} entries {:>9}",
            result.volume.id.as_str(),
            p.status.label(),
            format_count(result.matches.len() as u64),
            format_count(p.entries_processed),
            format_elapsed(p.elapsed()),
        );
        if p.traversal_errors > 0 {
            line.push_str(&format!("  ({} skipped)", format_count(p.traversal_errors)));
        }
        if let Some(msg) = &p.error_message {
            line.push_str("  ");
            line.push_str(msg);
        }
        eprintln!("{line}");
    }
    for volume in &report.skipped {
        eprintln!(
            "{:<14} {:<9} ({} volume not scanned)",
            volume.id.as_str(),
            "Skipped",
            volume.kind.label()
        );
    }
    eprintln!(
        "{} matches on {} volumes ({} completed, {} failed) in {}{}",
        format_count(report.matches.len() as u64),
        report.results.len(),
        report.completed_count(),
        report.failed_count(),
        format_elapsed(report.elapsed),
        report
            .backend
            .map(|b| format!(" using {} x{}", b.label(), report.throttle))
            .unwrap_or_default()
    );
}
