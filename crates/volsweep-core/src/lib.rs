/// VolSweep Core: volume enumeration, concurrent scanning, and result merging.
///
/// This crate contains all business logic with zero console dependencies.
/// Progress display and log output go through the collaborator traits in
/// [`report`], so any frontend (CLI, TUI, tests) can drive a sweep.
///
/// # Modules
///
/// - [`model`]: Volumes, per-volume progress, match records, size formatting.
/// - [`platform`]: Host volume enumeration (Windows API or `sysinfo`).
/// - [`scanner`]: Orchestrator, scan worker, shared tracker/aggregator, backends.
/// - [`report`]: Log, display, and export collaborators.
/// - [`config`]: Tunables loaded from JSON and overridden by the frontend.
pub mod config;
pub mod error;
pub mod model;
pub mod platform;
pub mod report;
pub mod scanner;

pub use config::SweepConfig;
pub use error::{Result, SweepError};
