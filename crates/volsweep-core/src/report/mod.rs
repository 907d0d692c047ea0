/// Output collaborators: per-volume log records, live progress display,
/// and export of the merged match list.
///
/// The core never writes to the console itself; everything observable
/// leaves through these traits.
pub mod display;
pub mod export;
pub mod log;

pub use display::{NullDisplay, ProgressDisplay};
pub use export::{write_matches, ExportFormat};
pub use log::{ScanLog, TracingLog};
