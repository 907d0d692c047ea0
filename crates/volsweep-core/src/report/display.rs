/// Live progress display seam.
use crate::model::ProgressEntry;

/// Renders tracker snapshots. The orchestrator calls [`render`] once per poll
/// interval with the latest snapshot, which may be slightly stale, and
/// [`finish`] exactly once after every volume is terminal.
///
/// [`render`]: ProgressDisplay::render
/// [`finish`]: ProgressDisplay::finish
pub trait ProgressDisplay {
    fn render(&mut self, snapshot: &[ProgressEntry]);

    fn finish(&mut self, snapshot: &[ProgressEntry]) {
        self.render(snapshot);
    }
}

/// Discards every snapshot.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDisplay;

impl ProgressDisplay for NullDisplay {
    fn render(&mut self, _snapshot: &[ProgressEntry]) {}
}
