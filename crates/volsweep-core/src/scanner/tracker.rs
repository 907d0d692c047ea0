/// Progress tracker: one independently locked slot per volume.
///
/// The key set is fixed when the tracker is built, so the map itself is never
/// written after construction and needs no lock. Each slot has its own
/// `RwLock`: the owning worker takes short write locks at its progress
/// interval, the monitor takes read locks to snapshot. Workers on different
/// volumes never touch the same lock.
///
/// Slots enforce the lifecycle: transitions only move forward, `percent`
/// never decreases, and a terminal slot ignores every later write.
use crate::model::{ProgressEntry, ProgressUpdate, ScanProgress, ScanStatus, Volume, VolumeId};
use chrono::Local;
use parking_lot::RwLock;
use std::collections::HashMap;

pub struct ProgressSlot {
    volume: VolumeId,
    state: RwLock<ScanProgress>,
}

impl ProgressSlot {
    fn new(volume: VolumeId) -> Self {
        Self {
            volume,
            state: RwLock::new(ScanProgress::pending()),
        }
    }

    pub fn volume(&self) -> &VolumeId {
        &self.volume
    }

    /// `Pending → Running`. Returns `false` if the slot was not pending.
    pub fn begin(&self) -> bool {
        let mut state = self.state.write();
        if state.status != ScanStatus::Pending {
            return false;
        }
        state.status = ScanStatus::Running;
        state.start_time = Local::now();
        true
    }

    /// Publish running counters. Ignored unless the slot is running.
    pub fn advance(&self, update: ProgressUpdate) -> bool {
        let mut state = self.state.write();
        if state.status != ScanStatus::Running {
            return false;
        }
        state.percent = state.percent.max(update.percent.min(100));
        state.match_count = update.match_count;
        state.entries_processed = update.entries_processed;
        state.traversal_errors = update.traversal_errors;
        state.current_path = update.current_path;
        true
    }

    /// `Running → Completed` with percent forced to 100.
    pub fn complete(&self) -> bool {
        let mut state = self.state.write();
        if state.status != ScanStatus::Running {
            return false;
        }
        state.status = ScanStatus::Completed;
        state.percent = 100;
        state.end_time = Some(Local::now());
        true
    }

    /// Any non-terminal state `→ Failed`. Match count is reset because a
    /// failed volume contributes no matches.
    pub fn fail(&self, message: impl Into<String>) -> bool {
        let mut state = self.state.write();
        if state.status.is_terminal() {
            return false;
        }
        state.status = ScanStatus::Failed;
        state.match_count = 0;
        state.error_message = Some(message.into());
        state.end_time = Some(Local::now());
        true
    }

    pub fn snapshot(&self) -> ScanProgress {
        self.state.read().clone()
    }

    pub fn status(&self) -> ScanStatus {
        self.state.read().status
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }
}

pub struct ProgressTracker {
    slots: Vec<ProgressSlot>,
    index: HashMap<VolumeId, usize>,
}

impl ProgressTracker {
    /// One pending slot per volume, in the given order. Duplicate ids keep
    /// their first slot.
    pub fn new(volumes: &[Volume]) -> Self {
        let mut slots = Vec::with_capacity(volumes.len());
        let mut index = HashMap::with_capacity(volumes.len());
        for volume in volumes {
            if index.contains_key(&volume.id) {
                continue;
            }
            index.insert(volume.id.clone(), slots.len());
            slots.push(ProgressSlot::new(volume.id.clone()));
        }
        Self { slots, index }
    }

    pub fn slot(&self, volume: &VolumeId) -> Option<&ProgressSlot> {
        self.index.get(volume).map(|&i| &self.slots[i])
    }

    /// Latest progress of every volume, in enumeration order.
    ///
    /// Slots are read one at a time, so the snapshot is not a consistent cut
    /// across volumes; each row is the latest value of its own slot.
    pub fn snapshot(&self) -> Vec<ProgressEntry> {
        self.slots
            .iter()
            .map(|slot| ProgressEntry {
                volume: slot.volume.clone(),
                progress: slot.snapshot(),
            })
            .collect()
    }

    pub fn all_terminal(&self) -> bool {
        self.slots.iter().all(ProgressSlot::is_terminal)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
