/// Result aggregator: one independently locked match list per volume.
///
/// Same ownership discipline as the progress tracker: the key set is fixed at
/// construction, each list is appended to only by its own worker, and the
/// orchestrator drains everything once, after every volume is terminal.
use crate::model::{MatchRecord, Volume, VolumeId};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

pub struct ResultAggregator {
    slots: Vec<(VolumeId, Mutex<Vec<MatchRecord>>)>,
    index: HashMap<VolumeId, usize>,
}

impl ResultAggregator {
    pub fn new(volumes: &[Volume]) -> Self {
        let mut slots = Vec::with_capacity(volumes.len());
        let mut index = HashMap::with_capacity(volumes.len());
        for volume in volumes {
            if index.contains_key(&volume.id) {
                continue;
            }
            index.insert(volume.id.clone(), slots.len());
            slots.push((volume.id.clone(), Mutex::new(Vec::new())));
        }
        Self { slots, index }
    }

    /// Move a batch onto the end of `volume`'s list, preserving its order.
    /// Returns `false` (and leaves `batch` untouched) for an unknown volume.
    pub fn append(&self, volume: &VolumeId, batch: &mut Vec<MatchRecord>) -> bool {
        match self.index.get(volume) {
            Some(&i) => {
                self.slots[i].1.lock().append(batch);
                true
            }
            None => false,
        }
    }

    /// Drop everything recorded for `volume`.
    pub fn discard(&self, volume: &VolumeId) {
        if let Some(&i) = self.index.get(volume) {
            self.slots[i].1.lock().clear();
        }
    }

    pub fn count(&self, volume: &VolumeId) -> usize {
        self.index
            .get(volume)
            .map(|&i| self.slots[i].1.lock().len())
            .unwrap_or(0)
    }

    /// Take every list, in enumeration order. Leaves the aggregator empty.
    pub fn drain(&self) -> Vec<(VolumeId, Vec<MatchRecord>)> {
        self.slots
            .iter()
            .map(|(id, list)| (id.clone(), std::mem::take(&mut *list.lock())))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Concatenate per-volume lists in the order given, keeping the first
/// occurrence of any path seen more than once.
pub fn merge<'a, I>(lists: I) -> Vec<MatchRecord>
where
    I: IntoIterator<Item = &'a [MatchRecord]>,
{
    let mut seen: HashSet<&'a PathBuf> = HashSet::new();
    let mut merged = Vec::new();
    for list in lists {
        for record in list {
            if seen.insert(&record.path) {
                merged.push(record.clone());
            }
        }
    }
    merged
}
