/// Sweep tunables.
///
/// Defaults match the documented behaviour (five concurrent workers, a
/// 500 ms display refresh). A JSON file may override any subset of fields;
/// the frontend then applies its own flags on top.
use crate::error::{Result, SweepError};
use crate::model::VolumeKind;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_MAX_CONCURRENT: usize = 5;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Entries a worker processes between two progress publications.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1_000;

/// Which execution backend runs the scan workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendPreference {
    /// Probe at startup: fan-out when its pool can be built, worker pool otherwise.
    #[default]
    Auto,
    FanOut,
    WorkerPool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Upper bound on concurrently running scan workers.
    pub max_concurrent: usize,
    /// Display refresh cadence, in milliseconds.
    pub poll_interval_ms: u64,
    /// Entries between two progress updates from one worker.
    pub progress_interval: u64,
    pub backend: BackendPreference,
    /// Match file names case-insensitively.
    pub ignore_case: bool,
    /// Volume kinds reported but not scanned, on top of optical media.
    pub exclude_kinds: Vec<VolumeKind>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            backend: BackendPreference::Auto,
            ignore_case: false,
            exclude_kinds: Vec::new(),
        }
    }
}

impl SweepConfig {
    /// Load a JSON config file. Missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| SweepError::Config {
            path: Some(path.to_path_buf()),
            message: e.to_string(),
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| SweepError::Config {
            path: Some(path.to_path_buf()),
            message: e.to_string(),
        })?;
        config.validate().map_err(|err| match err {
            SweepError::Config { message, .. } => SweepError::Config {
                path: Some(path.to_path_buf()),
                message,
            },
            other => other,
        })?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| {
            Err(SweepError::Config {
                path: None,
                message: message.to_string(),
            })
        };
        if self.max_concurrent == 0 {
            return invalid("max_concurrent must be at least 1");
        }
        if self.poll_interval_ms == 0 {
            return invalid("poll_interval_ms must be at least 1");
        }
        if self.progress_interval == 0 {
            return invalid("progress_interval must be at least 1");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Whether volumes of this kind are scanned at all.
    pub fn scans_kind(&self, kind: VolumeKind) -> bool {
        kind.is_scannable() && !self.exclude_kinds.contains(&kind)
    }

    /// Workers allowed to run at once for a sweep over `volume_count` volumes.
    pub fn throttle_for(&self, volume_count: usize) -> usize {
        volume_count.min(self.max_concurrent).max(1)
    }
}
