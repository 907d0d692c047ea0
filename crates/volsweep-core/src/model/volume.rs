/// Volume description shared by the enumerator, the workers and the display.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Platform device identifier: a drive letter (`C:`) on Windows, the mount
/// point elsewhere, or the literal path for ad-hoc roots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct VolumeId(String);

impl VolumeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VolumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Volume type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VolumeKind {
    Local,
    Removable,
    Network,
    Optical,
    Unknown,
}

impl VolumeKind {
    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Local => "Local",
            Self::Removable => "Removable",
            Self::Network => "Network",
            Self::Optical => "Optical",
            Self::Unknown => "Unknown",
        }
    }

    /// Optical media are reported but never scanned.
    pub fn is_scannable(self) -> bool {
        self != Self::Optical
    }
}

/// A storage volume, enumerated once per run and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Volume {
    pub id: VolumeId,
    /// Directory the scan starts from, e.g. `C:\` or `/home`.
    pub root: PathBuf,
    pub kind: VolumeKind,
    /// Volume label; empty when the platform reports none.
    pub label: String,
    /// Filesystem name (e.g. "NTFS", "ext4").
    pub filesystem: String,
    /// Total capacity in bytes (0 when unknown).
    pub total_bytes: u64,
    /// Free space in bytes.
    pub free_bytes: u64,
}

impl Volume {
    /// An ad-hoc volume rooted at an arbitrary directory, capacity unknown.
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            id: VolumeId::new(root.to_string_lossy().into_owned()),
            root,
            kind: VolumeKind::Local,
            label: String::new(),
            filesystem: String::new(),
            total_bytes: 0,
            free_bytes: 0,
        }
    }

    pub fn with_kind(mut self, kind: VolumeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn used_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.free_bytes)
    }
}
