/// Volume enumeration.
///
/// On Windows the drive list comes straight from the Win32 API (drive
/// letters, drive type, label, filesystem, capacity). Everywhere else it
/// comes from `sysinfo`'s disk list, classified by filesystem name.
///
/// Enumeration never fails: an unusable platform answer yields an empty list,
/// which the orchestrator reports as a warning.
use crate::model::{Volume, VolumeKind};
#[cfg(not(windows))]
use crate::model::VolumeId;
use std::path::PathBuf;

/// Source of the volumes a sweep runs over.
pub trait VolumeSource: Send + Sync {
    /// Ordered list of candidate volumes, stable for the run.
    fn volumes(&self) -> Vec<Volume>;
}

/// The volumes mounted on this host.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostVolumes;

impl VolumeSource for HostVolumes {
    fn volumes(&self) -> Vec<Volume> {
        enumerate_volumes()
    }
}

/// A fixed volume list: ad-hoc roots given on the command line, or tests.
#[derive(Debug, Default, Clone)]
pub struct StaticVolumes(pub Vec<Volume>);

impl StaticVolumes {
    /// One local volume per directory, in the given order.
    pub fn from_roots<I>(roots: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        Self(roots.into_iter().map(Volume::from_root).collect())
    }
}

impl VolumeSource for StaticVolumes {
    fn volumes(&self) -> Vec<Volume> {
        self.0.clone()
    }
}

/// Classify a mount by filesystem name and removability.
pub fn classify(filesystem: &str, removable: bool) -> VolumeKind {
    let fs = filesystem.to_ascii_lowercase();
    if fs.starts_with("nfs")
        || fs.starts_with("smb")
        || fs == "cifs"
        || fs == "fuse.sshfs"
        || fs == "sshfs"
        || fs == "9p"
        || fs == "afpfs"
        || fs == "webdav"
    {
        VolumeKind::Network
    } else if fs == "iso9660" || fs == "udf" || fs == "cd9660" || fs == "cdfs" {
        VolumeKind::Optical
    } else if removable {
        VolumeKind::Removable
    } else {
        VolumeKind::Local
    }
}

/// Enumerate all drives on the system, in drive-letter order.
///
/// Every drive type is returned, optical and network included; the
/// orchestrator decides what gets scanned.
#[cfg(windows)]
pub fn enumerate_volumes() -> Vec<Volume> {
    use crate::model::VolumeId;
    use std::ffi::OsString;
    use std::os::windows::ffi::OsStringExt;
    use windows::Win32::Storage::FileSystem::{
        GetDiskFreeSpaceExW, GetDriveTypeW, GetLogicalDriveStringsW, GetVolumeInformationW,
    };

    // Drive type constants from the Windows API.
    const DRIVE_REMOVABLE_VAL: u32 = 2;
    const DRIVE_FIXED_VAL: u32 = 3;
    const DRIVE_REMOTE_VAL: u32 = 4;
    const DRIVE_CDROM_VAL: u32 = 5;

    let mut volumes = Vec::new();

    // GetLogicalDriveStringsW returns null-separated drive root strings.
    let mut buffer = [0u16; 256];
    let len = unsafe { GetLogicalDriveStringsW(Some(&mut buffer)) };
    if len == 0 {
        tracing::warn!("GetLogicalDriveStringsW returned 0");
        return volumes;
    }

    let full = OsString::from_wide(&buffer[..len as usize]);
    let full_str = full.to_string_lossy();

    for root in full_str.split('\0').filter(|s| !s.is_empty()) {
        let root_wide: Vec<u16> = root.encode_utf16().chain(std::iter::once(0)).collect();
        let root_pcwstr = windows::core::PCWSTR(root_wide.as_ptr());

        let kind = match unsafe { GetDriveTypeW(root_pcwstr) } {
            DRIVE_FIXED_VAL => VolumeKind::Local,
            DRIVE_REMOVABLE_VAL => VolumeKind::Removable,
            DRIVE_REMOTE_VAL => VolumeKind::Network,
            DRIVE_CDROM_VAL => VolumeKind::Optical,
            _ => VolumeKind::Unknown,
        };

        // A drive with no media still gets listed; its worker fails on open.
        let mut label_buf = [0u16; 256];
        let mut fs_buf = [0u16; 256];
        let has_volume_info = unsafe {
            GetVolumeInformationW(
                root_pcwstr,
                Some(&mut label_buf),
                None,
                None,
                None,
                Some(&mut fs_buf),
            )
            .is_ok()
        };
        let (label, filesystem) = if has_volume_info {
            (wide_to_string(&label_buf), wide_to_string(&fs_buf))
        } else {
            (String::new(), String::new())
        };

        let mut free_caller: u64 = 0;
        let mut total: u64 = 0;
        let mut free_total: u64 = 0;
        let has_space = unsafe {
            GetDiskFreeSpaceExW(
                root_pcwstr,
                Some(&mut free_caller as *mut u64),
                Some(&mut total as *mut u64),
                Some(&mut free_total as *mut u64),
            )
            .is_ok()
        };
        let (total_bytes, free_bytes) = if has_space {
            (total, free_caller)
        } else {
            (0, 0)
        };

        volumes.push(Volume {
            id: VolumeId::new(root.trim_end_matches('\\')),
            root: PathBuf::from(root),
            kind,
            label,
            filesystem,
            total_bytes,
            free_bytes,
        });
    }

    volumes
}

#[cfg(windows)]
fn wide_to_string(buf: &[u16]) -> String {
    let end = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..end])
}

/// Enumerate mounted filesystems via `sysinfo`, in the order the OS lists them.
///
/// Pseudo filesystems never show up in `sysinfo`'s disk list. A mount point
/// listed twice (bind mounts, stacked mounts) is kept once.
#[cfg(not(windows))]
pub fn enumerate_volumes() -> Vec<Volume> {
    use std::collections::HashSet;
    use sysinfo::Disks;

    let disks = Disks::new_with_refreshed_list();
    let mut seen: HashSet<PathBuf> = HashSet::new();
    let mut volumes = Vec::new();

    for disk in disks.list() {
        let root = disk.mount_point().to_path_buf();
        if !seen.insert(root.clone()) {
            continue;
        }
        let filesystem = disk.file_system().to_string_lossy().into_owned();
        volumes.push(Volume {
            id: VolumeId::new(root.to_string_lossy().into_owned()),
            kind: classify(&filesystem, disk.is_removable()),
            label: disk.name().to_string_lossy().into_owned(),
            filesystem,
            total_bytes: disk.total_space(),
            free_bytes: disk.available_space(),
            root,
        });
    }

    if volumes.is_empty() {
        tracing::warn!("sysinfo reported no mounted disks");
    }
    volumes
}
