/// Platform-specific functionality: host volume enumeration and the
/// `VolumeSource` seam the orchestrator enumerates through.
pub mod volumes;

pub use volumes::{enumerate_volumes, HostVolumes, StaticVolumes, VolumeSource};
