pub mod sink;
pub mod snapshot;

pub use snapshot::SnapshotPlatform;
