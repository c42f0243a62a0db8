mod elements;
mod format;
mod trends;

use std::path::Path;
use std::sync::Arc;

pub use elements::SnapshotElementSource;
pub use format::{ElementSnapshot, Snapshot, SnapshotError, TrendSnapshot};
pub use trends::SnapshotTrendSource;

use crate::domain::ElementId;
use crate::error::{ScriptError, ScriptResult};

/// Monitoring platform backed by a JSON export, serving both elements and trends
#[derive(Debug, Clone)]
pub struct SnapshotPlatform {
    snapshot: Arc<Snapshot>,
}

impl SnapshotPlatform {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        Ok(Self::new(Snapshot::load(path.as_ref())?))
    }

    pub fn element_count(&self) -> usize {
        self.snapshot.elements.len()
    }

    pub fn element_source(&self) -> SnapshotElementSource {
        SnapshotElementSource::new(self.snapshot.clone())
    }

    pub fn trend_source(&self) -> SnapshotTrendSource {
        SnapshotTrendSource::new(self.snapshot.clone())
    }
}

fn find_element<'a>(snapshot: &'a Snapshot, id: &ElementId) -> ScriptResult<&'a ElementSnapshot> {
    snapshot
        .elements
        .iter()
        .find(|e| e.id() == *id)
        .ok_or_else(|| ScriptError::Data(format!("unknown element {}", id)))
}
