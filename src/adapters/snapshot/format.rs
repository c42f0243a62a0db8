use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::{ElementId, ElementState, TableRow, TrendRecord};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate element: {0}")]
    DuplicateElement(ElementId),
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Export of the monitoring platform: elements with their live data and trends
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub elements: Vec<ElementSnapshot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElementSnapshot {
    pub agent_id: i32,
    pub element_id: i32,
    pub name: String,
    pub protocol: String,
    pub state: ElementState,
    /// Standalone parameters by id
    #[serde(default)]
    pub parameters: BTreeMap<i32, String>,
    /// Table rows by table id
    #[serde(default)]
    pub tables: BTreeMap<i32, Vec<TableRow>>,
    /// Trend records by `<parameter>/<index>` key, in export order
    #[serde(default)]
    pub trends: Vec<TrendSnapshot>,
}

impl ElementSnapshot {
    pub fn id(&self) -> ElementId {
        ElementId::new(self.agent_id, self.element_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrendSnapshot {
    pub key: String,
    #[serde(default)]
    pub records: Vec<TrendRecord>,
}

impl Snapshot {
    pub fn from_json(content: &str) -> SnapshotResult<Self> {
        let snapshot: Snapshot = serde_json::from_str(content)?;
        snapshot.check_unique_ids()?;
        Ok(snapshot)
    }

    pub fn load(path: &Path) -> SnapshotResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    fn check_unique_ids(&self) -> SnapshotResult<()> {
        let mut seen = std::collections::HashSet::new();
        for element in &self.elements {
            if !seen.insert(element.id()) {
                return Err(SnapshotError::DuplicateElement(element.id()));
            }
        }
        Ok(())
    }
}
