use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Element, ElementFilter, ElementId, TableRow};
use crate::error::{ScriptError, ScriptResult};
use crate::ports::ElementSource;

use super::{find_element, Snapshot};

/// Element source reading from a platform export
pub struct SnapshotElementSource {
    snapshot: Arc<Snapshot>,
}

impl SnapshotElementSource {
    pub fn new(snapshot: Arc<Snapshot>) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl ElementSource for SnapshotElementSource {
    async fn list_elements(&self, filter: &ElementFilter) -> ScriptResult<Vec<Element>> {
        Ok(self
            .snapshot
            .elements
            .iter()
            .map(|e| Element::new(e.id(), e.name.clone(), e.protocol.clone(), e.state))
            .filter(|e| filter.matches(e))
            .collect())
    }

    async fn get_string_parameter(&self, element: &ElementId, parameter_id: i32) -> ScriptResult<String> {
        find_element(&self.snapshot, element)?
            .parameters
            .get(&parameter_id)
            .cloned()
            .ok_or_else(|| {
                ScriptError::Data(format!("element {} has no parameter {}", element, parameter_id))
            })
    }

    async fn get_table_rows(&self, element: &ElementId, table_id: i32) -> ScriptResult<Vec<TableRow>> {
        find_element(&self.snapshot, element)?
            .tables
            .get(&table_id)
            .cloned()
            .ok_or_else(|| ScriptError::Data(format!("element {} has no table {}", element, table_id)))
    }
}
