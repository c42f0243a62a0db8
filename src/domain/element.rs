use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of a monitored element (agent + element id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId {
    pub agent_id: i32,
    pub element_id: i32,
}

impl ElementId {
    pub fn new(agent_id: i32, element_id: i32) -> Self {
        Self {
            agent_id,
            element_id,
        }
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.agent_id, self.element_id)
    }
}

/// Element state as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementState {
    Active,
    Hidden,
    Paused,
    Stopped,
    Deleted,
    Error,
    Restart,
    Masked,
    Undefined,
}

/// Monitored element (one host)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub name: String,
    pub protocol: String,
    pub state: ElementState,
}

impl Element {
    pub fn new(id: ElementId, name: String, protocol: String, state: ElementState) -> Self {
        Self {
            id,
            name,
            protocol,
            state,
        }
    }
}

/// Platform-type and state filter used to discover hosts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementFilter {
    pub protocol: String,
    pub state: ElementState,
}

impl ElementFilter {
    pub fn active(protocol: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            state: ElementState::Active,
        }
    }

    pub fn matches(&self, element: &Element) -> bool {
        element.protocol == self.protocol && element.state == self.state
    }
}

/// One row of a platform table, cells kept untyped
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableRow(Vec<Value>);

impl TableRow {
    #[cfg(test)]
    pub fn new(cells: Vec<Value>) -> Self {
        Self(cells)
    }

    /// Cell rendered as text. Missing and null cells give an empty string.
    pub fn text(&self, column: usize) -> String {
        match self.0.get(column) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}
