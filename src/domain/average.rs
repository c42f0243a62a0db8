use std::collections::HashMap;

use crate::error::{ScriptError, ScriptResult};

use super::TrendResponse;

/// Case-insensitive process key (uppercased name)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcessKey(String);

impl ProcessKey {
    /// Uppercases char by char. A char whose uppercase form is more than
    /// one char (`ß`) is kept as is, so the key has as many chars as the name.
    pub fn new(process_name: &str) -> Self {
        Self(process_name.chars().map(simple_uppercase).collect())
    }
}

fn simple_uppercase(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

impl From<&str> for ProcessKey {
    fn from(process_name: &str) -> Self {
        Self::new(process_name)
    }
}

/// Average VM size (KB) per process for one host and one window.
///
/// Holds at most one value per key: the first value recorded for a key
/// stays, later ones are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessAverages {
    values: HashMap<ProcessKey, f64>,
}

impl ProcessAverages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value unless the key already has one. Returns whether it was kept.
    pub fn insert_first(&mut self, key: ProcessKey, average: f64) -> bool {
        if self.values.contains_key(&key) {
            return false;
        }
        self.values.insert(key, average);
        true
    }

    /// Fold the average records of a trend response into this mapping
    pub fn absorb(&mut self, response: &TrendResponse) -> ScriptResult<()> {
        for series in &response.series {
            let Some(records) = &series.records else {
                continue;
            };

            for average in records.iter().filter_map(|r| r.average_value()) {
                let index = series.index().ok_or_else(|| {
                    ScriptError::Data(format!("trend key without index: {}", series.key))
                })?;
                self.insert_first(ProcessKey::new(index), average);
            }
        }

        Ok(())
    }

    pub fn get(&self, key: &ProcessKey) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
