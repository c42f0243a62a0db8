use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{ProcessKey, TrendQuery, TrendResponse, TrendSeries};
use crate::error::ScriptResult;
use crate::ports::TrendSource;

use super::{find_element, Snapshot, TrendSnapshot};

/// Trend source answering queries from the records stored in a platform export
pub struct SnapshotTrendSource {
    snapshot: Arc<Snapshot>,
}

impl SnapshotTrendSource {
    pub fn new(snapshot: Arc<Snapshot>) -> Self {
        Self { snapshot }
    }
}

fn matches_index(trend: &TrendSnapshot, parameter_id: i32, index: &str) -> bool {
    let mut parts = trend.key.splitn(2, '/');
    let parameter = parts.next().and_then(|p| p.parse::<i32>().ok());
    let stored_index = parts.next();

    parameter == Some(parameter_id)
        && stored_index.is_some_and(|i| ProcessKey::new(i) == ProcessKey::new(index))
}

#[async_trait]
impl TrendSource for SnapshotTrendSource {
    async fn get_trend_data(&self, query: &TrendQuery) -> ScriptResult<TrendResponse> {
        let element = find_element(&self.snapshot, &query.element)?;
        let mut returned = HashSet::new();
        let mut series = Vec::new();

        // Index lookup is case-insensitive, so one stored series can answer
        // several requested indices; it is returned once.
        for index in &query.indices {
            for trend in element
                .trends
                .iter()
                .filter(|t| matches_index(t, query.parameter_id, index))
            {
                if !returned.insert(trend.key.as_str()) {
                    continue;
                }

                let records = trend
                    .records
                    .iter()
                    .filter(|r| query.window.contains(r.time()))
                    .cloned()
                    .collect();
                series.push(TrendSeries::new(trend.key.clone(), records));
            }
        }

        Ok(TrendResponse::new(series))
    }
}
