use async_trait::async_trait;

use crate::domain::{TrendQuery, TrendResponse};
use crate::error::ScriptResult;

/// Port for the historical trend store
#[async_trait]
pub trait TrendSource: Send + Sync {
    /// Run one batched trend query, returning once data for all indices is in
    async fn get_trend_data(&self, query: &TrendQuery) -> ScriptResult<TrendResponse>;
}
