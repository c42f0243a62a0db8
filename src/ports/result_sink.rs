use async_trait::async_trait;

use crate::error::ScriptResult;

/// Port for publishing the named script output
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn add_output(&self, key: &str, value: &str) -> ScriptResult<()>;
}
