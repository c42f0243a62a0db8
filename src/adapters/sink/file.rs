use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use crate::error::ScriptResult;
use crate::ports::ResultSink;

/// Writes each output to `<dir>/<key>.json`
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl ResultSink for FileSink {
    async fn add_output(&self, key: &str, value: &str) -> ScriptResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(key);
        tokio::fs::write(&path, value).await?;
        info!("Wrote output '{}' to {}", key, path.display());
        Ok(())
    }
}
