use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::ScriptResult;
use crate::ports::ResultSink;

/// Writes the output value to stdout, one line per output
pub struct StdoutSink;

#[async_trait]
impl ResultSink for StdoutSink {
    async fn add_output(&self, _key: &str, value: &str) -> ScriptResult<()> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(value.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
        Ok(())
    }
}
