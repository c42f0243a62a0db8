mod file;
mod stdout;
mod webhook;

use std::sync::Arc;

pub use file::FileSink;
pub use stdout::StdoutSink;
pub use webhook::WebhookSink;

use crate::config::OutputTarget;
use crate::error::ScriptResult;
use crate::ports::ResultSink;

/// Build the sink for a configured output target
pub fn from_target(target: &OutputTarget) -> ScriptResult<Arc<dyn ResultSink>> {
    let sink: Arc<dyn ResultSink> = match target {
        OutputTarget::Stdout => Arc::new(StdoutSink),
        OutputTarget::Directory(dir) => Arc::new(FileSink::new(dir.clone())),
        OutputTarget::Webhook(url) => Arc::new(WebhookSink::new(url.clone())?),
    };
    Ok(sink)
}
