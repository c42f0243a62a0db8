use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::error::{ScriptError, ScriptResult};
use crate::ports::ResultSink;

#[derive(Debug, Serialize)]
struct OutputPayload<'a> {
    key: &'a str,
    value: &'a str,
}

/// Posts each output as `{"key": .., "value": ..}` to a webhook
pub struct WebhookSink {
    client: Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> ScriptResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ResultSink for WebhookSink {
    async fn add_output(&self, key: &str, value: &str) -> ScriptResult<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&OutputPayload { key, value })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ScriptError::Backend(format!(
                "webhook rejected output '{}': {}",
                key,
                response.status()
            )));
        }

        info!("Posted output '{}' to {}", key, self.url);
        Ok(())
    }
}
