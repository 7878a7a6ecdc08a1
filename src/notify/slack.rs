use std::time::Duration;

use reqwest::Client;

use super::DigestSink;
use crate::error::{PipelineError, Result};
use crate::format::Payload;

/// Posts Block Kit payloads to a Slack incoming webhook.
#[derive(Clone)]
pub struct SlackWebhook {
    client: Client,
    timeout: Duration,
}

impl SlackWebhook {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for SlackWebhook {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DigestSink for SlackWebhook {
    async fn deliver(&self, webhook_url: &str, payload: &Payload) -> Result<()> {
        let rsp = self
            .client
            .post(webhook_url)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await?;

        let status = rsp.status();
        if !status.is_success() {
            let body = rsp.text().await.unwrap_or_default();
            return Err(PipelineError::delivery(format!(
                "slack webhook returned {status}: {}",
                body.trim()
            )));
        }
        tracing::debug!(target: "publish", blocks = payload.blocks.len(), "slack webhook accepted payload");
        Ok(())
    }
}
