// src/notify/mod.rs
pub mod slack;

use crate::error::Result;
use crate::format::Payload;

pub use slack::SlackWebhook;

/// Outbound channel for a finished digest payload.
///
/// One call is one delivery attempt; implementations do not retry.
#[async_trait::async_trait]
pub trait DigestSink: Send + Sync {
    async fn deliver(&self, webhook_url: &str, payload: &Payload) -> Result<()>;
}

// --- Test helper ---
/// Sink that records every payload instead of sending it.
pub struct RecordingSink {
    pub calls: std::sync::Mutex<Vec<(String, Payload)>>,
    fail_with: Option<String>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            calls: std::sync::Mutex::new(vec![]),
            fail_with: None,
        }
    }

    /// Every delivery fails with a `Delivery` error carrying `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            calls: std::sync::Mutex::new(vec![]),
            fail_with: Some(reason.into()),
        }
    }

    pub fn payloads(&self) -> Vec<Payload> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .iter()
            .map(|(_, p)| p.clone())
            .collect()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DigestSink for RecordingSink {
    async fn deliver(&self, webhook_url: &str, payload: &Payload) -> Result<()> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push((webhook_url.to_string(), payload.clone()));
        match &self.fail_with {
            Some(reason) => Err(crate::error::PipelineError::delivery(reason.clone())),
            None => Ok(()),
        }
    }
}
