// src/publish/mod.rs
//! Publication workers: select → format → deliver → commit.
//!
//! A run never mutates flags before the webhook accepted the payload. After
//! delivery every selected item is committed independently; a failed save is
//! logged with the item id and the run reports partial success instead of
//! stopping (at-least-once: an uncommitted item is re-sent next run).

pub mod daily;
pub mod summary;

use std::sync::Arc;

use metrics::{counter, gauge};

use crate::error::{PipelineError, Result};
use crate::format::Payload;
use crate::item::Item;
use crate::metrics::{
    ensure_metrics_described, COMMIT_FAILURES_TOTAL, DELIVERY_FAILURES_TOTAL,
    ITEMS_PUBLISHED_TOTAL, LAST_RUN_TS, RUNS_TOTAL,
};
use crate::notify::DigestSink;
use crate::repository::ItemRepository;
use crate::secrets::SecretStore;

pub use daily::DailyWorker;
pub use summary::SummaryWorker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestKind {
    Daily,
    Summary,
}

impl DigestKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DigestKind::Daily => "daily",
            DigestKind::Summary => "summary",
        }
    }
}

/// Result of a run that got past selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing was pending; no delivery, no writes.
    NothingToPublish,
    /// Payload delivered and every item committed.
    Published { count: usize },
    /// Payload delivered but some commits failed; those items stay pending
    /// and will be sent again by the next run.
    PartiallyCommitted {
        committed: usize,
        failed_ids: Vec<String>,
    },
}

impl RunOutcome {
    pub fn is_complete(&self) -> bool {
        !matches!(self, RunOutcome::PartiallyCommitted { .. })
    }
}

/// Collaborators of one worker; the webhook parameter picks its channel.
#[derive(Clone)]
pub struct PublishContext {
    pub repo: Arc<dyn ItemRepository>,
    pub secrets: Arc<dyn SecretStore>,
    pub sink: Arc<dyn DigestSink>,
    /// Name of the secret parameter holding the webhook URL.
    pub webhook_parameter: String,
}

impl PublishContext {
    pub fn new(
        repo: Arc<dyn ItemRepository>,
        secrets: Arc<dyn SecretStore>,
        sink: Arc<dyn DigestSink>,
        webhook_parameter: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            secrets,
            sink,
            webhook_parameter: webhook_parameter.into(),
        }
    }

    async fn resolve_webhook(&self) -> Result<String> {
        self.secrets.get_parameter(&self.webhook_parameter).await
    }

    async fn deliver(&self, kind: DigestKind, webhook_url: &str, payload: &Payload) -> Result<()> {
        if let Err(e) = self.sink.deliver(webhook_url, payload).await {
            counter!(DELIVERY_FAILURES_TOTAL, "digest" => kind.as_str()).increment(1);
            tracing::error!(
                target: "publish",
                digest = kind.as_str(),
                error = %e,
                "delivery failed, no status changed"
            );
            return Err(match e {
                PipelineError::Delivery(_) => e,
                other => PipelineError::delivery(other.to_string()),
            });
        }
        Ok(())
    }
}

fn record_run_started(kind: DigestKind) {
    ensure_metrics_described();
    counter!(RUNS_TOTAL, "digest" => kind.as_str()).increment(1);
}

/// Flip the digest flag on every item and save each one independently.
async fn commit_all<F>(
    repo: &dyn ItemRepository,
    kind: DigestKind,
    items: Vec<Item>,
    mark: F,
) -> RunOutcome
where
    F: Fn(&mut Item) -> Result<()>,
{
    let mut committed = 0usize;
    let mut failed_ids = Vec::new();

    for mut item in items {
        let res = match mark(&mut item) {
            Ok(()) => repo.save(&item).await,
            Err(e) => Err(e),
        };
        match res {
            Ok(()) => committed += 1,
            Err(e) => {
                tracing::error!(
                    target: "publish",
                    digest = kind.as_str(),
                    item_id = %item.id,
                    error = %e,
                    "status commit failed after delivery"
                );
                failed_ids.push(item.id);
            }
        }
    }

    counter!(ITEMS_PUBLISHED_TOTAL, "digest" => kind.as_str()).increment(committed as u64);
    counter!(COMMIT_FAILURES_TOTAL, "digest" => kind.as_str()).increment(failed_ids.len() as u64);
    gauge!(LAST_RUN_TS, "digest" => kind.as_str()).set(chrono::Utc::now().timestamp() as f64);

    if failed_ids.is_empty() {
        tracing::info!(
            target: "publish",
            digest = kind.as_str(),
            count = committed,
            "items successfully sent to Slack"
        );
        RunOutcome::Published { count: committed }
    } else {
        tracing::warn!(
            target: "publish",
            digest = kind.as_str(),
            committed,
            failed = failed_ids.len(),
            "digest delivered but some items could not be marked"
        );
        RunOutcome::PartiallyCommitted {
            committed,
            failed_ids,
        }
    }
}
