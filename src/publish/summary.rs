// src/publish/summary.rs
use super::{commit_all, record_run_started, DigestKind, PublishContext, RunOutcome};
use crate::error::Result;
use crate::format::{build_summary_message, group_by_category, Payload};
use crate::item::Item;

/// Publishes every daily-published item not yet in a summary, grouped by
/// category. No cap.
pub struct SummaryWorker {
    ctx: PublishContext,
}

impl SummaryWorker {
    pub fn new(ctx: PublishContext) -> Self {
        Self { ctx }
    }

    /// Selection and formatting only; nothing is sent or written.
    pub async fn prepare(&self) -> Result<Option<(Vec<Item>, Payload)>> {
        let items = self.ctx.repo.select_summary_pending().await?;
        if items.is_empty() {
            tracing::info!(target: "publish", digest = "summary", "no items to publish");
            return Ok(None);
        }

        let grouped = group_by_category(items);
        let payload = build_summary_message(&grouped);
        let items = grouped.into_values().flatten().collect();
        Ok(Some((items, payload)))
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        record_run_started(DigestKind::Summary);
        let webhook = self.ctx.resolve_webhook().await?;

        let Some((items, payload)) = self.prepare().await? else {
            return Ok(RunOutcome::NothingToPublish);
        };

        self.ctx.deliver(DigestKind::Summary, &webhook, &payload).await?;

        Ok(commit_all(
            self.ctx.repo.as_ref(),
            DigestKind::Summary,
            items,
            Item::mark_summary_published,
        )
        .await)
    }
}
