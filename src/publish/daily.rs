// src/publish/daily.rs
use chrono::DateTime;

use super::{commit_all, record_run_started, DigestKind, PublishContext, RunOutcome};
use crate::error::{PipelineError, Result};
use crate::format::{build_daily_message, Payload};
use crate::item::Item;

/// Publishes items that have not been in a daily digest yet, at most
/// `max_items_per_run` per run.
pub struct DailyWorker {
    ctx: PublishContext,
    max_items_per_run: usize,
}

impl DailyWorker {
    pub fn new(ctx: PublishContext, max_items_per_run: usize) -> Result<Self> {
        if max_items_per_run == 0 {
            return Err(PipelineError::config("max items per run must be positive"));
        }
        Ok(Self {
            ctx,
            max_items_per_run,
        })
    }

    /// Selection and formatting only; nothing is sent or written.
    pub async fn prepare(&self) -> Result<Option<(Vec<Item>, Payload)>> {
        let mut items = self.ctx.repo.select_daily_pending().await?;
        if items.is_empty() {
            tracing::info!(target: "publish", digest = "daily", "no info items to publish");
            return Ok(None);
        }

        let pending = items.len();
        select_batch(&mut items, self.max_items_per_run);
        tracing::debug!(
            target: "publish",
            digest = "daily",
            pending,
            selected = items.len(),
            "publishing info items to Slack"
        );

        let payload = build_daily_message(&items);
        Ok(Some((items, payload)))
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        record_run_started(DigestKind::Daily);
        let webhook = self.ctx.resolve_webhook().await?;

        let Some((items, payload)) = self.prepare().await? else {
            return Ok(RunOutcome::NothingToPublish);
        };

        self.ctx.deliver(DigestKind::Daily, &webhook, &payload).await?;

        Ok(commit_all(self.ctx.repo.as_ref(), DigestKind::Daily, items, |it| {
            it.mark_daily_published();
            Ok(())
        })
        .await)
    }
}

/// Oldest first by submission instant (ties by raw date string, then id),
/// then cap at `max`. Dates that are not RFC 3339 sort after all valid ones.
pub fn select_batch(items: &mut Vec<Item>, max: usize) {
    items.sort_by_cached_key(|it| {
        let instant = DateTime::parse_from_rfc3339(&it.submission_date).ok();
        (
            instant.is_none(),
            instant,
            it.submission_date.clone(),
            it.id.clone(),
        )
    });
    items.truncate(max);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Category;

    fn at(id: &str, date: &str) -> Item {
        let mut it = Item::new(id, "c", Category::Misc);
        it.id = id.into();
        it.submission_date = date.into();
        it
    }

    #[test]
    fn batch_takes_oldest_first() {
        let mut items = vec![
            at("c", "2024-03-07T10:00:00.000Z"),
            at("a", "2024-03-05T10:00:00.000Z"),
            at("b", "2024-03-05T10:00:00.000Z"),
            at("d", "2024-03-06T10:00:00.000Z"),
        ];
        select_batch(&mut items, 3);
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "d"]);
    }

    #[test]
    fn batch_orders_by_instant_across_date_shapes() {
        let mut items = vec![
            at("late", "2024-03-05T10:00:00.500Z"),
            at("offset", "2024-03-05T11:00:00+02:00"),
            at("no-millis", "2024-03-05T10:00:00Z"),
            at("garbage", "yesterday"),
        ];
        select_batch(&mut items, 4);
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["offset", "no-millis", "late", "garbage"]);
    }

    #[test]
    fn batch_under_cap_keeps_everything() {
        let mut items = vec![at("a", "2024-03-05T10:00:00.000Z")];
        select_batch(&mut items, 10);
        assert_eq!(items.len(), 1);
    }
}
