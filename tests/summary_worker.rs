// tests/summary_worker.rs
use std::sync::Arc;

use news_digest::format::Block;
use news_digest::notify::RecordingSink;
use news_digest::publish::{DailyWorker, PublishContext, RunOutcome, SummaryWorker};
use news_digest::repository::{ItemRepository, MemoryItemRepository};
use news_digest::secrets::StaticSecretStore;
use news_digest::{Category, Item, PipelineError};

const HOOK_PARAM: &str = "/slack/summary-url";

fn item(id: &str, category: Category, daily: bool, summary: bool) -> Item {
    let mut it = Item::new(format!("title {id}"), "body", category);
    it.id = id.to_string();
    it.published_in_daily = daily;
    it.published_in_summary = summary;
    it
}

fn ctx(repo: Arc<MemoryItemRepository>, sink: Arc<RecordingSink>) -> PublishContext {
    let secrets = StaticSecretStore::new().with(HOOK_PARAM, "https://hooks.slack.test/summary");
    PublishContext::new(repo, Arc::new(secrets), sink, HOOK_PARAM)
}

fn assert_invariants(items: &[Item]) {
    for it in items {
        assert!(
            !it.published_in_summary || it.published_in_daily,
            "summary without daily: {}",
            it.id
        );
    }
}

#[tokio::test]
async fn publishes_only_daily_published_items_and_marks_summary() {
    let repo = Arc::new(MemoryItemRepository::with_items([
        item("fresh", Category::New, false, false),
        item("a1", Category::Article, true, false),
        item("t1", Category::Training, true, false),
        item("old", Category::Article, true, true),
    ]));
    let sink = Arc::new(RecordingSink::new());

    for it in repo.select_summary_pending().await.unwrap() {
        assert!(it.published_in_daily);
    }

    let out = SummaryWorker::new(ctx(repo.clone(), sink.clone())).run().await.unwrap();
    assert_eq!(out, RunOutcome::Published { count: 2 });

    let payload = &sink.payloads()[0];
    let header_texts: Vec<&str> = payload
        .blocks
        .iter()
        .filter(|b| matches!(b, Block::Header { .. }))
        .filter_map(|b| b.text())
        .collect();
    assert_eq!(header_texts, vec![":blue_book: Articles", ":books: Training courses"]);
    assert_eq!(payload.item_block_count(), 2);

    assert!(repo.get("a1").unwrap().published_in_summary);
    assert!(repo.get("t1").unwrap().published_in_summary);
    assert!(!repo.get("fresh").unwrap().published_in_summary);
    assert!(!repo.get("fresh").unwrap().published_in_daily);
    assert!(repo.select_summary_pending().await.unwrap().is_empty());
    assert_invariants(&repo.snapshot());
}

#[tokio::test]
async fn failed_delivery_leaves_summary_flags_alone() {
    let repo = Arc::new(MemoryItemRepository::with_items([item("a1", Category::Article, true, false)]));
    let sink = Arc::new(RecordingSink::failing("timeout"));

    let err = SummaryWorker::new(ctx(repo.clone(), sink)).run().await.unwrap_err();
    assert!(matches!(err, PipelineError::Delivery(_)));
    assert_eq!(repo.save_calls(), 0);
    assert!(!repo.get("a1").unwrap().published_in_summary);
}

#[tokio::test]
async fn nothing_pending_is_quiet_success() {
    let repo = Arc::new(MemoryItemRepository::with_items([item("fresh", Category::New, false, false)]));
    let sink = Arc::new(RecordingSink::new());
    let out = SummaryWorker::new(ctx(repo, sink.clone())).run().await.unwrap();
    assert_eq!(out, RunOutcome::NothingToPublish);
    assert!(sink.payloads().is_empty());
}

#[tokio::test]
async fn daily_then_summary_walks_the_lifecycle() {
    let repo = Arc::new(MemoryItemRepository::with_items([
        item("n1", Category::New, false, false),
        item("f1", Category::Feature, false, false),
    ]));
    let sink = Arc::new(RecordingSink::new());

    // summary first: nothing is daily-published yet
    let summary = SummaryWorker::new(ctx(repo.clone(), sink.clone()));
    assert_eq!(summary.run().await.unwrap(), RunOutcome::NothingToPublish);

    let daily = DailyWorker::new(ctx(repo.clone(), sink.clone()), 10).unwrap();
    assert_eq!(daily.run().await.unwrap(), RunOutcome::Published { count: 2 });
    assert_invariants(&repo.snapshot());

    assert_eq!(summary.run().await.unwrap(), RunOutcome::Published { count: 2 });
    for it in repo.snapshot() {
        assert!(it.published_in_daily && it.published_in_summary);
    }

    // a second round publishes nothing and clears no flag
    assert_eq!(daily.run().await.unwrap(), RunOutcome::NothingToPublish);
    assert_eq!(summary.run().await.unwrap(), RunOutcome::NothingToPublish);
    for it in repo.snapshot() {
        assert!(it.published_in_daily && it.published_in_summary);
    }
    assert_eq!(sink.payloads().len(), 2);
}
