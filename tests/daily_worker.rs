// tests/daily_worker.rs
use std::sync::Arc;

use news_digest::notify::RecordingSink;
use news_digest::publish::{DailyWorker, PublishContext, RunOutcome};
use news_digest::repository::{ItemRepository, MemoryItemRepository};
use news_digest::secrets::StaticSecretStore;
use news_digest::{Category, Item, PipelineError};

const HOOK_PARAM: &str = "/slack/daily-url";
const HOOK_URL: &str = "https://hooks.slack.test/services/daily";

fn pending(n: usize) -> Vec<Item> {
    (0..n)
        .map(|i| {
            let mut it = Item::new(format!("title {i}"), format!("content {i}"), Category::New);
            it.id = format!("item-{i:02}");
            it.submission_date = format!("2024-03-{:02}T08:00:00.000Z", i + 1);
            it
        })
        .collect()
}

fn worker(repo: Arc<MemoryItemRepository>, sink: Arc<RecordingSink>, max: usize) -> DailyWorker {
    let secrets = StaticSecretStore::new().with(HOOK_PARAM, HOOK_URL);
    let ctx = PublishContext::new(repo, Arc::new(secrets), sink, HOOK_PARAM);
    DailyWorker::new(ctx, max).unwrap()
}

#[tokio::test]
async fn truncates_to_cap_and_commits_exactly_those_items() {
    let repo = Arc::new(MemoryItemRepository::with_items(pending(10)));
    let sink = Arc::new(RecordingSink::new());

    let out = worker(repo.clone(), sink.clone(), 3).run().await.unwrap();
    assert_eq!(out, RunOutcome::Published { count: 3 });

    let payloads = sink.payloads();
    assert_eq!(payloads.len(), 1);
    assert_eq!(payloads[0].blocks.len(), 4);
    assert_eq!(payloads[0].item_block_count(), 3);

    // oldest three were picked
    let published: Vec<String> = {
        let mut v: Vec<String> = repo
            .snapshot()
            .into_iter()
            .filter(|it| it.published_in_daily)
            .map(|it| it.id)
            .collect();
        v.sort();
        v
    };
    assert_eq!(published, vec!["item-00", "item-01", "item-02"]);
    assert_eq!(repo.select_daily_pending().await.unwrap().len(), 7);
    assert_eq!(repo.save_calls(), 3);

    let (url, _) = sink.calls.lock().unwrap()[0].clone();
    assert_eq!(url, HOOK_URL);
}

#[tokio::test]
async fn failed_delivery_never_saves() {
    let repo = Arc::new(MemoryItemRepository::with_items(pending(4)));
    let sink = Arc::new(RecordingSink::failing("503 Service Unavailable"));

    let err = worker(repo.clone(), sink.clone(), 10).run().await.unwrap_err();
    assert!(matches!(err, PipelineError::Delivery(_)), "{err}");
    assert_eq!(repo.save_calls(), 0);
    assert_eq!(repo.select_daily_pending().await.unwrap().len(), 4);
    assert_eq!(sink.payloads().len(), 1);
}

#[tokio::test]
async fn nothing_pending_means_no_delivery() {
    let mut done = pending(2);
    for it in &mut done {
        it.mark_daily_published();
    }
    let repo = Arc::new(MemoryItemRepository::with_items(done));
    let sink = Arc::new(RecordingSink::new());

    let out = worker(repo.clone(), sink.clone(), 5).run().await.unwrap();
    assert_eq!(out, RunOutcome::NothingToPublish);
    assert!(sink.payloads().is_empty());
    assert_eq!(repo.save_calls(), 0);
}

#[tokio::test]
async fn partial_commit_is_reported_with_item_ids() {
    let repo = Arc::new(MemoryItemRepository::with_items(pending(3)));
    repo.fail_saves_for("item-01");
    let sink = Arc::new(RecordingSink::new());

    let out = worker(repo.clone(), sink, 5).run().await.unwrap();
    assert_eq!(
        out,
        RunOutcome::PartiallyCommitted {
            committed: 2,
            failed_ids: vec!["item-01".to_string()],
        }
    );
    assert!(!out.is_complete());

    // the uncommitted item is selected again next run
    let again: Vec<String> = repo
        .select_daily_pending()
        .await
        .unwrap()
        .into_iter()
        .map(|it| it.id)
        .collect();
    assert_eq!(again, vec!["item-01"]);
}

#[tokio::test]
async fn unreachable_store_aborts_before_delivery() {
    let repo = Arc::new(MemoryItemRepository::with_items(pending(2)));
    repo.set_unreachable(true);
    let sink = Arc::new(RecordingSink::new());

    let err = worker(repo, sink.clone(), 5).run().await.unwrap_err();
    assert!(matches!(err, PipelineError::Persistence(_)));
    assert!(sink.payloads().is_empty());
}

#[tokio::test]
async fn missing_webhook_secret_fails_before_selection() {
    let repo = Arc::new(MemoryItemRepository::with_items(pending(2)));
    repo.set_unreachable(true);
    let sink = Arc::new(RecordingSink::new());
    let ctx = PublishContext::new(repo, Arc::new(StaticSecretStore::new()), sink.clone(), HOOK_PARAM);

    let err = DailyWorker::new(ctx, 5).unwrap().run().await.unwrap_err();
    // configuration is checked first, so the unreachable store is never hit
    assert!(matches!(err, PipelineError::Configuration(_)), "{err}");
    assert!(sink.payloads().is_empty());
}

#[tokio::test]
async fn zero_cap_is_rejected() {
    let ctx = PublishContext::new(
        Arc::new(MemoryItemRepository::new()),
        Arc::new(StaticSecretStore::new()),
        Arc::new(RecordingSink::new()),
        HOOK_PARAM,
    );
    assert!(matches!(
        DailyWorker::new(ctx, 0),
        Err(PipelineError::Configuration(_))
    ));
}
