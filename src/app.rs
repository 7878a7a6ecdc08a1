// src/app.rs
//! Wiring of configuration, adapters and workers for the binary.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use crate::config::PublisherConfig;
use crate::intake::{self, IntakeState};
use crate::metrics::Metrics;
use crate::notify::{DigestSink, SlackWebhook};
use crate::publish::{DailyWorker, PublishContext, RunOutcome, SummaryWorker};
use crate::repository::{ItemRepository, JsonFileItemRepository};
use crate::schedule::spawn_schedule;
use crate::secrets::{EnvSecretStore, SecretStore};

pub struct App {
    pub config: PublisherConfig,
    pub repo: Arc<dyn ItemRepository>,
    secrets: Arc<dyn SecretStore>,
    sink: Arc<dyn DigestSink>,
}

impl App {
    pub fn from_config(config: PublisherConfig) -> Self {
        let repo: Arc<dyn ItemRepository> = Arc::new(JsonFileItemRepository::for_table(
            &config.store.data_dir,
            &config.store.items_table,
        ));
        let sink = SlackWebhook::new().with_timeout(config.delivery_timeout);
        Self::with_adapters(config, repo, Arc::new(EnvSecretStore), Arc::new(sink))
    }

    pub fn with_adapters(
        config: PublisherConfig,
        repo: Arc<dyn ItemRepository>,
        secrets: Arc<dyn SecretStore>,
        sink: Arc<dyn DigestSink>,
    ) -> Self {
        Self {
            config,
            repo,
            secrets,
            sink,
        }
    }

    /// Each digest posts to its own channel, so each worker gets its own context.
    fn context(&self, webhook_parameter: &str) -> PublishContext {
        PublishContext::new(
            self.repo.clone(),
            self.secrets.clone(),
            self.sink.clone(),
            webhook_parameter,
        )
    }

    pub fn daily_worker(&self) -> Result<DailyWorker> {
        let max = self.config.max_items_per_run()?;
        let ctx = self.context(self.config.daily_webhook_parameter()?);
        Ok(DailyWorker::new(ctx, max)?)
    }

    pub fn summary_worker(&self) -> Result<SummaryWorker> {
        let ctx = self.context(self.config.summary_webhook_parameter()?);
        Ok(SummaryWorker::new(ctx))
    }

    /// Intake + /metrics server, with both workers on their schedules.
    pub async fn serve(self) -> Result<()> {
        let metrics = Metrics::init()?;

        let daily = Arc::new(self.daily_worker()?);
        let summary = Arc::new(self.summary_worker()?);

        let daily_task = spawn_schedule("daily", self.config.daily_cron.clone(), move || {
            let worker = daily.clone();
            async move { log_outcome("daily", worker.run().await) }
        });
        let summary_task = spawn_schedule("summary", self.config.summary_cron.clone(), move || {
            let worker = summary.clone();
            async move { log_outcome("summary", worker.run().await) }
        });

        let router = intake::router(IntakeState::new(self.repo.clone())).merge(metrics.router());
        let listener = TcpListener::bind(self.config.intake_addr)
            .await
            .with_context(|| format!("binding {}", self.config.intake_addr))?;
        tracing::info!(target: "intake", addr = %self.config.intake_addr, "intake server listening");

        let served = axum::serve(listener, router).await.context("intake server");
        daily_task.abort();
        summary_task.abort();
        served
    }
}

/// Scheduled runs have nobody to return an error to; report it here.
fn log_outcome(digest: &'static str, res: crate::error::Result<RunOutcome>) {
    match res {
        Ok(RunOutcome::PartiallyCommitted { failed_ids, .. }) => {
            tracing::error!(target: "publish", digest, ?failed_ids, "run finished with partial commit");
        }
        Ok(outcome) => tracing::info!(target: "publish", digest, ?outcome, "run finished"),
        Err(e) => tracing::error!(target: "publish", digest, error = %e, "run failed"),
    }
}
