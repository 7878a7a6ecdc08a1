// src/metrics.rs
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub const RUNS_TOTAL: &str = "digest_runs_total";
pub const ITEMS_PUBLISHED_TOTAL: &str = "digest_items_published_total";
pub const DELIVERY_FAILURES_TOTAL: &str = "digest_delivery_failures_total";
pub const COMMIT_FAILURES_TOTAL: &str = "digest_commit_failures_total";
pub const LAST_RUN_TS: &str = "digest_last_run_ts";
pub const INTAKE_ITEMS_TOTAL: &str = "intake_items_total";

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(RUNS_TOTAL, "Publication runs started, by digest.");
        describe_counter!(
            ITEMS_PUBLISHED_TOTAL,
            "Items delivered and committed, by digest."
        );
        describe_counter!(
            DELIVERY_FAILURES_TOTAL,
            "Webhook deliveries that failed or timed out."
        );
        describe_counter!(
            COMMIT_FAILURES_TOTAL,
            "Per-item status commits that failed after a successful delivery."
        );
        describe_gauge!(LAST_RUN_TS, "Unix ts when a digest run last finished.");
        describe_counter!(INTAKE_ITEMS_TOTAL, "Submissions received, by outcome.");
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder.
    pub fn init() -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;
        ensure_metrics_described();
        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
