// src/config.rs
//! Startup configuration, read from the environment and validated once.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{PipelineError, Result};
use crate::schedule::CronExpr;

pub const ENV_ITEMS_TABLE: &str = "INFO_ITEMS_TABLE";
pub const ENV_SLACK_URL_PARAMETER: &str = "SLACK_URL_SECRET_PARAMETER";
pub const ENV_SUMMARY_SLACK_URL_PARAMETER: &str = "SUMMARY_SLACK_URL_SECRET_PARAMETER";
pub const ENV_MAX_ITEMS: &str = "MAX_ITEMS_TO_PUBLISH";
pub const ENV_DATA_DIR: &str = "DATA_DIR";
pub const ENV_DELIVERY_TIMEOUT: &str = "DELIVERY_TIMEOUT_SECS";
pub const ENV_DAILY_CRON: &str = "DAILY_CRON";
pub const ENV_SUMMARY_CRON: &str = "SUMMARY_CRON";
pub const ENV_INTAKE_ADDR: &str = "INTAKE_ADDR";

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_DELIVERY_TIMEOUT_SECS: u64 = 10;
const DEFAULT_DAILY_CRON: &str = "0 9 * * 1-5";
const DEFAULT_SUMMARY_CRON: &str = "0 15 * * 5";
const DEFAULT_INTAKE_ADDR: &str = "0.0.0.0:8080";

/// Settings shared by both workers.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub items_table: String,
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PublisherConfig {
    pub store: StoreConfig,
    /// Secret parameter naming the daily channel's webhook URL.
    pub daily_webhook_parameter: Option<String>,
    /// Secret parameter naming the summary channel's webhook URL.
    pub summary_webhook_parameter: Option<String>,
    /// Daily cap; `None` only for processes that never run the daily worker.
    pub max_items_per_run: Option<usize>,
    pub delivery_timeout: Duration,
    pub daily_cron: CronExpr,
    pub summary_cron: CronExpr,
    pub intake_addr: SocketAddr,
}

/// Which workers this process is going to run; decides what is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Needs {
    Daily,
    Summary,
    All,
}

impl PublisherConfig {
    pub fn from_env(needs: Needs) -> Result<Self> {
        Self::from_lookup(needs, |k| std::env::var(k).ok())
    }

    /// Build from an arbitrary key lookup; fails on the first missing or
    /// malformed required value.
    pub fn from_lookup<F>(needs: Needs, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |k: &str| lookup(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |k: &str| {
            get(k).ok_or_else(|| PipelineError::config(format!("missing configuration value for {k}")))
        };

        let items_table = required(ENV_ITEMS_TABLE)?;
        let runs_daily = matches!(needs, Needs::Daily | Needs::All);
        let runs_summary = matches!(needs, Needs::Summary | Needs::All);

        let daily_webhook_parameter = if runs_daily {
            Some(required(ENV_SLACK_URL_PARAMETER)?)
        } else {
            get(ENV_SLACK_URL_PARAMETER)
        };
        let summary_webhook_parameter = if runs_summary {
            Some(required(ENV_SUMMARY_SLACK_URL_PARAMETER)?)
        } else {
            get(ENV_SUMMARY_SLACK_URL_PARAMETER)
        };

        let max_items_per_run = match needs {
            Needs::Daily | Needs::All => Some(parse_positive(ENV_MAX_ITEMS, &required(ENV_MAX_ITEMS)?)?),
            Needs::Summary => match get(ENV_MAX_ITEMS) {
                Some(v) => Some(parse_positive(ENV_MAX_ITEMS, &v)?),
                None => None,
            },
        };

        let delivery_timeout = match get(ENV_DELIVERY_TIMEOUT) {
            Some(v) => parse_positive(ENV_DELIVERY_TIMEOUT, &v)? as u64,
            None => DEFAULT_DELIVERY_TIMEOUT_SECS,
        };

        let daily_cron = CronExpr::parse(&get(ENV_DAILY_CRON).unwrap_or_else(|| DEFAULT_DAILY_CRON.into()))?;
        let summary_cron =
            CronExpr::parse(&get(ENV_SUMMARY_CRON).unwrap_or_else(|| DEFAULT_SUMMARY_CRON.into()))?;

        let addr_raw = get(ENV_INTAKE_ADDR).unwrap_or_else(|| DEFAULT_INTAKE_ADDR.into());
        let intake_addr = addr_raw.parse().map_err(|_| {
            PipelineError::config(format!("invalid socket address for {ENV_INTAKE_ADDR}: {addr_raw}"))
        })?;

        Ok(Self {
            store: StoreConfig {
                items_table,
                data_dir: PathBuf::from(get(ENV_DATA_DIR).unwrap_or_else(|| DEFAULT_DATA_DIR.into())),
            },
            daily_webhook_parameter,
            summary_webhook_parameter,
            max_items_per_run,
            delivery_timeout: Duration::from_secs(delivery_timeout),
            daily_cron,
            summary_cron,
            intake_addr,
        })
    }

    pub fn daily_webhook_parameter(&self) -> Result<&str> {
        self.daily_webhook_parameter
            .as_deref()
            .ok_or_else(|| PipelineError::config(format!("missing configuration value for {ENV_SLACK_URL_PARAMETER}")))
    }

    pub fn summary_webhook_parameter(&self) -> Result<&str> {
        self.summary_webhook_parameter.as_deref().ok_or_else(|| {
            PipelineError::config(format!(
                "missing configuration value for {ENV_SUMMARY_SLACK_URL_PARAMETER}"
            ))
        })
    }

    pub fn max_items_per_run(&self) -> Result<usize> {
        self.max_items_per_run
            .ok_or_else(|| PipelineError::config(format!("missing configuration value for {ENV_MAX_ITEMS}")))
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<usize> {
    match raw.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(PipelineError::config(format!(
            "invalid positive integer configuration value for {key}: {raw}"
        ))),
    }
}
