// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod error;
pub mod item;
pub mod schedule;
pub mod secrets;

// Persistence boundary
pub mod repository;

// Digest payloads and the two formatters
pub mod format;

// Webhook delivery, workers and their wiring
pub mod app;
pub mod metrics;
pub mod notify;
pub mod publish;

// Submission intake
pub mod intake;

// ---- Re-exports for stable public API ----
pub use crate::error::{PipelineError, Result};
pub use crate::format::{build_daily_message, build_summary_message, Block, Payload};
pub use crate::item::{Category, Item};
pub use crate::publish::{DailyWorker, PublishContext, RunOutcome, SummaryWorker};
pub use crate::repository::ItemRepository;
