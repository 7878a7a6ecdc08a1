// src/repository/mod.rs
//! Persistence boundary for news items.

pub mod json_file;
pub mod memory;

use crate::error::{PipelineError, Result};
use crate::item::Item;

pub use json_file::JsonFileItemRepository;
pub use memory::MemoryItemRepository;

/// Sole authority for reading and mutating item state.
///
/// Selections are scans: result order is unspecified and callers must not
/// rely on it. An empty result is not an error.
#[async_trait::async_trait]
pub trait ItemRepository: Send + Sync {
    /// Upsert keyed by `item.id`. Flag updates are committed through here.
    async fn save(&self, item: &Item) -> Result<()>;

    /// Items with `published_in_daily == false`.
    async fn select_daily_pending(&self) -> Result<Vec<Item>>;

    /// Items with `published_in_daily == true && published_in_summary == false`.
    async fn select_summary_pending(&self) -> Result<Vec<Item>>;
}

/// Applies the storage-level flag rules to an incoming record: flags are
/// OR-ed with the stored ones, and a summary flag without a daily flag is
/// rejected.
pub(crate) fn prepare_upsert(incoming: &Item, stored: Option<&Item>) -> Result<Item> {
    let mut next = incoming.clone();
    if let Some(prev) = stored {
        next.merge_flags_from(prev);
        // id and submission date are immutable
        next.submission_date = prev.submission_date.clone();
    }
    if next.published_in_summary && !next.published_in_daily {
        return Err(PipelineError::persistence(format!(
            "write rejected for item {}: summary flag set without daily flag",
            next.id
        )));
    }
    Ok(next)
}
