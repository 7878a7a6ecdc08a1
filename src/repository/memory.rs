// src/repository/memory.rs
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{prepare_upsert, ItemRepository};
use crate::error::{PipelineError, Result};
use crate::item::Item;

/// In-process item table.
///
/// Backed by a `HashMap`, so selection order is arbitrary, like a real scan.
/// Faults can be injected for tests: per-id save failures and a global
/// "store unreachable" switch.
#[derive(Debug, Default)]
pub struct MemoryItemRepository {
    items: Mutex<HashMap<String, Item>>,
    failing_ids: Mutex<HashSet<String>>,
    unreachable: AtomicBool,
    save_calls: AtomicUsize,
}

impl MemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: impl IntoIterator<Item = Item>) -> Self {
        let repo = Self::new();
        {
            let mut map = repo.lock_items();
            for it in items {
                map.insert(it.id.clone(), it);
            }
        }
        repo
    }

    /// Make every subsequent `save` of `id` fail.
    pub fn fail_saves_for(&self, id: impl Into<String>) {
        self.failing_ids
            .lock()
            .expect("failing ids mutex poisoned")
            .insert(id.into());
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Number of `save` calls, successful or not.
    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub fn get(&self, id: &str) -> Option<Item> {
        self.lock_items().get(id).cloned()
    }

    pub fn snapshot(&self) -> Vec<Item> {
        self.lock_items().values().cloned().collect()
    }

    fn lock_items(&self) -> std::sync::MutexGuard<'_, HashMap<String, Item>> {
        self.items.lock().expect("items mutex poisoned")
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(PipelineError::persistence("store unreachable"));
        }
        Ok(())
    }

    fn select(&self, pred: impl Fn(&Item) -> bool) -> Result<Vec<Item>> {
        self.check_reachable()?;
        Ok(self.lock_items().values().filter(|it| pred(*it)).cloned().collect())
    }
}

#[async_trait::async_trait]
impl ItemRepository for MemoryItemRepository {
    async fn save(&self, item: &Item) -> Result<()> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        let failing = self
            .failing_ids
            .lock()
            .expect("failing ids mutex poisoned")
            .contains(&item.id);
        if failing {
            return Err(PipelineError::persistence(format!(
                "write rejected for item {}",
                item.id
            )));
        }

        let mut map = self.lock_items();
        let next = prepare_upsert(item, map.get(&item.id))?;
        map.insert(next.id.clone(), next);
        Ok(())
    }

    async fn select_daily_pending(&self) -> Result<Vec<Item>> {
        self.select(Item::is_daily_pending)
    }

    async fn select_summary_pending(&self) -> Result<Vec<Item>> {
        self.select(Item::is_summary_pending)
    }
}
