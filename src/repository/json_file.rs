// src/repository/json_file.rs
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::{fs, sync::Mutex};

use super::{prepare_upsert, ItemRepository};
use crate::error::{PipelineError, Result};
use crate::item::{Category, Item};

/// Item table persisted as one JSON document, keyed by id.
///
/// Writes go to a sibling temp file which is then renamed over the table.
/// A process-local lock serializes read-modify-write cycles; separate
/// processes sharing one file are not coordinated.
#[derive(Debug)]
pub struct JsonFileItemRepository {
    path: PathBuf,
    lock: Mutex<()>,
}

/// On-disk record. The category stays a plain string so that a single
/// unknown tag does not make the whole table unreadable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredItem {
    id: String,
    title: String,
    content: String,
    submission_date: String,
    item_type: String,
    published_in_daily: bool,
    published_in_summary: bool,
}

impl From<&Item> for StoredItem {
    fn from(it: &Item) -> Self {
        Self {
            id: it.id.clone(),
            title: it.title.clone(),
            content: it.content.clone(),
            submission_date: it.submission_date.clone(),
            item_type: it.category.tag().to_string(),
            published_in_daily: it.published_in_daily,
            published_in_summary: it.published_in_summary,
        }
    }
}

impl From<StoredItem> for Item {
    fn from(s: StoredItem) -> Self {
        Item {
            category: Category::parse_lenient(&s.item_type),
            id: s.id,
            title: s.title,
            content: s.content,
            submission_date: s.submission_date,
            published_in_daily: s.published_in_daily,
            published_in_summary: s.published_in_summary,
        }
    }
}

type Table = BTreeMap<String, StoredItem>;

impl JsonFileItemRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `<data_dir>/<table>.json`
    pub fn for_table(data_dir: impl AsRef<Path>, table: &str) -> Self {
        Self::new(data_dir.as_ref().join(format!("{table}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_table(&self) -> Result<Table> {
        match fs::read_to_string(&self.path).await {
            Ok(s) if s.trim().is_empty() => Ok(Table::new()),
            Ok(s) => serde_json::from_str(&s).map_err(|e| {
                PipelineError::persistence(format!("corrupt table {}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Table::new()),
            Err(e) => Err(PipelineError::persistence(format!(
                "reading {}: {e}",
                self.path.display()
            ))),
        }
    }

    async fn write_table(&self, table: &Table) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(table)?).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    async fn select(&self, pred: impl Fn(&Item) -> bool) -> Result<Vec<Item>> {
        let table = {
            let _guard = self.lock.lock().await;
            self.read_table().await?
        };
        let items: Vec<Item> = table
            .into_values()
            .map(Item::from)
            .filter(|it| pred(it))
            .collect();
        tracing::debug!(
            target: "repository",
            found = items.len(),
            path = %self.path.display(),
            "scan finished"
        );
        Ok(items)
    }
}

#[async_trait::async_trait]
impl ItemRepository for JsonFileItemRepository {
    async fn save(&self, item: &Item) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut table = self.read_table().await?;
        let stored = table.get(&item.id).cloned().map(Item::from);
        let next = prepare_upsert(item, stored.as_ref())?;
        table.insert(next.id.clone(), StoredItem::from(&next));
        self.write_table(&table).await?;
        tracing::debug!(target: "repository", id = %next.id, "item saved");
        Ok(())
    }

    async fn select_daily_pending(&self) -> Result<Vec<Item>> {
        self.select(Item::is_daily_pending).await
    }

    async fn select_summary_pending(&self) -> Result<Vec<Item>> {
        self.select(Item::is_summary_pending).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileItemRepository::for_table(dir.path(), "items");
        assert!(repo.select_daily_pending().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_then_select_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let repo = JsonFileItemRepository::for_table(dir.path(), "items");
        let it = Item::new("hello", "world", Category::Feature);
        repo.save(&it).await.unwrap();

        let reopened = JsonFileItemRepository::for_table(dir.path(), "items");
        assert_eq!(reopened.select_daily_pending().await.unwrap(), vec![it.clone()]);

        let mut published = it.clone();
        published.mark_daily_published();
        reopened.save(&published).await.unwrap();
        assert!(reopened.select_daily_pending().await.unwrap().is_empty());
        assert_eq!(reopened.select_summary_pending().await.unwrap(), vec![published]);
    }

    #[tokio::test]
    async fn unknown_stored_category_decodes_as_misc() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.json");
        std::fs::write(
            &path,
            r#"{"x":{"id":"x","title":"t","content":"c","submissionDate":"2024-03-05T00:00:00.000Z","itemType":"GOSSIP","publishedInDaily":false,"publishedInSummary":false}}"#,
        )
        .unwrap();
        let repo = JsonFileItemRepository::new(&path);
        let items = repo.select_daily_pending().await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].category, Category::Misc);
    }

    #[tokio::test]
    async fn corrupt_file_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("items.json");
        std::fs::write(&path, "{ not json").unwrap();
        let repo = JsonFileItemRepository::new(&path);
        assert!(matches!(
            repo.select_summary_pending().await,
            Err(PipelineError::Persistence(_))
        ));
    }
}
