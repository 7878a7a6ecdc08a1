// src/item.rs
//! News item record, its category table and the two publication flags.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Icon used when a category has no dedicated entry.
pub const GENERIC_ICON: &str = ":earth_americas:";

/// Closed set of item categories.
///
/// Variants are declared in lexicographic order of their tag, so the derived
/// `Ord` and [`Category::ALL`] both follow the summary layout order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Article,
    Feature,
    Misc,
    New,
    Training,
}

/// One row of the category table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryInfo {
    pub tag: &'static str,
    pub icon: &'static str,
    pub label: &'static str,
}

const CATEGORY_TABLE: [(Category, CategoryInfo); 5] = [
    (
        Category::Article,
        CategoryInfo {
            tag: "ARTICLE",
            icon: ":blue_book:",
            label: "Articles",
        },
    ),
    (
        Category::Feature,
        CategoryInfo {
            tag: "FEATURE",
            icon: ":nerd_face:",
            label: "Tips & tricks",
        },
    ),
    (
        Category::Misc,
        CategoryInfo {
            tag: "MISC",
            icon: GENERIC_ICON,
            label: "Other",
        },
    ),
    (
        Category::New,
        CategoryInfo {
            tag: "NEW",
            icon: ":new:",
            label: "New features and releases",
        },
    ),
    (
        Category::Training,
        CategoryInfo {
            tag: "TRAINING",
            icon: ":books:",
            label: "Training courses",
        },
    ),
];

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Article,
        Category::Feature,
        Category::Misc,
        Category::New,
        Category::Training,
    ];

    /// Table rows follow variant declaration order, so the discriminant is the row index.
    pub fn info(self) -> CategoryInfo {
        CATEGORY_TABLE[self as usize].1
    }

    pub fn tag(self) -> &'static str {
        self.info().tag
    }

    pub fn icon(self) -> &'static str {
        self.info().icon
    }

    pub fn label(self) -> &'static str {
        self.info().label
    }

    /// Strict lookup used at the intake boundary.
    pub fn parse(tag: &str) -> Result<Self> {
        CATEGORY_TABLE
            .iter()
            .find(|(_, info)| info.tag == tag)
            .map(|(c, _)| *c)
            .ok_or_else(|| PipelineError::validation(format!("Unknown category: {tag}")))
    }

    /// Tolerant lookup used when decoding stored records: unknown tags land
    /// in the generic bucket instead of failing the whole selection.
    pub fn parse_lenient(tag: &str) -> Self {
        match Self::parse(tag) {
            Ok(c) => c,
            Err(_) => {
                tracing::warn!(target: "repository", tag, "unknown stored category, using MISC");
                Category::Misc
            }
        }
    }
}

/// A submitted news record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub title: String,
    pub content: String,
    pub submission_date: String,
    pub category: Category,
    pub published_in_daily: bool,
    pub published_in_summary: bool,
}

impl Item {
    /// Fresh, unpublished item with a new id and the current timestamp.
    pub fn new(title: impl Into<String>, content: impl Into<String>, category: Category) -> Self {
        Self::submitted_at(title, content, category, Utc::now())
    }

    pub fn submitted_at(
        title: impl Into<String>,
        content: impl Into<String>,
        category: Category,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            content: content.into(),
            submission_date: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            category,
            published_in_daily: false,
            published_in_summary: false,
        }
    }

    pub fn is_daily_pending(&self) -> bool {
        !self.published_in_daily
    }

    pub fn is_summary_pending(&self) -> bool {
        self.published_in_daily && !self.published_in_summary
    }

    pub fn mark_daily_published(&mut self) {
        self.published_in_daily = true;
    }

    /// Summary publication is downstream of daily publication; an item that
    /// never went out in a daily digest cannot be marked.
    pub fn mark_summary_published(&mut self) -> Result<()> {
        if !self.published_in_daily {
            return Err(PipelineError::persistence(format!(
                "item {} is not daily-published yet",
                self.id
            )));
        }
        self.published_in_summary = true;
        Ok(())
    }

    /// Monotonic merge of the flags of `stored` into `self`.
    pub fn merge_flags_from(&mut self, stored: &Item) {
        self.published_in_daily |= stored.published_in_daily;
        self.published_in_summary |= stored.published_in_summary;
    }
}

/// Upper-cases the first character and leaves the rest untouched.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
