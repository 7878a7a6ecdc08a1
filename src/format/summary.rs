// src/format/summary.rs
use std::collections::BTreeMap;

use super::{Block, Payload, BULLET};
use crate::item::{capitalize_first, Category, Item};

pub const SUMMARY_INTRO: &str = "Remember that if you prefer bite-size :chocolate_bar: and fresher :sushi: news you can always join the #aws-did-you-hear channel to enjoy the daily updates :wink:";

pub type ItemsByCategory = BTreeMap<Category, Vec<Item>>;

/// Groups items by category, keeping storage order inside each group.
pub fn group_by_category(items: Vec<Item>) -> ItemsByCategory {
    let mut grouped = ItemsByCategory::new();
    for it in items {
        grouped.entry(it.category).or_default().push(it);
    }
    grouped
}

/// Intro block, then a header + divider + item blocks for each non-empty
/// category. Categories are visited in tag order, whatever the map holds.
pub fn build_summary_message(grouped: &ItemsByCategory) -> Payload {
    let mut blocks = vec![Block::markdown(SUMMARY_INTRO)];

    for category in Category::ALL {
        let items = match grouped.get(&category) {
            Some(v) if !v.is_empty() => v,
            _ => continue,
        };

        tracing::debug!(
            target: "publish",
            category = category.tag(),
            count = items.len(),
            "category ready for summary"
        );

        blocks.push(Block::header(format!(
            "{} {}",
            category.icon(),
            capitalize_first(category.label())
        )));
        blocks.push(Block::Divider);
        blocks.extend(items.iter().map(|it| {
            Block::markdown(format!(
                "{BULLET}  *{}*: {}",
                capitalize_first(&it.title),
                it.content
            ))
        }));
    }

    Payload::new(blocks)
}
