// src/format/mod.rs
//! Slack Block Kit payloads and the two digest formatters.
//!
//! Formatters are pure: same input, byte-identical payload.

pub mod daily;
pub mod summary;

use serde::{Deserialize, Serialize};

pub use daily::{build_daily_message, DAILY_INTRO};
pub use summary::{build_summary_message, group_by_category, ItemsByCategory, SUMMARY_INTRO};

/// Body POSTed to the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub unfurl_links: bool,
    pub unfurl_media: bool,
    pub blocks: Vec<Block>,
}

impl Payload {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self {
            unfurl_links: false,
            unfurl_media: false,
            blocks,
        }
    }

    /// Number of per-item section blocks (everything except the intro,
    /// headers and dividers).
    pub fn item_block_count(&self) -> usize {
        self.blocks
            .iter()
            .skip(1)
            .filter(|b| matches!(b, Block::Section { .. }))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    Section { text: Text },
    Header { text: Text },
    Divider,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Text {
    #[serde(rename = "mrkdwn")]
    Mrkdwn { text: String },
    #[serde(rename = "plain_text")]
    PlainText { text: String, emoji: bool },
}

impl Block {
    pub fn markdown(text: impl Into<String>) -> Self {
        Block::Section {
            text: Text::Mrkdwn { text: text.into() },
        }
    }

    pub fn header(text: impl Into<String>) -> Self {
        Block::Header {
            text: Text::PlainText {
                text: text.into(),
                emoji: true,
            },
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Block::Section { text } | Block::Header { text } => match text {
                Text::Mrkdwn { text } | Text::PlainText { text, .. } => Some(text.as_str()),
            },
            Block::Divider => None,
        }
    }
}

pub(crate) const BULLET: &str = "•";
