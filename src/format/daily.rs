// src/format/daily.rs
use super::{Block, Payload, BULLET};
use crate::item::{capitalize_first, Item};

pub const DAILY_INTRO: &str = "Here is your daily dose of AWS news, enjoy!";

const BLANK_LINE: &str = "\n\n";

/// Intro block followed by one block per item, in input order.
pub fn build_daily_message(items: &[Item]) -> Payload {
    let mut blocks = Vec::with_capacity(items.len() + 1);
    blocks.push(Block::markdown(DAILY_INTRO));
    blocks.extend(items.iter().map(item_block));
    Payload::new(blocks)
}

fn item_block(item: &Item) -> Block {
    Block::markdown(format!(
        "{BULLET}  {} *{}*: {}{BLANK_LINE}",
        item.category.icon(),
        capitalize_first(&item.title),
        item.content
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::Category;

    fn item(id: &str, title: &str, content: &str, category: Category) -> Item {
        let mut it = Item::new(title, content, category);
        it.id = id.to_string();
        it
    }

    #[test]
    fn empty_input_yields_only_intro() {
        let p = build_daily_message(&[]);
        assert_eq!(p.blocks, vec![Block::markdown(DAILY_INTRO)]);
    }

    #[test]
    fn title_is_capitalized_and_icon_prefixed() {
        let p = build_daily_message(&[item("1", "test string", "body", Category::Training)]);
        let text = p.blocks[1].text().unwrap();
        assert_eq!(text, "•  :books: *Test string*: body\n\n");
    }

    #[test]
    fn order_follows_input() {
        let items = vec![
            item("1", "b", "x", Category::Training),
            item("2", "a", "y", Category::Article),
        ];
        let p = build_daily_message(&items);
        assert!(p.blocks[1].text().unwrap().contains("*B*"));
        assert!(p.blocks[2].text().unwrap().contains("*A*"));
    }
}
