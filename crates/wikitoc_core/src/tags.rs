use std::collections::BTreeMap;

pub const TAGS_PREFIX: &str = "Tags: ";

/// Tags from the first `Tags: ` line of a page, e.g.
/// `Tags: Tag_One Tag_Two Parent-Child`.
pub fn parse_tags(content: &str) -> Vec<String> {
    content
        .lines()
        .find(|line| line.starts_with(TAGS_PREFIX))
        .map(|line| {
            line[TAGS_PREFIX.len()..]
                .split_whitespace()
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Pages grouped by nested tag. `Parent-Child` files a page under
/// `Parent` -> `Child`; pages without tags stay at the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagTree<T> {
    pub items: Vec<T>,
    pub children: BTreeMap<String, TagTree<T>>,
}

impl<T> Default for TagTree<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            children: BTreeMap::new(),
        }
    }
}

impl<T: PartialEq> TagTree<T> {
    pub fn insert_untagged(&mut self, item: T) {
        if !self.items.contains(&item) {
            self.items.push(item);
        }
    }

    pub fn insert(&mut self, tag: &str, item: T) {
        let mut node = self;
        for level in tag.split('-').filter(|level| !level.is_empty()) {
            node = node.children.entry(level.to_string()).or_default();
        }
        node.insert_untagged(item);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.children.is_empty()
    }
}

/// `Tag_One` -> `Tag One`.
pub fn tag_display_name(tag: &str) -> String {
    tag.replace('_', " ")
}
