use std::path::PathBuf;

use serde::Serialize;

use crate::home::Markers;
use crate::tags::{TagTree, tag_display_name};

/// Deepest Markdown heading level.
const MAX_HEADING_LEVEL: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WikiPage {
    #[serde(skip)]
    pub path: PathBuf,
    pub relative_path: String,
    pub title: String,
    pub link: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkOptions {
    pub prefix: String,
    pub strip_extension: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub heading: Option<String>,
    pub group_by_tags: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            heading: Some(crate::config::DEFAULT_HEADING.to_string()),
            group_by_tags: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableOfContents {
    pages: Vec<WikiPage>,
}

impl TableOfContents {
    pub fn from_pages(mut pages: Vec<WikiPage>) -> Self {
        pages.sort_by(|left, right| left.relative_path.cmp(&right.relative_path));
        Self { pages }
    }

    pub fn pages(&self) -> &[WikiPage] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// One `- [Title](link)` line per page.
    pub fn render_list(&self) -> String {
        let mut out = String::new();
        for page in &self.pages {
            push_entry(&mut out, page);
        }
        out
    }

    /// Untagged pages first, then one heading per tag, nested tags one level deeper.
    pub fn render_grouped(&self, base_level: usize) -> String {
        let mut tree = TagTree::default();
        for page in &self.pages {
            if page.tags.is_empty() {
                tree.insert_untagged(page);
            } else {
                for tag in &page.tags {
                    tree.insert(tag, page);
                }
            }
        }
        let mut out = String::new();
        render_tree(&tree, base_level, &mut out);
        out
    }

    /// The TOC body without markers: a flat list, or tag-grouped sections.
    pub fn render(&self, options: &RenderOptions) -> String {
        if options.group_by_tags {
            let base_level = if options.heading.is_some() { 2 } else { 1 };
            self.render_grouped(base_level)
        } else {
            self.render_list()
        }
    }

    /// The marker-delimited block spliced into the Home page.
    pub fn render_block(&self, options: &RenderOptions, markers: &Markers) -> String {
        let mut out = String::new();
        out.push_str(&markers.start);
        out.push_str("\n\n");
        if let Some(heading) = &options.heading {
            out.push_str("# ");
            out.push_str(heading);
            out.push_str("\n\n");
        }
        out.push_str(&self.render(options));
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&markers.end);
        out.push('\n');
        out
    }
}

fn render_tree(tree: &TagTree<&WikiPage>, level: usize, out: &mut String) {
    for page in &tree.items {
        push_entry(out, page);
    }
    for (tag, child) in &tree.children {
        if !out.is_empty() && !out.ends_with("\n\n") {
            out.push('\n');
        }
        out.push_str(&"#".repeat(level.min(MAX_HEADING_LEVEL)));
        out.push(' ');
        out.push_str(&tag_display_name(tag));
        out.push_str("\n\n");
        render_tree(child, level + 1, out);
    }
}

fn push_entry(out: &mut String, page: &WikiPage) {
    out.push_str("- [");
    out.push_str(&escape_link_text(&page.title));
    out.push_str("](");
    out.push_str(&page.link);
    out.push_str(")\n");
}

/// Link target for a page: prefix + relative path, optionally without the extension.
pub fn page_link(relative_path: &str, options: &LinkOptions) -> String {
    let mut target = relative_path;
    if options.strip_extension {
        let file_start = target.rfind('/').map_or(0, |index| index + 1);
        if let Some(dot) = target[file_start..].rfind('.')
            && dot > 0
        {
            target = &target[..file_start + dot];
        }
    }
    format!("{}{}", options.prefix, encode_link(target))
}

fn encode_link(target: &str) -> String {
    let mut out = String::with_capacity(target.len());
    for ch in target.chars() {
        match ch {
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '%' => out.push_str("%25"),
            '(' => out.push_str("%28"),
            ')' => out.push_str("%29"),
            '<' => out.push_str("%3C"),
            '>' => out.push_str("%3E"),
            other => out.push(other),
        }
    }
    out
}

fn escape_link_text(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for ch in title.chars() {
        if matches!(ch, '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
