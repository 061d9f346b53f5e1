use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TitleSource {
    /// Title comes from the file name.
    #[default]
    Filename,
    /// Title comes from front matter or the first level-1 heading, falling back to the file name.
    Heading,
}

impl TitleSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Filename => "filename",
            Self::Heading => "heading",
        }
    }
}

impl fmt::Display for TitleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TitleSource {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "filename" => Ok(Self::Filename),
            "heading" => Ok(Self::Heading),
            other => Err(format!(
                "unknown title source `{other}` (expected `filename` or `heading`)"
            )),
        }
    }
}

/// Derive the display title of a page.
///
/// `content` is only consulted for [`TitleSource::Heading`]; passing `None`
/// there falls back to the file name.
pub fn derive_title(relative_path: &str, content: Option<&str>, source: TitleSource) -> String {
    if source == TitleSource::Heading
        && let Some(title) = content.and_then(title_from_content)
    {
        return title;
    }
    title_from_filename(relative_path)
}

/// `Getting_Started.md` -> `Getting Started`, `release-notes.md` -> `release notes`.
pub fn title_from_filename(relative_path: &str) -> String {
    let file_name = relative_path.rsplit('/').next().unwrap_or(relative_path);
    let stem = match file_name.rfind('.') {
        Some(index) if index > 0 => &file_name[..index],
        _ => file_name,
    };
    let title = stem.replace(['_', '-'], " ");
    let trimmed = title.trim();
    if trimmed.is_empty() {
        stem.to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn title_from_content(content: &str) -> Option<String> {
    match parse_front_matter(content) {
        Some((fields, body)) => front_matter_title(&fields).or_else(|| first_heading(body)),
        // A leading `---` that isn't YAML is a thematic break.
        None => first_heading(content),
    }
}

/// Leading front matter, only when it parses to a YAML mapping.
fn parse_front_matter(content: &str) -> Option<(serde_yaml::Mapping, &str)> {
    let (yaml, body) = split_front_matter(content);
    match serde_yaml::from_str::<serde_yaml::Value>(yaml?).ok()? {
        serde_yaml::Value::Mapping(fields) => Some((fields, body)),
        _ => None,
    }
}

/// Split a leading `---` YAML block from the document body.
pub fn split_front_matter(content: &str) -> (Option<&str>, &str) {
    let content = content.trim_start_matches('\u{feff}');
    let mut lines = content.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return (None, content);
    };
    if first.trim_end() != "---" {
        return (None, content);
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            return (Some(&content[yaml_start..offset]), &content[offset + line.len()..]);
        }
        offset += line.len();
    }
    (None, content)
}

fn front_matter_title(fields: &serde_yaml::Mapping) -> Option<String> {
    let title = fields.get("title")?.as_str()?.trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

/// First level-1 heading, ATX (`# Title`) or setext (`Title` over `===`).
/// Headings inside fenced code blocks are ignored.
fn first_heading(body: &str) -> Option<String> {
    let mut fence: Option<&str> = None;
    let mut previous: Option<&str> = None;

    for line in body.lines() {
        let trimmed = line.trim_start();
        let indent = line.len() - trimmed.len();

        if let Some(marker) = fence {
            if trimmed.starts_with(marker) {
                fence = None;
            }
            previous = None;
            continue;
        }
        if indent <= 3 && (trimmed.starts_with("```") || trimmed.starts_with("~~~")) {
            fence = Some(&trimmed[..3]);
            previous = None;
            continue;
        }

        if indent <= 3
            && let Some(text) = atx_level_one(trimmed)
        {
            return Some(text);
        }

        if indent <= 3
            && !trimmed.is_empty()
            && trimmed.trim_end().chars().all(|c| c == '=')
            && let Some(text) = previous
        {
            return Some(text.to_string());
        }

        previous = if trimmed.trim().is_empty() || indent > 3 {
            None
        } else {
            Some(trimmed.trim())
        };
    }
    None
}

fn atx_level_one(line: &str) -> Option<String> {
    let rest = line.strip_prefix('#')?;
    if !(rest.is_empty() || rest.starts_with(' ') || rest.starts_with('\t')) {
        return None;
    }
    let mut text = rest.trim();
    // Closing sequence: `# Title ##`
    let without_hashes = text.trim_end_matches('#');
    if without_hashes.is_empty() || without_hashes.ends_with([' ', '\t']) {
        text = without_hashes.trim_end();
    }
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
