use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use similar::TextDiff;

use crate::config::{DEFAULT_END_MARKER, DEFAULT_START_MARKER};
use crate::error::{Result, TocError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    pub start: String,
    pub end: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            start: DEFAULT_START_MARKER.to_string(),
            end: DEFAULT_END_MARKER.to_string(),
        }
    }
}

/// Where the TOC block goes when the Home page has no markers yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingMarkers {
    #[default]
    Append,
    Prepend,
}

impl MissingMarkers {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::Prepend => "prepend",
        }
    }
}

impl FromStr for MissingMarkers {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(Self::Append),
            "prepend" => Ok(Self::Prepend),
            other => Err(format!(
                "unknown placement `{other}` (expected `append` or `prepend`)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    Replaced,
    Appended,
    Prepended,
    Created,
}

impl Placement {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Replaced => "replaced",
            Self::Appended => "appended",
            Self::Prepended => "prepended",
            Self::Created => "created",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerIssue {
    MissingEnd,
    MissingStart,
}

impl fmt::Display for MarkerIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEnd => f.write_str("start marker has no matching end marker"),
            Self::MissingStart => f.write_str("end marker appears without a start marker"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spliced {
    pub content: String,
    pub placement: Placement,
}

/// Put `block` into `content`.
///
/// With both markers present, the lines from the start marker through the end
/// marker are replaced and every other byte is kept as-is. Without markers the
/// block is appended or prepended according to `missing`.
pub fn splice_toc(
    content: &str,
    block: &str,
    markers: &Markers,
    missing: MissingMarkers,
) -> std::result::Result<Spliced, MarkerIssue> {
    let start_marker = markers.start.trim();
    let end_marker = markers.end.trim();

    let mut offset = 0usize;
    let mut region_start: Option<usize> = None;
    let mut saw_end = false;
    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_end();
        match region_start {
            None if trimmed == start_marker => region_start = Some(offset),
            None if trimmed == end_marker => saw_end = true,
            Some(start) if trimmed == end_marker => {
                let end = offset + line.len();
                let mut out = String::with_capacity(content.len() + block.len());
                out.push_str(&content[..start]);
                out.push_str(block);
                out.push_str(&content[end..]);
                return Ok(Spliced {
                    content: out,
                    placement: Placement::Replaced,
                });
            }
            _ => {}
        }
        offset += line.len();
    }

    if region_start.is_some() {
        return Err(MarkerIssue::MissingEnd);
    }
    if saw_end {
        return Err(MarkerIssue::MissingStart);
    }

    let mut out = String::with_capacity(content.len() + block.len() + 2);
    let placement = match missing {
        MissingMarkers::Append => {
            out.push_str(content);
            if !out.is_empty() {
                if !out.ends_with('\n') {
                    out.push('\n');
                }
                if !out.ends_with("\n\n") {
                    out.push('\n');
                }
            }
            out.push_str(block);
            Placement::Appended
        }
        MissingMarkers::Prepend => {
            out.push_str(block);
            if !content.is_empty() && !content.starts_with(['\n', '\r']) {
                out.push('\n');
            }
            out.push_str(content);
            Placement::Prepended
        }
    };
    Ok(Spliced {
        content: out,
        placement,
    })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Compute the result but leave the file untouched.
    pub dry_run: bool,
    /// Keep the previous Home page as `<name>.old`.
    pub backup: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HomeUpdate {
    pub path: PathBuf,
    pub placement: Placement,
    pub changed: bool,
    pub written: bool,
    pub backup_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub diff: String,
}

/// Splice `block` into the Home page at `path`, creating it when missing.
/// Unchanged content is never rewritten.
pub fn update_home_page(
    path: &Path,
    block: &str,
    markers: &Markers,
    missing: MissingMarkers,
    options: &UpdateOptions,
) -> Result<HomeUpdate> {
    let existing = read_home_page(path)?;
    let original = existing.as_deref().unwrap_or("");

    let (content, placement) = match &existing {
        Some(current) => {
            let spliced = splice_toc(current, block, markers, missing).map_err(|issue| {
                TocError::MalformedMarkers {
                    path: path.to_path_buf(),
                    reason: issue.to_string(),
                }
            })?;
            (spliced.content, spliced.placement)
        }
        None => (block.to_string(), Placement::Created),
    };

    let changed = existing.is_none() || content != original;
    let diff = if changed {
        unified_diff(path, original, &content)
    } else {
        String::new()
    };

    let mut update = HomeUpdate {
        path: path.to_path_buf(),
        placement,
        changed,
        written: false,
        backup_path: None,
        diff,
    };
    if !changed || options.dry_run {
        log::debug!(
            "not writing {} (changed={}, dry_run={})",
            path.display(),
            changed,
            options.dry_run
        );
        return Ok(update);
    }

    if options.backup && existing.is_some() {
        let backup_path = backup_path_for(path);
        fs::copy(path, &backup_path).map_err(|err| TocError::write(&backup_path, err))?;
        log::info!("backed up {} to {}", path.display(), backup_path.display());
        update.backup_path = Some(backup_path);
    }

    fs::write(path, &content).map_err(|err| TocError::write(path, err))?;
    log::info!("{} TOC in {}", placement.as_str(), path.display());
    update.written = true;
    Ok(update)
}

fn read_home_page(path: &Path) -> Result<Option<String>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(TocError::read(path, err)),
    };
    String::from_utf8(bytes).map(Some).map_err(|err| {
        TocError::read(path, io::Error::new(io::ErrorKind::InvalidData, err))
    })
}

pub fn backup_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".old");
    path.with_file_name(name)
}

fn unified_diff(path: &Path, old: &str, new: &str) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{name}"), &format!("b/{name}"))
        .to_string()
}
