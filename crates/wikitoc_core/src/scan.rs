use std::io;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::config::DEFAULT_HOME_PAGE;
use crate::error::{Result, TocError};

/// Wiki chrome pages that never belong in the TOC.
const WIKI_CHROME_PAGES: &[&str] = &["_Sidebar.md", "_Footer.md"];

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub home_page: String,
    pub recursive: bool,
    /// Lowercase, without the leading dot.
    pub extensions: Vec<String>,
    pub exclude: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            home_page: DEFAULT_HOME_PAGE.to_string(),
            recursive: false,
            extensions: vec!["md".to_string()],
            exclude: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedPage {
    pub path: PathBuf,
    /// `/`-separated path relative to the wiki root.
    pub relative_path: String,
}

/// Enumerate the Markdown pages of a wiki folder, sorted by relative path.
pub fn scan_pages(root: &Path, options: &ScanOptions) -> Result<Vec<ScannedPage>> {
    if !root.is_dir() {
        return Err(TocError::PathNotFound {
            path: root.to_path_buf(),
        });
    }

    let max_depth = if options.recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry));

    let mut pages = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(root).to_path_buf();
            let source = err
                .into_io_error()
                .unwrap_or_else(|| io::Error::other("filesystem loop detected"));
            TocError::ReadError { path, source }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !has_page_extension(path, &options.extensions) {
            continue;
        }
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let relative_path = normalize_separators(&relative.to_string_lossy());
        if is_excluded(&relative_path, options) {
            log::debug!("skipping {relative_path}");
            continue;
        }
        pages.push(ScannedPage {
            path: path.to_path_buf(),
            relative_path,
        });
    }

    pages.sort_by(|left, right| left.relative_path.cmp(&right.relative_path));
    log::debug!("found {} pages under {}", pages.len(), root.display());
    Ok(pages)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn has_page_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(ext))
}

fn is_excluded(relative_path: &str, options: &ScanOptions) -> bool {
    if relative_path == options.home_page {
        return true;
    }
    let file_name = relative_path.rsplit('/').next().unwrap_or(relative_path);
    if !relative_path.contains('/') && WIKI_CHROME_PAGES.contains(&file_name) {
        return true;
    }
    options
        .exclude
        .iter()
        .any(|pattern| pattern == relative_path || pattern == file_name)
}

pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{ScanOptions, scan_pages};
    use crate::error::TocError;
    use tempfile::tempdir;

    fn relative_paths(root: &std::path::Path, options: &ScanOptions) -> Vec<String> {
        scan_pages(root, options)
            .expect("scan")
            .into_iter()
            .map(|page| page.relative_path)
            .collect()
    }

    #[test]
    fn scan_skips_home_chrome_hidden_and_non_markdown() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        for name in [
            "Home.md",
            "_Sidebar.md",
            "_Footer.md",
            ".hidden.md",
            "notes.txt",
            "Getting_Started.md",
            "FAQ.md",
            "Upper.MD",
        ] {
            fs::write(root.join(name), "# page\n").expect("write page");
        }
        fs::create_dir_all(root.join(".git")).expect("git dir");
        fs::write(root.join(".git").join("HEAD.md"), "ref").expect("write git file");

        assert_eq!(
            relative_paths(root, &ScanOptions::default()),
            vec!["FAQ.md", "Getting_Started.md", "Upper.MD"]
        );
    }

    #[test]
    fn scan_is_flat_unless_recursive() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        fs::create_dir_all(root.join("guides")).expect("guides dir");
        fs::write(root.join("Top.md"), "").expect("write top");
        fs::write(root.join("guides").join("Install.md"), "").expect("write nested");
        fs::write(root.join("guides").join("Home.md"), "").expect("write nested home");

        assert_eq!(relative_paths(root, &ScanOptions::default()), vec!["Top.md"]);
        assert_eq!(
            relative_paths(
                root,
                &ScanOptions {
                    recursive: true,
                    ..ScanOptions::default()
                }
            ),
            vec!["Top.md", "guides/Home.md", "guides/Install.md"]
        );
    }

    #[test]
    fn scan_honors_custom_home_and_exclusions() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        for name in ["Index.md", "Home.md", "Drafts.md", "Page.markdown"] {
            fs::write(root.join(name), "").expect("write page");
        }

        let options = ScanOptions {
            home_page: "Index.md".to_string(),
            extensions: vec!["md".to_string(), "markdown".to_string()],
            exclude: vec!["Drafts.md".to_string()],
            ..ScanOptions::default()
        };
        assert_eq!(relative_paths(root, &options), vec!["Home.md", "Page.markdown"]);
    }

    #[test]
    fn scan_of_empty_folder_is_empty() {
        let temp = tempdir().expect("tempdir");
        assert!(relative_paths(temp.path(), &ScanOptions::default()).is_empty());
    }

    #[test]
    fn scan_rejects_missing_or_file_root() {
        let temp = tempdir().expect("tempdir");
        let missing = temp.path().join("nope");
        let error = scan_pages(&missing, &ScanOptions::default()).expect_err("must fail");
        assert!(matches!(error, TocError::PathNotFound { .. }));

        let file = temp.path().join("file.md");
        fs::write(&file, "").expect("write file");
        let error = scan_pages(&file, &ScanOptions::default()).expect_err("must fail");
        assert!(matches!(error, TocError::PathNotFound { .. }));
    }
}
