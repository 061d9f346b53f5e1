use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::{Result, TocError};
use crate::home::{HomeUpdate, Markers, MissingMarkers, UpdateOptions, update_home_page};
use crate::scan::{ScanOptions, ScannedPage, scan_pages};
use crate::tags::parse_tags;
use crate::title::{TitleSource, derive_title};
use crate::toc::{LinkOptions, RenderOptions, TableOfContents, WikiPage, page_link};

#[derive(Debug, Clone, Default)]
pub struct TocOptions {
    pub scan: ScanOptions,
    pub title_source: TitleSource,
    pub link: LinkOptions,
    pub render: RenderOptions,
    pub markers: Markers,
    pub missing_markers: MissingMarkers,
}

impl TocOptions {
    fn needs_content(&self) -> bool {
        self.title_source == TitleSource::Heading || self.render.group_by_tags
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TocReport {
    pub wiki_dir: String,
    pub page_count: usize,
    pub pages: Vec<WikiPage>,
    /// Rendered TOC body (no markers).
    pub toc: String,
    #[serde(skip)]
    pub table: TableOfContents,
}

#[derive(Debug, Clone, Serialize)]
pub struct HomeReport {
    #[serde(flatten)]
    pub toc: TocReport,
    pub home: HomeUpdate,
}

/// Scan `root` and build the table of contents.
pub fn collect_pages(root: &Path, options: &TocOptions) -> Result<TableOfContents> {
    let scanned = scan_pages(root, &options.scan)?;
    let mut pages = Vec::with_capacity(scanned.len());
    for page in scanned {
        pages.push(build_page(page, options)?);
    }
    Ok(TableOfContents::from_pages(pages))
}

fn build_page(scanned: ScannedPage, options: &TocOptions) -> Result<WikiPage> {
    let content = if options.needs_content() {
        Some(read_page(&scanned.path)?)
    } else {
        None
    };
    let title = derive_title(
        &scanned.relative_path,
        content.as_deref(),
        options.title_source,
    );
    let tags = if options.render.group_by_tags {
        content.as_deref().map(parse_tags).unwrap_or_default()
    } else {
        Vec::new()
    };
    log::debug!("{} -> {title:?}", scanned.relative_path);

    Ok(WikiPage {
        link: page_link(&scanned.relative_path, &options.link),
        path: scanned.path,
        relative_path: scanned.relative_path,
        title,
        tags,
    })
}

/// Pages are decoded lossily; a stray invalid byte should not stop the run.
fn read_page(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|err| TocError::read(path, err))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn generate_toc(root: &Path, options: &TocOptions) -> Result<TocReport> {
    let table = collect_pages(root, options)?;
    Ok(TocReport {
        wiki_dir: root.to_string_lossy().replace('\\', "/"),
        page_count: table.len(),
        pages: table.pages().to_vec(),
        toc: table.render(&options.render),
        table,
    })
}

/// Generate the TOC and splice it into the Home page of `root`.
pub fn update_home(
    root: &Path,
    options: &TocOptions,
    update: &UpdateOptions,
) -> Result<HomeReport> {
    let report = generate_toc(root, options)?;
    let block = report.table.render_block(&options.render, &options.markers);
    let home_path = root.join(&options.scan.home_page);
    let home = update_home_page(
        &home_path,
        &block,
        &options.markers,
        options.missing_markers,
        update,
    )?;
    Ok(HomeReport { toc: report, home })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use tempfile::tempdir;

    #[test]
    fn heading_titles_and_tags_are_read_from_content() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        fs::write(root.join("a.md"), "# Alpha Page\nTags: Guides\n").expect("write a");
        fs::write(root.join("b.md"), "no heading\n").expect("write b");

        let options = TocOptions {
            title_source: TitleSource::Heading,
            render: RenderOptions {
                heading: None,
                group_by_tags: true,
            },
            ..TocOptions::default()
        };
        let table = collect_pages(root, &options).expect("collect");
        let titles: Vec<&str> = table.pages().iter().map(|page| page.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha Page", "b"]);
        assert_eq!(table.pages()[0].tags, vec!["Guides".to_string()]);
        assert_eq!(
            table.render(&options.render),
            "- [b](b.md)\n\n# Guides\n\n- [Alpha Page](a.md)\n"
        );
    }

    #[test]
    fn filename_mode_does_not_need_readable_content() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        fs::write(root.join("Page.md"), [0xff, 0xfe, 0x00]).expect("write page");

        let report = generate_toc(root, &TocOptions::default()).expect("generate");
        assert_eq!(report.page_count, 1);
        assert_eq!(report.toc, "- [Page](Page.md)\n");
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily_in_heading_mode() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        fs::write(root.join("Page.md"), b"# Caf\xe9\n").expect("write page");

        let options = TocOptions {
            title_source: TitleSource::Heading,
            ..TocOptions::default()
        };
        let report = generate_toc(root, &options).expect("generate");
        assert_eq!(report.pages[0].title, "Caf\u{fffd}");
    }

    #[test]
    fn update_home_uses_configured_home_page() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        fs::write(root.join("Index.md"), "Hello\n").expect("write index");
        fs::write(root.join("Page.md"), "").expect("write page");

        let options = TocOptions {
            scan: ScanOptions {
                home_page: "Index.md".to_string(),
                ..ScanOptions::default()
            },
            ..TocOptions::default()
        };
        let report = update_home(root, &options, &UpdateOptions::default()).expect("update");
        assert_eq!(report.toc.page_count, 1);
        assert!(report.home.written);
        assert_eq!(
            fs::read_to_string(root.join("Index.md")).expect("read index"),
            "Hello\n\n<!--start TOC-->\n\n# Table of Contents\n\n- [Page](Page.md)\n<!--end TOC-->\n"
        );
    }
}
