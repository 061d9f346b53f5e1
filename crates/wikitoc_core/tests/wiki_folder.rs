use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use tempfile::tempdir;
use wikitoc_core::home::{Placement, UpdateOptions};
use wikitoc_core::{TocError, TocOptions, generate_toc, update_home};

fn write_pages(root: &Path, names: &[&str]) {
    for name in names {
        fs::write(root.join(name), format!("# {name}\n\nbody\n")).expect("write page");
    }
}

#[test]
fn every_page_gets_exactly_one_entry() {
    let temp = tempdir().expect("tempdir");
    let root = temp.path();
    let names = ["Alpha.md", "Beta_Page.md", "gamma-notes.md", "Delta.md", "Epsilon.md"];
    write_pages(root, &names);
    fs::write(root.join("Home.md"), "home\n").expect("write home");
    fs::write(root.join("image.png"), [0u8; 4]).expect("write image");

    let report = generate_toc(root, &TocOptions::default()).expect("generate");
    assert_eq!(report.page_count, names.len());
    assert_eq!(report.toc.lines().count(), names.len());

    let links: BTreeSet<&str> = report.pages.iter().map(|page| page.link.as_str()).collect();
    assert_eq!(links.len(), names.len());
    for name in names {
        assert!(links.contains(name), "missing link for {name}");
    }
}

#[test]
fn getting_started_and_faq_example() {
    let temp = tempdir().expect("tempdir");
    write_pages(temp.path(), &["Getting_Started.md", "FAQ.md"]);

    let report = generate_toc(temp.path(), &TocOptions::default()).expect("generate");
    assert_eq!(
        report.toc,
        "- [FAQ](FAQ.md)\n- [Getting Started](Getting_Started.md)\n"
    );
}

#[test]
fn regenerating_unchanged_input_is_byte_identical() {
    let temp = tempdir().expect("tempdir");
    let root = temp.path();
    write_pages(root, &["One.md", "Two.md", "Three.md"]);
    fs::write(root.join("Home.md"), "Welcome\n").expect("write home");

    let first = generate_toc(root, &TocOptions::default()).expect("generate");
    let second = generate_toc(root, &TocOptions::default()).expect("generate");
    assert_eq!(first.toc, second.toc);

    let updated = update_home(root, &TocOptions::default(), &UpdateOptions::default())
        .expect("first update");
    assert!(updated.home.written);
    let after_first = fs::read(root.join("Home.md")).expect("read home");

    let again = update_home(root, &TocOptions::default(), &UpdateOptions::default())
        .expect("second update");
    assert_eq!(again.home.placement, Placement::Replaced);
    assert!(!again.home.changed);
    assert_eq!(fs::read(root.join("Home.md")).expect("read home"), after_first);
}

#[test]
fn content_outside_markers_is_preserved() {
    let temp = tempdir().expect("tempdir");
    let root = temp.path();
    write_pages(root, &["Page.md"]);
    let before = "# Welcome\r\n\r\nIntro paragraph.\r\n";
    let after = "\r\n## Contributing\r\n\r\nSee the repo.";
    fs::write(
        root.join("Home.md"),
        format!("{before}<!--start TOC-->\nstale entry\n<!--end TOC-->\n{after}"),
    )
    .expect("write home");

    update_home(root, &TocOptions::default(), &UpdateOptions::default()).expect("update");

    let home = fs::read_to_string(root.join("Home.md")).expect("read home");
    assert!(home.starts_with(before));
    assert!(home.ends_with(after));
    assert!(home.contains("- [Page](Page.md)\n"));
    assert!(!home.contains("stale entry"));
}

#[test]
fn empty_folder_yields_empty_toc() {
    let temp = tempdir().expect("tempdir");
    let report = generate_toc(temp.path(), &TocOptions::default()).expect("generate");
    assert_eq!(report.page_count, 0);
    assert!(report.toc.is_empty());

    let updated = update_home(temp.path(), &TocOptions::default(), &UpdateOptions::default())
        .expect("update");
    assert_eq!(updated.home.placement, Placement::Created);
}

#[test]
fn missing_folder_is_path_not_found() {
    let temp = tempdir().expect("tempdir");
    let error = generate_toc(&temp.path().join("absent"), &TocOptions::default())
        .expect_err("must fail");
    assert!(matches!(error, TocError::PathNotFound { .. }));
}
