//! Table of contents generation for a cloned Markdown wiki.
//!
//! The pipeline scans a wiki folder for pages ([`scan`]), derives a title for
//! each ([`title`]), renders a Markdown list ([`toc`]) and optionally splices
//! it into the Home page between marker comments ([`home`]).

pub mod config;
pub mod error;
pub mod home;
pub mod pipeline;
pub mod scan;
pub mod tags;
pub mod title;
pub mod toc;

pub use error::{Result, TocError};
pub use pipeline::{HomeReport, TocOptions, TocReport, collect_pages, generate_toc, update_home};
