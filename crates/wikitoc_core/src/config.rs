use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TocError};
use crate::home::{Markers, MissingMarkers};
use crate::pipeline::TocOptions;
use crate::scan::ScanOptions;
use crate::title::TitleSource;
use crate::toc::{LinkOptions, RenderOptions};

pub const CONFIG_FILENAME: &str = ".wikitoc.toml";
pub const DEFAULT_HOME_PAGE: &str = "Home.md";
pub const DEFAULT_HEADING: &str = "Table of Contents";
pub const DEFAULT_START_MARKER: &str = "<!--start TOC-->";
pub const DEFAULT_END_MARKER: &str = "<!--end TOC-->";

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct TocConfig {
    #[serde(default)]
    pub toc: TocSection,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct TocSection {
    pub home_page: Option<String>,
    pub title_source: Option<TitleSource>,
    pub heading: Option<String>,
    pub link_prefix: Option<String>,
    pub strip_extension: Option<bool>,
    pub recursive: Option<bool>,
    pub group_by_tags: Option<bool>,
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    pub start_marker: Option<String>,
    pub end_marker: Option<String>,
    pub missing_markers: Option<MissingMarkers>,
}

/// Source of `WIKITOC_*` overrides.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

pub fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

impl TocConfig {
    /// Resolve the Home page file name: env WIKITOC_HOME_PAGE > config > DEFAULT_HOME_PAGE.
    pub fn home_page(&self, env: EnvLookup<'_>) -> String {
        if let Some(value) = env_value(env, "WIKITOC_HOME_PAGE") {
            return value;
        }
        self.toc
            .home_page
            .clone()
            .unwrap_or_else(|| DEFAULT_HOME_PAGE.to_string())
    }

    /// Resolve the title source: env WIKITOC_TITLE_SOURCE > config > filename.
    /// An unparsable env value is ignored with a warning.
    pub fn title_source(&self, env: EnvLookup<'_>) -> TitleSource {
        if let Some(value) = env_value(env, "WIKITOC_TITLE_SOURCE") {
            match value.parse() {
                Ok(source) => return source,
                Err(err) => log::warn!("ignoring WIKITOC_TITLE_SOURCE: {err}"),
            }
        }
        self.toc.title_source.unwrap_or_default()
    }

    /// Resolve the link prefix: env WIKITOC_LINK_PREFIX > config > empty.
    pub fn link_prefix(&self, env: EnvLookup<'_>) -> String {
        if let Some(value) = env_value(env, "WIKITOC_LINK_PREFIX") {
            return value;
        }
        self.toc.link_prefix.clone().unwrap_or_default()
    }

    /// An empty `heading` in the config disables the heading line.
    pub fn heading(&self) -> Option<String> {
        match self.toc.heading.as_deref() {
            None => Some(DEFAULT_HEADING.to_string()),
            Some(value) if value.trim().is_empty() => None,
            Some(value) => Some(value.trim().to_string()),
        }
    }

    pub fn markers(&self) -> Markers {
        Markers {
            start: self
                .toc
                .start_marker
                .clone()
                .unwrap_or_else(|| DEFAULT_START_MARKER.to_string()),
            end: self
                .toc
                .end_marker
                .clone()
                .unwrap_or_else(|| DEFAULT_END_MARKER.to_string()),
        }
    }

    /// Options with `WIKITOC_*` overrides taken from `env`, e.g. [`process_env`].
    pub fn to_options_with_env(&self, env: EnvLookup<'_>) -> TocOptions {
        let defaults = ScanOptions::default();
        TocOptions {
            scan: ScanOptions {
                home_page: self.home_page(env),
                recursive: self.toc.recursive.unwrap_or(false),
                extensions: if self.toc.extensions.is_empty() {
                    defaults.extensions
                } else {
                    self.toc
                        .extensions
                        .iter()
                        .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                        .collect()
                },
                exclude: self.toc.exclude.clone(),
            },
            title_source: self.title_source(env),
            link: LinkOptions {
                prefix: self.link_prefix(env),
                strip_extension: self.toc.strip_extension.unwrap_or(false),
            },
            render: RenderOptions {
                heading: self.heading(),
                group_by_tags: self.toc.group_by_tags.unwrap_or(false),
            },
            markers: self.markers(),
            missing_markers: self.toc.missing_markers.unwrap_or_default(),
        }
    }
}

/// Load and parse a TocConfig from a TOML file. Returns default if file doesn't exist.
pub fn load_config(config_path: &Path) -> Result<TocConfig> {
    if !config_path.exists() {
        log::debug!("no config at {}, using defaults", config_path.display());
        return Ok(TocConfig::default());
    }
    let content =
        fs::read_to_string(config_path).map_err(|err| TocError::read(config_path, err))?;
    let parsed: TocConfig = toml::from_str(&content).map_err(|err| TocError::Config {
        path: config_path.to_path_buf(),
        reason: err.to_string().trim().to_string(),
    })?;
    validate(config_path, &parsed)?;
    Ok(parsed)
}

fn validate(config_path: &Path, config: &TocConfig) -> Result<()> {
    let markers = config.markers();
    if markers.start.trim().is_empty() || markers.end.trim().is_empty() {
        return Err(TocError::Config {
            path: config_path.to_path_buf(),
            reason: "TOC markers cannot be empty".to_string(),
        });
    }
    if markers.start.trim() == markers.end.trim() {
        return Err(TocError::Config {
            path: config_path.to_path_buf(),
            reason: "start and end markers must differ".to_string(),
        });
    }
    if let Some(home) = &config.toc.home_page
        && home.trim().is_empty()
    {
        return Err(TocError::Config {
            path: config_path.to_path_buf(),
            reason: "home_page cannot be empty".to_string(),
        });
    }
    Ok(())
}

fn env_value(env: EnvLookup<'_>, key: &str) -> Option<String> {
    let value = env(key)?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
