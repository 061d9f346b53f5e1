use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T, E = TocError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum TocError {
    #[error("wiki folder not found or not a directory: {}", path.display())]
    PathNotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    ReadError { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", path.display())]
    WriteError { path: PathBuf, source: io::Error },

    #[error("malformed TOC markers in {}: {reason}", path.display())]
    MalformedMarkers { path: PathBuf, reason: String },

    #[error("invalid config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

impl TocError {
    pub(crate) fn read(path: &Path, source: io::Error) -> Self {
        Self::ReadError {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn write(path: &Path, source: io::Error) -> Self {
        Self::WriteError {
            path: path.to_path_buf(),
            source,
        }
    }
}
