mod walk;

pub use walk::{scan, ScanFilter};

use crate::error::Error;
use std::path::{Path, PathBuf};

/// A file found during traversal, waiting to be classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub extension: Option<String>,
}

impl CandidateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        Self { path, extension }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn basename(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// The path as recorded in the indexes. Paths that are not valid UTF-8
    /// have no lossless string form and are refused.
    pub fn index_path(&self) -> Result<&str, Error> {
        self.path.to_str().ok_or_else(|| Error::NonUtf8Path {
            path: self.path.clone(),
        })
    }
}
