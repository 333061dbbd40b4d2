use super::CandidateFile;
use crate::error::Error;
use glob::Pattern;
use std::path::Path;
use tracing::{error, trace};
use walkdir::WalkDir;

/// Default exclusion predicate: dotfiles, configured globs and, for files,
/// extensions outside the allow-list.
#[derive(Debug, Clone, Default)]
pub struct ScanFilter {
    ignore_patterns: Vec<Pattern>,
    extensions: Vec<String>,
}

impl ScanFilter {
    pub fn new(ignore_globs: &[String], extensions: &[String]) -> Self {
        let ignore_patterns = ignore_globs
            .iter()
            .filter_map(|glob| match Pattern::new(glob) {
                Ok(p) => Some(p),
                Err(e) => {
                    error!("Invalid glob pattern '{}': {}", glob, e);
                    None
                }
            })
            .collect();

        let extensions = extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .collect();

        Self {
            ignore_patterns,
            extensions,
        }
    }

    /// Returns true when `path` should be left out of the listing.
    pub fn excludes(&self, path: &Path, is_dir: bool) -> bool {
        let is_dotfile = path
            .file_name()
            .map(|name| name.to_string_lossy().starts_with('.'))
            .unwrap_or(false);
        if is_dotfile {
            return true;
        }

        if self
            .ignore_patterns
            .iter()
            .any(|pattern| pattern.matches_path(path))
        {
            return true;
        }

        if is_dir || self.extensions.is_empty() {
            return false;
        }

        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) => !self
                .extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext)),
            None => true,
        }
    }
}

/// Lists every non-excluded regular file under `root`, sorted by file name at
/// each level. `exclude` receives `(path, is_dir)`; an excluded directory is
/// not descended into. The root itself is never excluded.
pub fn scan<F>(root: &Path, exclude: F) -> Result<Vec<CandidateFile>, Error>
where
    F: Fn(&Path, bool) -> bool,
{
    if !root.is_dir() {
        return Err(Error::Traversal {
            root: root.to_path_buf(),
            message: "not a directory".to_string(),
        });
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !exclude(entry.path(), entry.file_type().is_dir())
        });

    for entry in walker {
        let entry = entry.map_err(|err| Error::Traversal {
            root: root.to_path_buf(),
            message: err.to_string(),
        })?;

        if entry.file_type().is_file() {
            trace!("Found {}", entry.path().display());
            files.push(CandidateFile::new(entry.into_path()));
        }
    }

    Ok(files)
}
