use crate::error::Error;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Paths classified as non-audio, kept as one JSON array file in first-seen
/// order.
#[derive(Debug)]
pub struct IgnoredList {
    path: PathBuf,
    entries: Vec<String>,
    seen: HashSet<String>,
    /// Set when the file on disk is behind `entries` or does not exist yet.
    dirty: bool,
}

impl IgnoredList {
    /// A missing file is an empty list; an unreadable or corrupt one is an error.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let (loaded, dirty): (Vec<String>, bool) = match fs::read(path) {
            Ok(raw) => (serde_json::from_slice(&raw)?, false),
            Err(e) if e.kind() == ErrorKind::NotFound => (Vec::new(), true),
            Err(e) => return Err(e.into()),
        };
        debug!("Loaded {} ignored paths from '{}'", loaded.len(), path.display());

        let mut list = Self {
            path: path.to_path_buf(),
            entries: Vec::with_capacity(loaded.len()),
            seen: HashSet::with_capacity(loaded.len()),
            dirty,
        };
        for entry in loaded {
            if list.seen.insert(entry.clone()) {
                list.entries.push(entry);
            } else {
                list.dirty = true;
            }
        }
        Ok(list)
    }

    /// Returns false when the path was already listed.
    pub fn append(&mut self, path: &str) -> bool {
        if !self.seen.insert(path.to_string()) {
            return false;
        }
        self.entries.push(path.to_string());
        self.dirty = true;
        true
    }

    pub fn contains(&self, path: &str) -> bool {
        self.seen.contains(path)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrites the whole file when anything changed since the last save.
    pub fn save(&mut self) -> Result<(), Error> {
        if !self.dirty {
            debug!("Ignored index unchanged, not rewriting");
            return Ok(());
        }
        info!("Saving ignored index: {}", self.entries.len());
        write_json_array(&self.path, &self.entries)?;
        self.dirty = false;
        Ok(())
    }
}

/// Writes `values` as a pretty JSON array, replacing the file atomically.
pub fn write_json_array<T: Serialize>(path: &Path, values: &[T]) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("json.tmp");
    let mut raw = serde_json::to_vec_pretty(values)?;
    raw.push(b'\n');
    fs::write(&tmp_path, raw)?;
    fs::rename(&tmp_path, path).map_err(|e| {
        io::Error::new(e.kind(), format!("Error replacing {}: {}", path.display(), e))
    })?;
    Ok(())
}
