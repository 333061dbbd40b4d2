//! Consistency checks between the index, the source trees and the
//! destination.

use crate::destination::Destination;
use crate::error::Error;
use crate::index::{write_json_array, DedupIndex};
use crate::scanner::{self, ScanFilter};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditResult {
    pub total: usize,
    /// Canonical (first) source paths with no destination copy.
    pub missing: Vec<String>,
}

/// Checks every content-index entry for a destination file carrying the
/// basename of its first recorded path.
pub fn audit_destination(index: &DedupIndex, destination: &Destination) -> Result<AuditResult, Error> {
    let present: HashSet<String> = destination.original_basenames()?.into_iter().collect();
    let mut result = AuditResult::default();

    for (_digest, paths) in index.content_index().entries()? {
        let Some(first) = paths.first() else {
            continue;
        };
        result.total += 1;
        if !present.contains(&basename_of(first)) {
            result.missing.push(first.clone());
        }
    }

    info!("Missing: {}", result.missing.len());
    info!("Total: {}", result.total);
    Ok(result)
}

/// Lists source files whose basename has no counterpart in the destination,
/// rewriting `output` after each tree. A tree that fails to scan is logged
/// and skipped.
pub fn find_missing(
    roots: &[PathBuf],
    filter: &ScanFilter,
    destination: &Destination,
    output: &Path,
) -> Result<Vec<String>, Error> {
    let present: HashSet<String> = destination.original_basenames()?.into_iter().collect();
    let mut missing: Vec<String> = Vec::new();

    for root in roots {
        info!("Scanning: {}", root.display());
        let files = match scanner::scan(root, |path, is_dir| filter.excludes(path, is_dir)) {
            Ok(files) => files,
            Err(err) => {
                error!("Error scanning {}: {}", root.display(), err);
                continue;
            }
        };
        info!("Files: {}", files.len());

        missing.extend(
            files
                .iter()
                .filter(|file| !present.contains(&file.basename()))
                .filter_map(|file| match file.index_path() {
                    Ok(path) => Some(path.to_string()),
                    Err(err) => {
                        warn!("{}", err);
                        None
                    }
                }),
        );

        info!("Saving missing index: {}", missing.len());
        write_json_array(output, &missing)?;
    }

    write_json_array(output, &missing)?;
    Ok(missing)
}

fn basename_of(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::content_digest;
    use crate::index::IGNORED_INDEX_FILE;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_audit_finds_entries_without_copies() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("kept.mp3"), b"kept").unwrap();
        fs::write(src.join("lost.mp3"), b"lost").unwrap();

        let dest = Destination::open(tmp.path().join("dest")).unwrap();
        dest.copy_in(&src.join("kept.mp3")).unwrap();

        let index = DedupIndex::in_memory(&tmp.path().join(IGNORED_INDEX_FILE)).unwrap();
        for name in ["kept.mp3", "lost.mp3"] {
            let path = src.join(name);
            let digest = content_digest(&path).unwrap();
            index
                .record_content(&digest, &path.to_string_lossy())
                .unwrap();
        }

        let result = audit_destination(&index, &dest).unwrap();
        assert_eq!(result.total, 2);
        assert_eq!(
            result.missing,
            vec![src.join("lost.mp3").to_string_lossy().into_owned()]
        );
    }

    #[test]
    fn test_find_missing_writes_json() {
        let tmp = tempdir().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.mp3"), b"a").unwrap();
        fs::write(src.join("b.mp3"), b"b").unwrap();

        let dest = Destination::open(tmp.path().join("dest")).unwrap();
        dest.copy_in(&src.join("a.mp3")).unwrap();

        let output = tmp.path().join("missing-index.json");
        let missing = find_missing(
            &[src.clone(), tmp.path().join("absent")],
            &ScanFilter::default(),
            &dest,
            &output,
        )
        .unwrap();

        let expected = vec![src.join("b.mp3").to_string_lossy().into_owned()];
        assert_eq!(missing, expected);
        let saved: Vec<String> = serde_json::from_slice(&fs::read(&output).unwrap()).unwrap();
        assert_eq!(saved, expected);
    }
}
