//! The dedup index: content, fingerprint and duplicate-metadata collections
//! plus the ignored list, all persisted under one directory.

mod collection;
mod ignored;
pub mod kv;

pub use collection::{AppendPolicy, Collection};
pub use ignored::{write_json_array, IgnoredList};
pub use kv::{KvStore, MemoryStore, RocksStore};

use crate::error::Error;
use crate::identity::{ContentDigest, FingerprintDigest};
use crate::media::MediaInfo;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const FILE_INDEX_DIR: &str = "file-index";
pub const FINGERPRINT_INDEX_DIR: &str = "fingerprint-index";
pub const DUPLICATE_INDEX_DIR: &str = "duplicate-index";
pub const IGNORED_INDEX_FILE: &str = "ignored-index.json";

/// Probe output for one acoustic duplicate, kept for human review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateDescriptor {
    pub path: String,
    #[serde(flatten)]
    pub media: MediaInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexCounts {
    pub content_keys: usize,
    pub fingerprint_keys: usize,
    pub duplicate_keys: usize,
    pub ignored_paths: usize,
}

impl fmt::Display for IndexCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} content keys, {} fingerprint keys, {} duplicate keys, {} ignored paths",
            self.content_keys, self.fingerprint_keys, self.duplicate_keys, self.ignored_paths
        )
    }
}

pub struct DedupIndex {
    content: Collection<String>,
    fingerprints: Collection<String>,
    duplicates: Collection<DuplicateDescriptor>,
    ignored: IgnoredList,
}

impl DedupIndex {
    /// Opens (creating when absent) every collection under `dir`.
    pub fn open(dir: &Path) -> Result<Self, Error> {
        fs::create_dir_all(dir)?;
        info!("Opening index at '{}'", dir.display());

        let index = Self::from_parts(
            Box::new(RocksStore::open(&dir.join(FILE_INDEX_DIR))?),
            Box::new(RocksStore::open(&dir.join(FINGERPRINT_INDEX_DIR))?),
            Box::new(RocksStore::open(&dir.join(DUPLICATE_INDEX_DIR))?),
            IgnoredList::load(&dir.join(IGNORED_INDEX_FILE))?,
        );
        debug!("Index opened: {}", index.counts()?);
        Ok(index)
    }

    /// Everything in memory; the ignored list still saves to `ignored_path`.
    pub fn in_memory(ignored_path: &Path) -> Result<Self, Error> {
        Ok(Self::from_parts(
            Box::new(MemoryStore::new()),
            Box::new(MemoryStore::new()),
            Box::new(MemoryStore::new()),
            IgnoredList::load(ignored_path)?,
        ))
    }

    pub fn from_parts(
        content: Box<dyn KvStore>,
        fingerprints: Box<dyn KvStore>,
        duplicates: Box<dyn KvStore>,
        ignored: IgnoredList,
    ) -> Self {
        Self {
            content: Collection::new(FILE_INDEX_DIR, content, AppendPolicy::AppendIfAbsent),
            fingerprints: Collection::new(
                FINGERPRINT_INDEX_DIR,
                fingerprints,
                AppendPolicy::AlwaysAppend,
            ),
            duplicates: Collection::new(DUPLICATE_INDEX_DIR, duplicates, AppendPolicy::AlwaysAppend),
            ignored,
        }
    }

    pub fn content_paths(&self, digest: &ContentDigest) -> Result<Option<Vec<String>>, Error> {
        self.content.lookup(&digest.to_hex())
    }

    pub fn record_content(&self, digest: &ContentDigest, path: &str) -> Result<Vec<String>, Error> {
        self.content.upsert(&digest.to_hex(), path.to_string())
    }

    pub fn fingerprint_paths(
        &self,
        digest: &FingerprintDigest,
    ) -> Result<Option<Vec<String>>, Error> {
        self.fingerprints.lookup(&digest.to_hex())
    }

    pub fn record_fingerprint(
        &self,
        digest: &FingerprintDigest,
        path: &str,
    ) -> Result<Vec<String>, Error> {
        self.fingerprints.upsert(&digest.to_hex(), path.to_string())
    }

    pub fn duplicate_descriptors(
        &self,
        digest: &FingerprintDigest,
    ) -> Result<Option<Vec<DuplicateDescriptor>>, Error> {
        self.duplicates.lookup(&digest.to_hex())
    }

    pub fn record_duplicate(
        &self,
        digest: &FingerprintDigest,
        descriptor: DuplicateDescriptor,
    ) -> Result<Vec<DuplicateDescriptor>, Error> {
        self.duplicates.upsert(&digest.to_hex(), descriptor)
    }

    pub fn content_index(&self) -> &Collection<String> {
        &self.content
    }

    pub fn fingerprint_index(&self) -> &Collection<String> {
        &self.fingerprints
    }

    pub fn duplicate_index(&self) -> &Collection<DuplicateDescriptor> {
        &self.duplicates
    }

    pub fn ignored(&self) -> &IgnoredList {
        &self.ignored
    }

    pub fn ignored_mut(&mut self) -> &mut IgnoredList {
        &mut self.ignored
    }

    pub fn counts(&self) -> Result<IndexCounts, Error> {
        Ok(IndexCounts {
            content_keys: self.content.len()?,
            fingerprint_keys: self.fingerprints.len()?,
            duplicate_keys: self.duplicates.len()?,
            ignored_paths: self.ignored.len(),
        })
    }

    /// Save-point: flush every store and rewrite the ignored list.
    pub fn persist(&mut self) -> Result<(), Error> {
        self.content.flush()?;
        self.fingerprints.flush()?;
        self.duplicates.flush()?;
        self.ignored.save()?;
        Ok(())
    }
}

/// Where each collection of an index directory lives.
pub fn index_paths(dir: &Path) -> [PathBuf; 4] {
    [
        dir.join(FILE_INDEX_DIR),
        dir.join(FINGERPRINT_INDEX_DIR),
        dir.join(DUPLICATE_INDEX_DIR),
        dir.join(IGNORED_INDEX_FILE),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::StreamInfo;
    use tempfile::tempdir;

    fn digest_of(bytes: &[u8], dir: &Path) -> ContentDigest {
        let path = dir.join("blob");
        fs::write(&path, bytes).unwrap();
        crate::identity::content_digest(&path).unwrap()
    }

    #[test]
    fn test_open_creates_layout_and_persists() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("index");
        let content = digest_of(b"abc", tmp.path());
        let fingerprint = FingerprintDigest::from_fingerprint("AQAD");

        {
            let mut index = DedupIndex::open(&dir).unwrap();
            assert_eq!(index.counts().unwrap(), IndexCounts::default());
            index.record_content(&content, "/src/a.mp3").unwrap();
            index.record_fingerprint(&fingerprint, "/src/a.mp3").unwrap();
            index.ignored_mut().append("/src/cover.jpg");
            index.persist().unwrap();
        }

        for path in index_paths(&dir) {
            assert!(path.exists(), "{} should exist", path.display());
        }

        let index = DedupIndex::open(&dir).unwrap();
        assert_eq!(
            index.content_paths(&content).unwrap(),
            Some(vec!["/src/a.mp3".to_string()])
        );
        assert_eq!(
            index.fingerprint_paths(&fingerprint).unwrap(),
            Some(vec!["/src/a.mp3".to_string()])
        );
        assert_eq!(index.ignored().entries(), &["/src/cover.jpg"]);
        assert_eq!(
            index.counts().unwrap(),
            IndexCounts {
                content_keys: 1,
                fingerprint_keys: 1,
                duplicate_keys: 0,
                ignored_paths: 1,
            }
        );
    }

    #[test]
    fn test_duplicate_descriptors_flatten_media() {
        let tmp = tempdir().unwrap();
        let index = DedupIndex::in_memory(&tmp.path().join(IGNORED_INDEX_FILE)).unwrap();
        let fingerprint = FingerprintDigest::from_fingerprint("AQAD");
        let descriptor = DuplicateDescriptor {
            path: "/src/track.mp3".to_string(),
            media: MediaInfo {
                streams: vec![StreamInfo::of_kind("audio")],
                format: None,
            },
        };

        index.record_duplicate(&fingerprint, descriptor.clone()).unwrap();
        let stored = index.duplicate_descriptors(&fingerprint).unwrap().unwrap();
        assert_eq!(stored, vec![descriptor.clone()]);

        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["path"], "/src/track.mp3");
        assert_eq!(json["streams"][0]["codec_type"], "audio");
    }
}
