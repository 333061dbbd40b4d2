//! Ingestion: walks each source tree and drives every file through
//! classify → content digest → copy → fingerprint, keeping the index and the
//! destination in step. Files are handled strictly one at a time.

mod outcome;

pub use outcome::{FileOutcome, FileRecord, RunReport, RunSummary, Stage, TreeFailure};

use crate::classifier::{self, Classification};
use crate::config::AppConfig;
use crate::destination::Destination;
use crate::error::Error;
use crate::identity::{ContentDigest, FingerprintDigest, IdentityEngine};
use crate::index::{DedupIndex, DuplicateDescriptor};
use crate::media::{FfprobeProbe, FingerprintExtractor, FpcalcExtractor, MediaInfo, MediaProbe};
use crate::progress::ProgressReporter;
use crate::scanner::{self, CandidateFile, ScanFilter};
use crate::stats::StatsTimer;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

pub struct Pipeline {
    index: DedupIndex,
    destination: Destination,
    probe: Box<dyn MediaProbe>,
    identity: IdentityEngine,
    filter: ScanFilter,
    /// Never walked even when nested in a source tree.
    excluded_roots: Vec<PathBuf>,
}

impl Pipeline {
    pub fn new(
        index: DedupIndex,
        destination: Destination,
        probe: Box<dyn MediaProbe>,
        extractor: Box<dyn FingerprintExtractor>,
        filter: ScanFilter,
    ) -> Self {
        let excluded_roots = vec![canonical_or_self(destination.root())];
        Self {
            index,
            destination,
            probe,
            identity: IdentityEngine::new(extractor),
            filter,
            excluded_roots,
        }
    }

    /// Opens the index and destination named by `config` and wires in the
    /// ffprobe and fpcalc collaborators.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let index_dir = PathBuf::from(&config.index_dir);
        let index = DedupIndex::open(&index_dir)?;
        let destination = Destination::open(&config.destination)?;
        let filter = ScanFilter::new(&config.ignore_patterns, &config.extensions);

        let mut pipeline = Self::new(
            index,
            destination,
            Box::new(FfprobeProbe::new(config.ffprobe_path.clone())),
            Box::new(FpcalcExtractor::new(config.fpcalc_path.clone())),
            filter,
        );
        pipeline.exclude_root(&index_dir);
        Ok(pipeline)
    }

    pub fn exclude_root(&mut self, root: &Path) {
        self.excluded_roots.push(canonical_or_self(root));
    }

    pub fn index(&self) -> &DedupIndex {
        &self.index
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    /// Processes every root in order, saving the index after each one and once
    /// more at the end. Per-file and per-tree failures land in the report.
    pub fn run(&mut self, roots: &[PathBuf], reporter: &dyn ProgressReporter) -> RunReport {
        let mut report = RunReport::new();

        for root in roots {
            report.trees.push(root.clone());
            if let Err(err) = self.process_tree(root, reporter, &mut report) {
                error!("Error processing tree {}: {}", root.display(), err);
                reporter.on_tree_failed(root, &err);
                report.record_tree_failure(root, &err);
            }
            self.save_point();
        }

        self.save_point();
        report.finish();
        report
    }

    /// Only a traversal failure is returned; per-file failures are outcomes.
    /// Returns the number of files processed.
    pub fn process_tree(
        &mut self,
        root: &Path,
        reporter: &dyn ProgressReporter,
        report: &mut RunReport,
    ) -> Result<usize, Error> {
        info!("Scanning: {}", root.display());
        let timer = StatsTimer::new();

        let canonical_root = canonical_or_self(root);
        if let Some(excluded) = self
            .excluded_roots
            .iter()
            .find(|ex| canonical_root.starts_with(ex))
        {
            return Err(Error::Traversal {
                root: root.to_path_buf(),
                message: format!("source lies inside {}", excluded.display()),
            });
        }

        let filter = &self.filter;
        let excluded_roots = &self.excluded_roots;
        let files = scanner::scan(root, |path, is_dir| {
            filter.excludes(path, is_dir)
                || (is_dir && {
                    let canonical = canonical_or_self(path);
                    excluded_roots.iter().any(|ex| canonical.starts_with(ex))
                })
        })?;
        info!("Files: {}", files.len());
        reporter.on_tree_start(root, files.len());

        for file in &files {
            let outcome = self.process_file(file);
            reporter.on_file_complete(file.path(), &outcome);
            report.record(root, file.path(), outcome);
        }

        match self.index.counts() {
            Ok(counts) => info!("Unique hashes: {}", counts.content_keys),
            Err(err) => error!("Error counting index keys: {}", err),
        }
        reporter.on_tree_complete(root, files.len(), timer.get_duration_secs());
        Ok(files.len())
    }

    /// Runs one file through the state machine to a terminal outcome.
    pub fn process_file(&mut self, file: &CandidateFile) -> FileOutcome {
        let path = match file.index_path() {
            Ok(path) => path,
            Err(err) => {
                error!("Error processing {}: {}", file.path().display(), err);
                return FileOutcome::skipped(Stage::Path, &err);
            }
        };

        let media = match classifier::classify(self.probe.as_ref(), file, self.index.ignored_mut())
        {
            Ok(Classification::Audio(media)) => media,
            Ok(Classification::NonAudio) => return FileOutcome::Ignored,
            Err(err) => {
                error!("Error probing {}: {}", path, err);
                return FileOutcome::skipped(Stage::Probe, &err);
            }
        };

        let content = match self.identity.content_digest(file.path()) {
            Ok(digest) => digest,
            Err(err) => {
                error!("Error hashing {}: {}", path, err);
                return FileOutcome::skipped(Stage::ContentDigest, &err);
            }
        };

        match self.index.content_paths(&content) {
            Ok(Some(paths)) => self.record_exact_duplicate(&content, path, paths),
            Ok(None) => self.ingest_first_seen(file, path, &content, media),
            Err(err) => {
                error!("Error reading content index for {}: {}", path, err);
                FileOutcome::skipped(Stage::ContentIndex, &err)
            }
        }
    }

    fn record_exact_duplicate(
        &mut self,
        content: &ContentDigest,
        path: &str,
        paths: Vec<String>,
    ) -> FileOutcome {
        let already_indexed = paths.iter().any(|p| p == path);
        let first_path = paths.into_iter().next().unwrap_or_default();

        if already_indexed {
            debug!("{} - {} - ALREADY INDEXED", content, path);
        } else {
            debug!("{} - {} - DUPLICATE of {}", content, path, first_path);
            if let Err(err) = self.index.record_content(content, path) {
                error!("Error recording duplicate {}: {}", path, err);
                return FileOutcome::skipped(Stage::ContentIndex, &err);
            }
        }

        FileOutcome::ExactDuplicate {
            first_path,
            already_indexed,
        }
    }

    fn ingest_first_seen(
        &mut self,
        file: &CandidateFile,
        path: &str,
        content: &ContentDigest,
        media: MediaInfo,
    ) -> FileOutcome {
        let copied = match self.destination.copy_in(file.path()) {
            Ok(target) => target,
            Err(err) => {
                error!("Error copying {}: {}", path, err);
                return FileOutcome::skipped(Stage::Copy, &err);
            }
        };
        debug!("Copied {} to {}", path, copied.display());

        if let Err(err) = self.index.record_content(content, path) {
            // an unindexed copy would be copied again next run
            error!("Error recording {} in content index: {}", path, err);
            if let Err(rm_err) = self.destination.remove(&copied) {
                error!("Error rolling back copy {}: {}", copied.display(), rm_err);
            }
            return FileOutcome::skipped(Stage::ContentIndex, &err);
        }

        let fingerprint = match self.identity.fingerprint_digest(file.path()) {
            Ok(digest) => digest,
            Err(err) => {
                error!("Error fingerprinting {}: {}", path, err);
                return FileOutcome::skipped(Stage::Fingerprint, &err);
            }
        };

        self.record_fingerprint(path, &fingerprint, copied, media)
    }

    /// `media` is the classification probe, reused as the duplicate
    /// descriptor.
    fn record_fingerprint(
        &mut self,
        path: &str,
        fingerprint: &FingerprintDigest,
        copied: PathBuf,
        media: MediaInfo,
    ) -> FileOutcome {
        let seen_before = match self.index.fingerprint_paths(fingerprint) {
            Ok(paths) => paths.is_some(),
            Err(err) => {
                error!("Error reading fingerprint index for {}: {}", path, err);
                return FileOutcome::skipped(Stage::FingerprintIndex, &err);
            }
        };

        if let Err(err) = self.index.record_fingerprint(fingerprint, path) {
            error!("Error recording {} in fingerprint index: {}", path, err);
            return FileOutcome::skipped(Stage::FingerprintIndex, &err);
        }

        if !seen_before {
            return FileOutcome::Unique {
                destination: copied,
            };
        }

        debug!("{} - {} - ACOUSTIC DUPLICATE", fingerprint, path);
        let descriptor = DuplicateDescriptor {
            path: path.to_string(),
            media,
        };
        let metadata_recorded = match self.index.record_duplicate(fingerprint, descriptor) {
            Ok(_) => true,
            Err(err) => {
                warn!("Error recording duplicate metadata for {}: {}", path, err);
                false
            }
        };

        FileOutcome::AcousticDuplicate {
            destination: copied,
            metadata_recorded,
        }
    }

    fn save_point(&mut self) {
        match self.index.persist() {
            Ok(()) => debug!("Index persisted"),
            Err(err) => error!("Error persisting index: {}", err),
        }
    }
}

fn canonical_or_self(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
