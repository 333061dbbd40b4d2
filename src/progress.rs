use crate::error::Error;
use crate::pipeline::FileOutcome;
use std::path::Path;

/// Trait for reporting ingestion progress.
///
/// The CLI implements it with an indicatif bar; tests use [`SilentReporter`].
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_tree_start(&self, _root: &Path, _files: usize) {}
    fn on_file_complete(&self, _path: &Path, _outcome: &FileOutcome) {}
    fn on_tree_complete(&self, _root: &Path, _files: usize, _duration_secs: f64) {}
    fn on_tree_failed(&self, _root: &Path, _error: &Error) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
