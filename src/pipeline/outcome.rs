use crate::error::Error;
use crate::stats::StatsTimer;
use chrono::{DateTime, Local};
use colored::*;
use serde::Serialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// The step of the per-file state machine where processing stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Path,
    Probe,
    ContentDigest,
    Copy,
    ContentIndex,
    Fingerprint,
    FingerprintIndex,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Path => "path",
            Stage::Probe => "probe",
            Stage::ContentDigest => "content-digest",
            Stage::Copy => "copy",
            Stage::ContentIndex => "content-index",
            Stage::Fingerprint => "fingerprint",
            Stage::FingerprintIndex => "fingerprint-index",
        };
        f.write_str(name)
    }
}

/// Terminal state of one file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Ignored,
    Unique {
        destination: PathBuf,
    },
    /// Bytes already indexed. `already_indexed` is set when this very path was
    /// recorded by an earlier run.
    ExactDuplicate {
        first_path: String,
        already_indexed: bool,
    },
    AcousticDuplicate {
        destination: PathBuf,
        metadata_recorded: bool,
    },
    Skipped {
        stage: Stage,
        reason: String,
    },
}

impl FileOutcome {
    pub fn skipped(stage: Stage, error: &Error) -> Self {
        FileOutcome::Skipped {
            stage,
            reason: error.to_string(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileOutcome::Ignored => "ignored",
            FileOutcome::Unique { .. } => "unique",
            FileOutcome::ExactDuplicate { .. } => "exact-duplicate",
            FileOutcome::AcousticDuplicate { .. } => "acoustic-duplicate",
            FileOutcome::Skipped { .. } => "skipped",
        }
    }

    /// Destination copy made for this file in this run, if any.
    pub fn destination(&self) -> Option<&Path> {
        match self {
            FileOutcome::Unique { destination }
            | FileOutcome::AcousticDuplicate { destination, .. } => Some(destination),
            _ => None,
        }
    }

    fn detail(&self) -> String {
        match self {
            FileOutcome::ExactDuplicate {
                first_path,
                already_indexed,
            } => {
                if *already_indexed {
                    format!("already indexed, first seen as {}", first_path)
                } else {
                    format!("first seen as {}", first_path)
                }
            }
            FileOutcome::AcousticDuplicate {
                metadata_recorded: false,
                ..
            } => "metadata not recorded".to_string(),
            FileOutcome::Skipped { stage, reason } => format!("{}: {}", stage, reason),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileRecord {
    pub tree: PathBuf,
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

#[derive(Debug, Clone)]
pub struct TreeFailure {
    pub tree: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub trees: usize,
    pub trees_failed: usize,
    pub files: usize,
    pub ignored: usize,
    pub unique: usize,
    pub exact_duplicates: usize,
    pub acoustic_duplicates: usize,
    pub skipped: usize,
    pub copied: usize,
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    tree: String,
    path: String,
    outcome: &'a str,
    destination: String,
    detail: String,
}

/// Everything that happened during one `run`.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Local>,
    pub timer: StatsTimer,
    pub trees: Vec<PathBuf>,
    pub records: Vec<FileRecord>,
    pub tree_failures: Vec<TreeFailure>,
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            started_at: Local::now(),
            timer: StatsTimer::new(),
            trees: Vec::new(),
            records: Vec::new(),
            tree_failures: Vec::new(),
        }
    }

    pub fn record(&mut self, tree: &Path, path: &Path, outcome: FileOutcome) {
        self.records.push(FileRecord {
            tree: tree.to_path_buf(),
            path: path.to_path_buf(),
            outcome,
        });
    }

    pub fn record_tree_failure(&mut self, tree: &Path, error: &Error) {
        self.tree_failures.push(TreeFailure {
            tree: tree.to_path_buf(),
            reason: error.to_string(),
        });
    }

    pub fn finish(&mut self) {
        self.timer.finish();
    }

    pub fn outcome_of(&self, path: &Path) -> Option<&FileOutcome> {
        self.records
            .iter()
            .rev()
            .find(|record| record.path == path)
            .map(|record| &record.outcome)
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            trees: self.trees.len(),
            trees_failed: self.tree_failures.len(),
            files: self.records.len(),
            ..Default::default()
        };

        for record in &self.records {
            match &record.outcome {
                FileOutcome::Ignored => summary.ignored += 1,
                FileOutcome::Unique { .. } => summary.unique += 1,
                FileOutcome::ExactDuplicate { .. } => summary.exact_duplicates += 1,
                FileOutcome::AcousticDuplicate { .. } => summary.acoustic_duplicates += 1,
                FileOutcome::Skipped { .. } => summary.skipped += 1,
            }
            if record.outcome.destination().is_some() {
                summary.copied += 1;
            }
        }
        summary
    }

    pub fn print_summary(&self) {
        let summary = self.summary();
        info!(
            "Run started {} finished in {}",
            self.started_at.format("%Y-%m-%d %H:%M:%S"),
            self.timer.get_duration_human().green(),
        );
        info!(
            "{} trees ({} failed), {} files: {} unique, {} acoustic duplicates, {} exact duplicates, {} ignored, {} skipped",
            summary.trees,
            format!("{}", summary.trees_failed).red(),
            summary.files,
            format!("{}", summary.unique).green(),
            format!("{}", summary.acoustic_duplicates).cyan(),
            format!("{}", summary.exact_duplicates).cyan(),
            summary.ignored,
            format!("{}", summary.skipped).red(),
        );
        info!("{} files copied to destination", format!("{}", summary.copied).green());

        for failure in &self.tree_failures {
            warn!("Tree {} failed: {}", failure.tree.display(), failure.reason);
        }
        for record in &self.records {
            if let FileOutcome::Skipped { stage, reason } = &record.outcome {
                warn!("Skipped {} at {}: {}", record.path.display(), stage, reason);
            }
        }
    }

    /// One CSV row per processed file, overwriting `filename`.
    pub fn write_csv(&self, filename: &Path) -> Result<(), Error> {
        if let Some(parent) = filename.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut wtr = csv::Writer::from_path(filename)?;
        for record in &self.records {
            wtr.serialize(CsvRow {
                tree: record.tree.to_string_lossy().into_owned(),
                path: record.path.to_string_lossy().into_owned(),
                outcome: record.outcome.label(),
                destination: record
                    .outcome
                    .destination()
                    .map(|d| d.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                detail: record.outcome.detail(),
            })?;
        }
        wtr.flush()?;
        Ok(())
    }
}
