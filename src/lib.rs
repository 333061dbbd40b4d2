pub mod audit;
pub mod classifier;
pub mod config;
pub mod destination;
pub mod error;
pub mod identity;
pub mod index;
pub mod media;
pub mod pipeline;
pub mod progress;
pub mod scanner;
pub mod stats;

pub use config::AppConfig;
pub use destination::Destination;
pub use error::Error;
pub use identity::{ContentDigest, FingerprintDigest, IdentityEngine};
pub use index::{DedupIndex, DuplicateDescriptor};
pub use media::{FingerprintExtractor, MediaInfo, MediaProbe, StreamInfo};
pub use pipeline::{FileOutcome, Pipeline, RunReport, RunSummary, Stage};
pub use progress::{ProgressReporter, SilentReporter};
pub use scanner::{CandidateFile, ScanFilter};
