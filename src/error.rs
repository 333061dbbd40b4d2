use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Index store error: {0}")]
    Index(#[from] rocksdb::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Probe failed for {}: {message}", path.display())]
    Probe { path: PathBuf, message: String },

    #[error("Fingerprint failed for {}: {message}", path.display())]
    Fingerprint { path: PathBuf, message: String },

    #[error("Path is not valid UTF-8: {}", path.display())]
    NonUtf8Path { path: PathBuf },

    #[error("Traversal error under {}: {message}", root.display())]
    Traversal { root: PathBuf, message: String },

    #[error("{0}")]
    Other(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
