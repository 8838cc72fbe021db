use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while locating, downloading or decoding dataset runs.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("invalid subject number {0} (expected 1..=109)")]
    InvalidSubject(u32),
    #[error("invalid run number {0} (expected 1..=14)")]
    InvalidRun(u8),
    #[error("failed to download {url}")]
    Download {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },
    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode EDF file {}: {message}", path.display())]
    Edf { path: PathBuf, message: String },
    #[error("inconsistent recording shape: {0}")]
    Shape(String),
    #[error("{} channel position(s) not present in the montage: {}", missing.len(), missing.join(", "))]
    Montage { missing: Vec<String> },
    #[error("invalid configuration {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl DatasetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = DatasetError> = std::result::Result<T, E>;
