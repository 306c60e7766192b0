use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort the processing of an input file.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("Malformed record at {}:{line}: {reason}", path.display())]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Record on line {line} is missing required field '{field}'")]
    MissingField { line: usize, field: &'static str },

    #[error("Record on line {line} has invalid field '{field}', expected {expected}")]
    InvalidField {
        line: usize,
        field: &'static str,
        expected: &'static str,
    },

    #[error("Record on line {line} has out of range timestamp {ts}")]
    InvalidTimestamp { line: usize, ts: i64 },

    #[error("Data directory not found: {}", path.display())]
    DataDirNotFound { path: PathBuf },

    #[error("Failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk data directory")]
    Discovery(#[from] walkdir::Error),

    #[error("Failed to process {}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: Box<EtlError>,
    },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
