use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of the discovery phase. No partial path list accompanies it.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("directory not found: {}", root.display())]
    NotFound { root: PathBuf },
    #[error("I/O error while scanning {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid exclude pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

impl DiscoveryError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DiscoveryError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Why a single file could not be turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadFailureReason {
    DecodeError,
    IoError,
}

impl fmt::Display for ReadFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadFailureReason::DecodeError => f.write_str("decode error"),
            ReadFailureReason::IoError => f.write_str("I/O error"),
        }
    }
}

/// A per-file read failure. This is data carried by a
/// [`FileRecord`](crate::FileRecord), never a reason to stop the run.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{reason}: {message}")]
pub struct ReadFailure {
    pub reason: ReadFailureReason,
    pub message: String,
}

impl ReadFailure {
    pub fn io(source: &std::io::Error) -> Self {
        Self {
            reason: ReadFailureReason::IoError,
            message: source.to_string(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self {
            reason: ReadFailureReason::DecodeError,
            message: message.into(),
        }
    }
}

/// Failure while writing the summary. Whatever was written before stays in the sink.
#[derive(Debug, Error)]
#[error("failed to write summary: {source}")]
pub struct WriteError {
    #[from]
    source: std::io::Error,
}

impl WriteError {
    pub fn io_error(&self) -> &std::io::Error {
        &self.source
    }
}

/// Run-level failure of [`Collator::run`](crate::Collator::run).
#[derive(Debug, Error)]
pub enum CollateError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error("cannot create output {}: {source}", path.display())]
    CreateOutput {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{} is incomplete: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: WriteError,
    },
    /// Writing to a caller-supplied sink failed.
    #[error("output stream is incomplete: {0}")]
    WriteStream(#[source] WriteError),
}
