//! Error Types
//!
//! Load-time failures and per-query failures of the relatedness API.

use std::io;
use std::path::PathBuf;

/// Fatal errors raised while reading or writing an embedding source
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Truncated embedding source {path}: {detail}")]
    Truncated { path: PathBuf, detail: String },

    #[error("Dimension mismatch at record {index} ({word:?}): expected {expected}, got {actual}")]
    DimensionMismatch {
        index: usize,
        word: String,
        expected: usize,
        actual: usize,
    },

    #[error("Record {index} ({word:?}) has an empty vector")]
    EmptyVector { index: usize, word: String },

    #[error("Malformed embedding source {path}: {detail}")]
    Malformed { path: PathBuf, detail: String },

    #[error("Word of {len} bytes exceeds the 65535 byte limit of the dictionary format")]
    WordTooLong { len: usize },
}

impl LoadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LoadError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn truncated(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        LoadError::Truncated {
            path: path.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        LoadError::Malformed {
            path: path.into(),
            detail: detail.into(),
        }
    }
}

/// Errors surfaced by the relatedness API
#[derive(Debug, thiserror::Error)]
pub enum LexrelError {
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A neighbor query was issued without a built neighbor index
    #[error("Unsupported state: {0}")]
    UnsupportedState(String),

    /// The capability does not exist for this backend
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, LexrelError>;
