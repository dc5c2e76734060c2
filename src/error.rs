//! Error types for the graft merge engine.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while snapshotting, diffing or materializing trees
#[derive(Debug, Error)]
pub enum GraftError {
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to walk directory: {0}")]
    Walk(String),

    #[error("File is not valid UTF-8: {path:?}")]
    InvalidUtf8 { path: PathBuf },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GraftError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GraftError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<config::ConfigError> for GraftError {
    fn from(err: config::ConfigError) -> Self {
        GraftError::Config(err.to_string())
    }
}

impl From<walkdir::Error> for GraftError {
    fn from(err: walkdir::Error) -> Self {
        GraftError::Walk(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GraftError>;
