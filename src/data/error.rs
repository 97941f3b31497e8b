use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures of the load → filter → save pipeline.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("input file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed data in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("schema error: {0}")]
    Schema(String),

    #[error("no seasons recorded for '{0}'")]
    NoHistory(String),

    #[error("failed to write {}: {message}", path.display())]
    Write { path: PathBuf, message: String },
}

impl DatasetError {
    pub(crate) fn parse(path: &std::path::Path, message: impl Into<String>) -> Self {
        DatasetError::Parse {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub(crate) fn write(path: &std::path::Path, message: impl std::fmt::Display) -> Self {
        DatasetError::Write {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    pub(crate) fn missing_column(name: &str) -> Self {
        DatasetError::Schema(format!("missing required column '{name}'"))
    }
}

pub type Result<T> = std::result::Result<T, DatasetError>;
