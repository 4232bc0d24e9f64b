//! Error types.

use std::path::PathBuf;

/// Errors produced while reading traces and configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A file could not be opened, read or written.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A trace line which does not contain an instruction address.
    #[error("malformed trace line {line}: {text:?}")]
    MalformedTraceLine {
        /// 1-based line number
        line: usize,
        text: String,
    },

    /// A known configuration key with a value that cannot be used.
    #[error("invalid value for configuration key '{key}': {value:?}")]
    InvalidConfigValue { key: String, value: String },

    /// Table sizes which cannot be used to build a predictor.
    #[error("invalid predictor geometry: {0}")]
    InvalidGeometry(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
