use std::path::PathBuf;

use thiserror::Error;

/// Offset index error types
#[derive(Error, Debug)]
pub enum IndexError {
    /// IO error on a named file
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Snapshot could not be read back; callers recover by rebuilding
    #[error("Snapshot load failed: {0}")]
    CacheLoadFailed(String),

    /// Serialization error while writing a snapshot
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// No entry matched the requested title, exactly or case-insensitively
    #[error("Title not found: {0}")]
    TitleNotFound(String),
}

impl IndexError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IndexError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<postcard::Error> for IndexError {
    fn from(e: postcard::Error) -> Self {
        IndexError::Serialization(e.to_string())
    }
}

/// Result type alias for index operations
pub type Result<T> = std::result::Result<T, IndexError>;
