use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while pulling one article out of the archive.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Start/end do not describe a non-empty forward range. Wide enough to
    /// report both signed listing input and unsigned offsets unchanged.
    #[error("invalid range: start={start} end={end:?}")]
    InvalidRange { start: i128, end: Option<i128> },

    #[error("archive not found: {}", .0.display())]
    ArchiveNotFound(PathBuf),

    #[error("IO error on {} at offset {offset}: {source}", .path.display())]
    Io {
        path: PathBuf,
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    /// The span at `offset` is not a readable bzip2 stream
    #[error("decompression failed at offset {offset}: {reason}")]
    Decompress { offset: u64, reason: String },

    /// The decompressed block is not well-formed dump XML
    #[error("XML parse error at byte {position}: {reason}")]
    Parse { position: u64, reason: String },

    #[error("page with ID {0} not found")]
    PageNotFound(u64),
}

/// Result type alias for extraction operations
pub type Result<T> = std::result::Result<T, ExtractError>;
