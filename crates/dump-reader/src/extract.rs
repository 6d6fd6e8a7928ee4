use bzip2::read::{BzDecoder, MultiBzDecoder};
use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::error::{ExtractError, Result};
use crate::page::{locate_page, Page};

/// Decompressed blocks of a multistream dump are usually a few hundred KiB.
const DECOMPRESSED_HINT: usize = 1 << 20;

/// Byte span of one compressed stream. `end` is exclusive; `None` reads to EOF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: Option<u64>,
}

impl ByteRange {
    pub fn new(start: u64, end: Option<u64>) -> Self {
        Self { start, end }
    }

    /// Accepts the listing's signed form, where `end == 0` means unbounded.
    pub fn from_signed(start: i64, end: i64) -> Result<Self> {
        let invalid = || ExtractError::InvalidRange {
            start: start.into(),
            end: (end != 0).then_some(end.into()),
        };
        if start < 0 || end < 0 {
            return Err(invalid());
        }
        let range = Self {
            start: start as u64,
            end: (end != 0).then_some(end as u64),
        };
        range.validate().map_err(|_| invalid())?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        match self.end {
            Some(end) if end <= self.start => Err(ExtractError::InvalidRange {
                start: self.start.into(),
                end: Some(end.into()),
            }),
            _ => Ok(()),
        }
    }
}

/// Reads the compressed span at `range` and decompresses it.
///
/// Opens its own file handle, so concurrent calls on one path need no
/// coordination.
pub fn extract(path: &Path, range: ByteRange) -> Result<Vec<u8>> {
    range.validate()?;

    let mut f = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ExtractError::ArchiveNotFound(path.to_path_buf()),
        _ => ExtractError::Io {
            path: path.to_path_buf(),
            offset: range.start,
            source: e,
        },
    })?;
    let io_err = |source: io::Error| ExtractError::Io {
        path: path.to_path_buf(),
        offset: range.start,
        source,
    };

    f.seek(SeekFrom::Start(range.start)).map_err(io_err)?;

    let mut compressed = Vec::new();
    match range.end {
        Some(end) => {
            // Grows with what is actually read: `end` may lie far past EOF.
            // Short reads are fine; the decoder reports real damage.
            (&mut f)
                .take(end - range.start)
                .read_to_end(&mut compressed)
                .map_err(io_err)?;
        }
        None => {
            f.read_to_end(&mut compressed).map_err(io_err)?;
        }
    }

    if compressed.is_empty() {
        return Err(ExtractError::Decompress {
            offset: range.start,
            reason: "no compressed data at offset".to_string(),
        });
    }

    let out = decompress(&compressed, range)?;
    debug!(
        start = range.start,
        compressed = compressed.len(),
        decompressed = out.len(),
        "extracted stream"
    );
    Ok(out)
}

fn decompress(compressed: &[u8], range: ByteRange) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(DECOMPRESSED_HINT.max(compressed.len() * 4));
    let res = match range.end {
        Some(_) => BzDecoder::new(compressed).read_to_end(&mut out),
        None => MultiBzDecoder::new(compressed).read_to_end(&mut out),
    };
    res.map_err(|e| ExtractError::Decompress {
        offset: range.start,
        reason: e.to_string(),
    })?;
    Ok(out)
}

/// A dump archive on disk. Each request opens its own handle.
#[derive(Debug, Clone)]
pub struct Archive {
    path: PathBuf,
}

impl Archive {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(ExtractError::ArchiveNotFound(path));
        }
        Ok(Self { path })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn extract(&self, range: ByteRange) -> Result<Vec<u8>> {
        extract(&self.path, range)
    }

    /// Extracts the stream at `range` and returns page `page_id` from it.
    pub fn read_page(&self, range: ByteRange, page_id: u64) -> Result<Page> {
        let block = self.extract(range)?;
        locate_page(&block, page_id)
    }
}
