//! Length-prefixed postcard frames: `u32` little-endian length, then payload.

use std::io::{Read, Write};

use crate::error::{IndexError, Result};

pub struct PostcardFramedReader<R> {
    r: R,
    buf: Vec<u8>,
}

impl<R: Read> PostcardFramedReader<R> {
    pub fn new(r: R) -> Self {
        Self {
            r,
            buf: Vec::with_capacity(64 * 1024),
        }
    }

    /// Returns `Ok(None)` on a clean or mid-frame EOF; callers that know how many
    /// frames to expect treat a short count as truncation.
    #[inline]
    pub fn read<'a, T>(&'a mut self) -> Result<Option<T>>
    where
        T: serde::Deserialize<'a>,
    {
        let mut lenb = [0u8; 4];

        match self.r.read_exact(&mut lenb) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(IndexError::CacheLoadFailed(format!("read frame len: {e}"))),
        }

        // The length comes from disk: read what is there instead of
        // allocating what the prefix claims.
        let len = u32::from_le_bytes(lenb) as usize;
        self.buf.clear();
        (&mut self.r)
            .take(len as u64)
            .read_to_end(&mut self.buf)
            .map_err(|e| IndexError::CacheLoadFailed(format!("read frame payload: {e}")))?;
        if self.buf.len() < len {
            return Ok(None);
        }

        let v = postcard::from_bytes::<T>(&self.buf)
            .map_err(|e| IndexError::CacheLoadFailed(format!("postcard decode: {e}")))?;
        Ok(Some(v))
    }
}

pub struct PostcardFramedWriter<W> {
    w: W,
}

impl<W: Write> PostcardFramedWriter<W> {
    pub fn new(w: W) -> Self {
        Self { w }
    }

    #[inline]
    pub fn write<T: serde::Serialize>(&mut self, v: &T) -> Result<()> {
        let payload = postcard::to_stdvec(v)?;
        self.write_bytes(&payload)
    }

    #[inline]
    pub fn write_bytes(&mut self, payload: &[u8]) -> Result<()> {
        let len = u32::try_from(payload.len())
            .map_err(|_| IndexError::Serialization(format!("frame too large: {}", payload.len())))?;
        self.w
            .write_all(&len.to_le_bytes())
            .and_then(|_| self.w.write_all(payload))
            .map_err(|e| IndexError::Serialization(format!("write frame: {e}")))
    }

    #[inline]
    pub fn flush(&mut self) -> Result<()> {
        self.w
            .flush()
            .map_err(|e| IndexError::Serialization(format!("flush: {e}")))
    }

    #[inline]
    pub fn into_inner(self) -> W {
        self.w
    }
}
