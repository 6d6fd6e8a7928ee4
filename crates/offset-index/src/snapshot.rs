//! Compressed, versioned snapshot of a built index.
//!
//! Layout: `WDXSNAP\0`, `u32` LE version, then a zstd stream of postcard frames:
//! a [`SnapshotHeader`], the deduplicated pair table, and one frame per entry.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
    sync::Arc,
};
use tracing::debug;

use crate::build::BUFFER_SIZE;
use crate::entry::{IndexEntry, OffsetPair};
use crate::error::{IndexError, Result};
use crate::framed::{PostcardFramedReader, PostcardFramedWriter};

pub const SNAPSHOT_MAGIC: &[u8; 8] = b"WDXSNAP\0";
pub const SNAPSHOT_VERSION: u32 = 1;
const ZSTD_LEVEL: i32 = 3;
/// Upper bound on entries preallocated from an unverified header.
const PREALLOC_ENTRIES: u64 = 1 << 20;

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotHeader {
    pair_count: u64,
    entry_count: u64,
}

#[derive(Debug, Serialize)]
struct SnapshotEntry<'a> {
    pair: u32,
    page_id: u64,
    title: &'a str,
}

#[derive(Debug, Deserialize)]
struct OwnedSnapshotEntry {
    pair: u32,
    page_id: u64,
    title: String,
}

/// Writes entries to `path` through a temporary sibling, renamed on success.
pub fn save(path: &Path, entries: &[IndexEntry]) -> Result<()> {
    // Arena of distinct pairs in first-seen order; entries store the slot.
    let mut slots: FxHashMap<OffsetPair, u32> = FxHashMap::default();
    let mut pairs: Vec<OffsetPair> = Vec::new();
    let mut entry_slots = Vec::with_capacity(entries.len());
    for e in entries {
        let slot = *slots.entry(*e.offsets).or_insert_with(|| {
            pairs.push(*e.offsets);
            (pairs.len() - 1) as u32
        });
        entry_slots.push(slot);
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = Path::new(&tmp_name);

    let f = File::create(tmp).map_err(|e| IndexError::io(tmp, e))?;
    let mut w = BufWriter::with_capacity(BUFFER_SIZE, f);
    w.write_all(SNAPSHOT_MAGIC)
        .and_then(|_| w.write_all(&SNAPSHOT_VERSION.to_le_bytes()))
        .map_err(|e| IndexError::io(tmp, e))?;

    let enc = zstd::Encoder::new(w, ZSTD_LEVEL).map_err(|e| IndexError::io(tmp, e))?;
    let mut fw = PostcardFramedWriter::new(enc);

    fw.write(&SnapshotHeader {
        pair_count: pairs.len() as u64,
        entry_count: entries.len() as u64,
    })?;
    fw.write(&pairs)?;
    for (e, slot) in entries.iter().zip(entry_slots) {
        fw.write(&SnapshotEntry {
            pair: slot,
            page_id: e.page_id,
            title: &e.title,
        })?;
    }

    let mut w = fw
        .into_inner()
        .finish()
        .map_err(|e| IndexError::io(tmp, e))?;
    w.flush().map_err(|e| IndexError::io(tmp, e))?;
    drop(w);

    fs::rename(tmp, path).map_err(|e| IndexError::io(path, e))?;
    debug!(
        path = %path.display(),
        entries = entries.len(),
        pairs = pairs.len(),
        "snapshot written"
    );
    Ok(())
}

/// Loads a snapshot. Every failure maps to [`IndexError::CacheLoadFailed`].
pub fn load(path: &Path) -> Result<Vec<IndexEntry>> {
    let f = File::open(path)
        .map_err(|e| IndexError::CacheLoadFailed(format!("open {}: {e}", path.display())))?;
    let mut r = BufReader::with_capacity(BUFFER_SIZE, f);

    let mut magic = [0u8; 8];
    let mut version = [0u8; 4];
    r.read_exact(&mut magic)
        .and_then(|_| r.read_exact(&mut version))
        .map_err(|e| IndexError::CacheLoadFailed(format!("read header: {e}")))?;
    if &magic != SNAPSHOT_MAGIC {
        return Err(IndexError::CacheLoadFailed("bad magic".to_string()));
    }
    let version = u32::from_le_bytes(version);
    if version != SNAPSHOT_VERSION {
        return Err(IndexError::CacheLoadFailed(format!(
            "version {version}, expected {SNAPSHOT_VERSION}"
        )));
    }

    let dec = zstd::Decoder::with_buffer(r)
        .map_err(|e| IndexError::CacheLoadFailed(format!("zstd decoder init failed: {e}")))?;
    let mut reader = PostcardFramedReader::new(dec);

    let header: SnapshotHeader = reader
        .read()?
        .ok_or_else(|| IndexError::CacheLoadFailed("missing header frame".to_string()))?;
    let pairs: Vec<OffsetPair> = reader
        .read()?
        .ok_or_else(|| IndexError::CacheLoadFailed("missing pair table".to_string()))?;
    if pairs.len() as u64 != header.pair_count {
        return Err(IndexError::CacheLoadFailed(format!(
            "pair table holds {} pairs, header says {}",
            pairs.len(),
            header.pair_count
        )));
    }
    let pairs: Vec<Arc<OffsetPair>> = pairs.into_iter().map(Arc::new).collect();

    let mut entries = Vec::with_capacity(header.entry_count.min(PREALLOC_ENTRIES) as usize);
    while let Some(e) = reader.read::<OwnedSnapshotEntry>()? {
        let offsets = pairs.get(e.pair as usize).cloned().ok_or_else(|| {
            IndexError::CacheLoadFailed(format!("entry references missing pair {}", e.pair))
        })?;
        entries.push(IndexEntry {
            offsets,
            page_id: e.page_id,
            title: e.title,
        });
    }

    if entries.len() as u64 != header.entry_count {
        return Err(IndexError::CacheLoadFailed(format!(
            "truncated: {} of {} entries",
            entries.len(),
            header.entry_count
        )));
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::{build_entries, IndexOptions};
    use tempfile::tempdir;

    fn sample_entries() -> Vec<IndexEntry> {
        let listing = "600:10:Anarchism\n600:12:Autism\n1500:25:Albedo\n2400:39:A\n";
        build_entries(listing.as_bytes(), &IndexOptions::default())
            .unwrap()
            .0
    }

    #[test]
    fn test_snapshot_roundtrip_preserves_sharing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.cache");
        let entries = sample_entries();

        save(&path, &entries).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded, entries);
        assert!(Arc::ptr_eq(&loaded[0].offsets, &loaded[1].offsets));
        assert!(!path.with_extension("cache.tmp").exists());
    }

    #[test]
    fn test_snapshot_rejects_other_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.cache");
        save(&path, &sample_entries()).unwrap();

        let mut bytes = fs::read(&path).unwrap();
        bytes[8..12].copy_from_slice(&(SNAPSHOT_VERSION + 1).to_le_bytes());
        fs::write(&path, &bytes).unwrap();

        assert!(matches!(load(&path), Err(IndexError::CacheLoadFailed(_))));
    }

    #[test]
    fn test_snapshot_rejects_truncated_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.cache");
        save(&path, &sample_entries()).unwrap();

        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        assert!(matches!(load(&path), Err(IndexError::CacheLoadFailed(_))));
    }

    /// Valid magic and version, then a header that claims far more entries
    /// than the file holds.
    fn write_forged(path: &Path, header: &SnapshotHeader) {
        let mut w = Vec::new();
        w.extend_from_slice(SNAPSHOT_MAGIC);
        w.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
        let mut fw = PostcardFramedWriter::new(zstd::Encoder::new(w, ZSTD_LEVEL).unwrap());
        fw.write(header).unwrap();
        fw.write(&Vec::<OffsetPair>::new()).unwrap();
        let bytes = fw.into_inner().finish().unwrap();
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_snapshot_rejects_forged_counts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("index.cache");

        write_forged(
            &path,
            &SnapshotHeader {
                pair_count: 0,
                entry_count: u64::MAX / 2,
            },
        );
        assert!(matches!(load(&path), Err(IndexError::CacheLoadFailed(_))));

        write_forged(
            &path,
            &SnapshotHeader {
                pair_count: u64::MAX,
                entry_count: 0,
            },
        );
        assert!(matches!(load(&path), Err(IndexError::CacheLoadFailed(_))));
    }

    #[test]
    fn test_snapshot_missing_file() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load(&dir.path().join("absent.cache")),
            Err(IndexError::CacheLoadFailed(_))
        ));
    }
}
