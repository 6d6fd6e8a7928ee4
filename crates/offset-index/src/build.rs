use bzip2::read::MultiBzDecoder;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    time::Instant,
};
use tracing::{debug, info};

use crate::entry::{IndexEntry, PairCache};
use crate::error::{IndexError, Result};

pub const BUFFER_SIZE: usize = 8 << 20;

/// Title prefixes of non-article namespaces dropped while building.
pub const DEFAULT_RESERVED_PREFIXES: &[&str] = &[
    "File:",
    "Category:",
    "Wikipedia:",
    "Draft:",
    "Portal:",
    "Template:",
];

#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Titles starting with any of these are skipped
    pub reserved_prefixes: Vec<String>,
    /// Snapshot location; defaults to `<listing>.cache`
    pub snapshot_path: Option<PathBuf>,
    /// Log progress every N listing lines (0 disables)
    pub progress_every: u64,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            reserved_prefixes: DEFAULT_RESERVED_PREFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            snapshot_path: None,
            progress_every: 1_000_000,
        }
    }
}

impl IndexOptions {
    pub fn snapshot_for(&self, listing: &Path) -> PathBuf {
        match &self.snapshot_path {
            Some(p) => p.clone(),
            None => {
                let mut name = listing.as_os_str().to_owned();
                name.push(".cache");
                PathBuf::from(name)
            }
        }
    }

    #[inline]
    fn is_reserved(&self, title: &str) -> bool {
        self.reserved_prefixes
            .iter()
            .any(|p| title.starts_with(p.as_str()))
    }
}

/// Counters collected while building from a listing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildStats {
    pub lines: u64,
    pub malformed: u64,
    pub reserved: u64,
    pub entries: u64,
    pub streams: u64,
}

/// Splits `start:page_id:title`. Non-numeric numbers fall back to 0.
#[inline]
pub(crate) fn parse_line(line: &str) -> Option<(u64, u64, &str)> {
    let (offset, rest) = line.split_once(':')?;
    let (page_id, title) = rest.split_once(':')?;
    Some((
        offset.trim().parse().unwrap_or(0),
        page_id.trim().parse().unwrap_or(0),
        title,
    ))
}

/// Opens a listing, transparently decoding `.bz2` files.
pub fn open_listing(path: &Path) -> Result<Box<dyn BufRead>> {
    let f = File::open(path).map_err(|e| IndexError::io(path, e))?;
    let f = BufReader::with_capacity(BUFFER_SIZE, f);

    let is_bz2 = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("bz2"))
        .unwrap_or(false);

    if is_bz2 {
        debug!("listing {} is bzip2 compressed", path.display());
        Ok(Box::new(BufReader::with_capacity(
            BUFFER_SIZE,
            MultiBzDecoder::new(f),
        )))
    } else {
        Ok(Box::new(f))
    }
}

fn fmt_dur(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// Reads every listing line, then sorts and groups entries by stream.
pub(crate) fn build_entries<R: BufRead>(
    mut reader: R,
    options: &IndexOptions,
) -> Result<(Vec<IndexEntry>, BuildStats)> {
    let start_time = Instant::now();
    let mut stats = BuildStats::default();
    let mut raw: Vec<(u64, u64, String)> = Vec::new();
    let mut buf = Vec::with_capacity(256);

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| IndexError::io("<listing>", e))?;
        if n == 0 {
            break;
        }
        stats.lines += 1;

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\n', '\r']);

        let Some((start, page_id, title)) = parse_line(line) else {
            stats.malformed += 1;
            continue;
        };
        if options.is_reserved(title) {
            stats.reserved += 1;
            continue;
        }
        raw.push((start, page_id, title.to_owned()));

        if options.progress_every > 0 && stats.lines % options.progress_every == 0 {
            info!(
                lines = stats.lines,
                kept = raw.len(),
                elapsed = %fmt_dur(start_time.elapsed().as_secs()),
                "index build progress"
            );
        }
    }

    // Stable: entries sharing a stream keep listing order.
    raw.sort_by_key(|r| r.0);

    let mut starts: Vec<u64> = raw.iter().map(|r| r.0).collect();
    starts.dedup();

    let mut cache = PairCache::with_capacity(starts.len());
    let mut entries = Vec::with_capacity(raw.len());
    let mut group = 0usize;

    for (start, page_id, title) in raw {
        while starts[group] != start {
            group += 1;
        }
        let end = starts.get(group + 1).copied();
        entries.push(IndexEntry {
            offsets: cache.get_or_create(start, end),
            page_id,
            title,
        });
    }

    stats.entries = entries.len() as u64;
    stats.streams = cache.len() as u64;

    info!(
        entries = stats.entries,
        streams = stats.streams,
        malformed = stats.malformed,
        reserved = stats.reserved,
        elapsed = %fmt_dur(start_time.elapsed().as_secs()),
        "index built"
    );

    Ok((entries, stats))
}
