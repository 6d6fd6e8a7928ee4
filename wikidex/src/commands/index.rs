use anyhow::{Context, Result};
use std::{io::Write, path::Path, time::Instant};
use tracing::info;

use offset_index::{IndexEntry, IndexOptions, OffsetIndex};

use super::{fmt_dur, open_output, resolve_entry};

pub fn build_index(listing: &Path, options: &IndexOptions) -> Result<()> {
    let start = Instant::now();
    let (index, stats) = OffsetIndex::build_from_path(listing, options)
        .with_context(|| format!("build index from {}", listing.display()))?;
    index.save_snapshot(&options.snapshot_for(listing));

    info!(
        lines = stats.lines,
        entries = stats.entries,
        streams = stats.streams,
        reserved = stats.reserved,
        malformed = stats.malformed,
        "build-index finished in {}",
        fmt_dur(start.elapsed().as_secs())
    );
    Ok(())
}

fn print_entries(entries: &[&IndexEntry]) -> Result<()> {
    let mut out = open_output(None)?;
    for e in entries {
        writeln!(out, "{}", e.title)?;
    }
    out.flush()?;
    Ok(())
}

pub fn lookup(index: &OffsetIndex, title: &str) -> Result<()> {
    let entry = resolve_entry(index, title)?;
    let end = entry
        .offsets
        .end
        .map_or_else(|| "EOF".to_string(), |e| e.to_string());

    let mut out = open_output(None)?;
    writeln!(out, "title:    {}", entry.title)?;
    writeln!(out, "page id:  {}", entry.page_id)?;
    writeln!(out, "block:    {}..{end}", entry.offsets.start)?;
    writeln!(out, "siblings: {}", index.stream_members(entry).len())?;
    out.flush()?;
    Ok(())
}

pub fn search(index: &OffsetIndex, query: &str, limit: Option<usize>) -> Result<()> {
    let hits = match limit {
        Some(n) => index.search_limited(query, n),
        None => index.search(query),
    };
    info!(query, hits = hits.len(), "search");
    print_entries(&hits)
}

pub fn random(index: &OffsetIndex, count: usize) -> Result<()> {
    print_entries(&index.sample(count))
}
