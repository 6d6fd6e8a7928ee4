pub mod index;
pub mod page;

use anyhow::{anyhow, Context, Result};
use offset_index::{IndexEntry, OffsetIndex};
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

const ID_PREFIX: &str = "id:";

const OUT_BUFFER: usize = 1 << 20;

/// Buffered writer to `path`, or to stdout when none is given.
pub(crate) fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) => Box::new(BufWriter::with_capacity(
            OUT_BUFFER,
            File::create(p).with_context(|| format!("create {}", p.display()))?,
        )),
        None => Box::new(BufWriter::with_capacity(OUT_BUFFER, io::stdout())),
    })
}

pub(crate) fn fmt_dur(secs: u64) -> String {
    let h = secs / 3600;
    let m = (secs % 3600) / 60;
    let s = secs % 60;
    if h > 0 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

/// Resolves `key` as a title, or as a page id when written `id:<n>`.
pub(crate) fn resolve_entry<'a>(index: &'a OffsetIndex, key: &str) -> Result<&'a IndexEntry> {
    if let Some(id) = key
        .strip_prefix(ID_PREFIX)
        .and_then(|n| n.trim().parse::<u64>().ok())
    {
        return index
            .find_by_id(id)
            .ok_or_else(|| anyhow!("no index entry for page id {id}"));
    }
    Ok(index.lookup(key)?)
}
