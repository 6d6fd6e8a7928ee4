use anyhow::{Context, Result};
use std::{io::Write, path::Path};
use tracing::{info, warn};

use dump_reader::{pages, Archive, ByteRange, Page};
use offset_index::{IndexEntry, OffsetIndex};
use wikitext::{redirect_target, Converter, TemplateRegistry};

use super::{open_output, resolve_entry};

pub const MAX_REDIRECT_HOPS: usize = 5;

pub struct RenderArgs<'a> {
    pub title: &'a str,
    pub out: Option<&'a Path>,
    pub follow_redirects: bool,
}

fn block_range(entry: &IndexEntry) -> ByteRange {
    ByteRange::new(entry.offsets.start, entry.offsets.end)
}

fn open_archive(path: &Path) -> Result<Archive> {
    Archive::open(path).with_context(|| format!("open archive {}", path.display()))
}

fn fetch_page(index: &OffsetIndex, archive: &Archive, title: &str) -> Result<Page> {
    let entry = resolve_entry(index, title)?;
    archive
        .read_page(block_range(entry), entry.page_id)
        .with_context(|| format!("read page {} ({})", entry.page_id, entry.title))
}

/// Fetches `title`, following `#REDIRECT` pages up to `max_hops` times.
pub(crate) fn resolve_page(
    index: &OffsetIndex,
    archive: &Archive,
    title: &str,
    max_hops: usize,
) -> Result<Page> {
    let mut page = fetch_page(index, archive, title)?;
    for _ in 0..max_hops {
        let Some(target) = redirect_target(&page.text) else {
            return Ok(page);
        };
        info!(from = %page.title, to = %target, "following redirect");
        page = fetch_page(index, archive, &target)?;
    }
    if redirect_target(&page.text).is_some() {
        warn!(title = %page.title, max_hops, "redirect chain too long, rendering redirect page");
    }
    Ok(page)
}

pub fn extract(index: &OffsetIndex, archive: &Path, title: &str, raw: bool) -> Result<()> {
    let archive = open_archive(archive)?;
    let mut out = open_output(None)?;

    if raw {
        let entry = resolve_entry(index, title)?;
        let block = archive
            .extract(block_range(entry))
            .with_context(|| format!("extract block of {}", entry.title))?;
        out.write_all(&block)?;
    } else {
        let page = fetch_page(index, &archive, title)?;
        writeln!(out, "{}", page.text)?;
    }
    out.flush()?;
    Ok(())
}

pub fn render(index: &OffsetIndex, archive: &Path, args: &RenderArgs<'_>) -> Result<()> {
    let archive = open_archive(archive)?;
    let hops = if args.follow_redirects {
        MAX_REDIRECT_HOPS
    } else {
        0
    };
    let page = resolve_page(index, &archive, args.title, hops)?;

    let registry = TemplateRegistry::default();
    let rendered = Converter::new(&registry).render(&page.text);
    info!(
        title = %page.title,
        id = page.id,
        categories = rendered.categories.len(),
        bytes = rendered.html.len(),
        "rendered"
    );

    let mut out = open_output(args.out)?;
    writeln!(out, "<h1>{}</h1>", wikitext::escape::escape_html(&page.title))?;
    writeln!(out, "{}", rendered.html)?;
    out.flush()?;
    Ok(())
}

pub fn block(index: &OffsetIndex, archive: &Path, title: &str) -> Result<()> {
    let archive = open_archive(archive)?;
    let entry = resolve_entry(index, title)?;
    let data = archive
        .extract(block_range(entry))
        .with_context(|| format!("extract block of {}", entry.title))?;
    let found = pages(&data).with_context(|| format!("parse block of {}", entry.title))?;

    let indexed = index.stream_members(entry).len();
    if indexed != found.len() {
        // Reserved namespaces are not indexed but still live in the block.
        info!(indexed, decoded = found.len(), "block differs from index");
    }

    let mut out = open_output(None)?;
    for p in &found {
        writeln!(out, "{}\t{}", p.id, p.title)?;
    }
    out.flush()?;
    Ok(())
}
