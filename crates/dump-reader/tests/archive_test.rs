//! End-to-end: build a small multistream dump, index it, pull pages back out.

use bzip2::write::BzEncoder;
use bzip2::Compression;
use dump_reader::{extract, locate_page, pages, Archive, ByteRange, ExtractError};
use offset_index::{IndexOptions, OffsetIndex};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

fn page_xml(id: u64, title: &str, text: &str) -> String {
    format!(
        "  <page>\n    <title>{title}</title>\n    <ns>0</ns>\n    <id>{id}</id>\n    \
         <revision>\n      <id>{}</id>\n      <text xml:space=\"preserve\">{text}</text>\n    \
         </revision>\n  </page>\n",
        id * 1000
    )
}

fn bz(data: &str) -> Vec<u8> {
    let mut enc = BzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data.as_bytes()).unwrap();
    enc.finish().unwrap()
}

/// Writes a three-stream dump and its `offset:id:title` listing.
fn write_dump(dir: &TempDir) -> (PathBuf, PathBuf) {
    let blocks = [
        "<mediawiki>\n  <siteinfo><sitename>Test</sitename></siteinfo>\n".to_string(),
        page_xml(10, "Alpha", "First &amp; foremost")
            + &page_xml(12, "Beta", "'''Beta''' text")
            + &page_xml(13, "Category:Greek letters", "hidden"),
        page_xml(25, "Gamma", "{{main|Delta}}") + "</mediawiki>\n",
    ];

    let mut archive = Vec::new();
    let mut listing = String::new();
    let mut offsets = Vec::new();
    for block in &blocks {
        offsets.push(archive.len());
        archive.extend_from_slice(&bz(block));
    }
    listing.push_str(&format!("{}:10:Alpha\n", offsets[1]));
    listing.push_str(&format!("{}:12:Beta\n", offsets[1]));
    listing.push_str(&format!("{}:13:Category:Greek letters\n", offsets[1]));
    listing.push_str(&format!("{}:25:Gamma\n", offsets[2]));

    let archive_path = dir.path().join("dump-multistream.xml.bz2");
    let listing_path = dir.path().join("dump-multistream-index.txt");
    fs::write(&archive_path, archive).unwrap();
    fs::write(&listing_path, listing).unwrap();
    (archive_path, listing_path)
}

fn range_of(index: &OffsetIndex, title: &str) -> (ByteRange, u64) {
    let e = index.lookup(title).unwrap();
    (ByteRange::new(e.offsets.start, e.offsets.end), e.page_id)
}

#[test]
fn test_lookup_extract_locate() {
    let dir = tempdir().unwrap();
    let (archive_path, listing_path) = write_dump(&dir);
    let index = OffsetIndex::load_or_build(&listing_path, &IndexOptions::default()).unwrap();

    assert_eq!(index.len(), 3);
    assert!(index.lookup("Category:Greek letters").is_err());

    let archive = Archive::open(&archive_path).unwrap();

    let (range, id) = range_of(&index, "beta");
    assert!(range.end.is_some());
    let page = archive.read_page(range, id).unwrap();
    assert_eq!(page.title, "Beta");
    assert_eq!(page.text, "'''Beta''' text");

    let (range, id) = range_of(&index, "Alpha");
    assert_eq!(archive.read_page(range, id).unwrap().text, "First & foremost");

    // The last stream is unbounded and still closes </mediawiki>.
    let (range, id) = range_of(&index, "Gamma");
    assert_eq!(range.end, None);
    assert_eq!(archive.read_page(range, id).unwrap().text, "{{main|Delta}}");
}

#[test]
fn test_block_holds_every_page_of_the_stream() {
    let dir = tempdir().unwrap();
    let (archive_path, listing_path) = write_dump(&dir);
    let index = OffsetIndex::load_or_build(&listing_path, &IndexOptions::default()).unwrap();

    let (range, _) = range_of(&index, "Alpha");
    let block = extract(&archive_path, range).unwrap();
    let ids: Vec<_> = pages(&block).unwrap().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![10, 12, 13]);
    assert!(matches!(locate_page(&block, 25), Err(ExtractError::PageNotFound(25))));
}

#[test]
fn test_unbounded_extract_of_single_stream_archive() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("single.bz2");
    let content = page_xml(1, "Solo", "alone");
    fs::write(&path, bz(&content)).unwrap();

    let range = ByteRange::from_signed(0, 0).unwrap();
    let out = extract(&path, range).unwrap();
    assert_eq!(out, content.as_bytes());
}

#[test]
fn test_bounded_range_past_eof_is_tolerated() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("single.bz2");
    let content = page_xml(1, "Solo", "alone");
    let compressed = bz(&content);
    let len = compressed.len() as u64;
    fs::write(&path, compressed).unwrap();

    let out = extract(&path, ByteRange::new(0, Some(len + 4096))).unwrap();
    assert_eq!(out, content.as_bytes());
}

#[test]
fn test_huge_bounded_end_reads_to_eof() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("single.bz2");
    let content = page_xml(1, "Solo", "alone");
    fs::write(&path, bz(&content)).unwrap();

    let range = ByteRange::from_signed(0, i64::MAX).unwrap();
    assert_eq!(range.end, Some(i64::MAX as u64));
    let out = extract(&path, range).unwrap();
    assert_eq!(out, content.as_bytes());
}

#[test]
fn test_extract_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("junk.bz2");
    fs::write(&path, b"this is not bzip2 data at all").unwrap();

    assert!(matches!(
        extract(&path, ByteRange::new(0, None)),
        Err(ExtractError::Decompress { offset: 0, .. })
    ));
    assert!(matches!(
        extract(&path, ByteRange::new(10_000, None)),
        Err(ExtractError::Decompress { offset: 10_000, .. })
    ));
    assert!(matches!(
        extract(&path, ByteRange::new(20, Some(10))),
        Err(ExtractError::InvalidRange { .. })
    ));
    assert!(matches!(
        ByteRange::from_signed(30, 30),
        Err(ExtractError::InvalidRange { .. })
    ));
    assert!(matches!(
        Archive::open(Path::new("/no/such/dump.bz2")),
        Err(ExtractError::ArchiveNotFound(_))
    ));
}
