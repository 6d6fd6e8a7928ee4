//! Page records inside a decompressed dump block.
//!
//! A block is a run of `<page>` elements with no common root: the first block
//! also opens `<mediawiki>` and `<siteinfo>`, the last one closes `</mediawiki>`.

use quick_xml::{events::Event, Reader};

use crate::error::{ExtractError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub id: u64,
    pub title: String,
    pub text: String,
}

/// Pulls `<page>` records one at a time out of a block.
pub struct PageReader<'a> {
    reader: Reader<&'a [u8]>,
    buf: Vec<u8>,
}

impl<'a> PageReader<'a> {
    pub fn new(block: &'a [u8]) -> Self {
        let mut reader = Reader::from_reader(block);
        let config = reader.config_mut();
        config.check_end_names = false;
        config.allow_unmatched_ends = true;
        Self {
            reader,
            buf: Vec::with_capacity(64 * 1024),
        }
    }

    /// Next fully decoded page, or `None` once the block is exhausted.
    pub fn next_page(&mut self) -> Result<Option<Page>> {
        loop {
            let at_page = match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(e)) => e.local_name().as_ref() == b"page",
                Ok(Event::Eof) => return Ok(None),
                Ok(_) => false,
                Err(e) => return Err(parse_error(&self.reader, e.to_string())),
            };
            self.buf.clear();
            if at_page {
                return self.read_page().map(Some);
            }
        }
    }

    /// Decodes one page body; the opening `<page>` is already consumed.
    fn read_page(&mut self) -> Result<Page> {
        let mut page = Page::default();
        let mut id_seen = false;
        // Open elements below <page>.
        let mut path: Vec<Vec<u8>> = Vec::with_capacity(4);
        let mut text = String::new();

        loop {
            let closed = match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(e)) => {
                    path.push(e.local_name().as_ref().to_vec());
                    text.clear();
                    false
                }
                Ok(Event::Text(t)) => {
                    let s = t.unescape().map_err(|e| {
                        parse_error(&self.reader, format!("bad text content: {e}"))
                    })?;
                    text.push_str(&s);
                    false
                }
                Ok(Event::CData(c)) => {
                    text.push_str(&String::from_utf8_lossy(&c));
                    false
                }
                Ok(Event::End(_)) => true,
                Ok(Event::Eof) => {
                    return Err(parse_error(&self.reader, "unexpected EOF inside <page>"))
                }
                Ok(_) => false,
                Err(e) => return Err(parse_error(&self.reader, e.to_string())),
            };
            self.buf.clear();
            if !closed {
                continue;
            }

            let Some(name) = path.pop() else {
                if !id_seen {
                    return Err(parse_error(&self.reader, "page without <id>"));
                }
                return Ok(page);
            };
            match (path.as_slice(), name.as_slice()) {
                ([], b"title") => page.title = std::mem::take(&mut text),
                ([], b"id") => {
                    page.id = text.trim().parse().map_err(|_| {
                        parse_error(&self.reader, format!("invalid page id {:?}", text.trim()))
                    })?;
                    id_seen = true;
                }
                ([parent], b"text") if parent.as_slice() == b"revision" => {
                    page.text = std::mem::take(&mut text)
                }
                _ => {}
            }
            text.clear();
        }
    }
}

fn parse_error(reader: &Reader<&[u8]>, reason: impl Into<String>) -> ExtractError {
    ExtractError::Parse {
        position: reader.buffer_position() as u64,
        reason: reason.into(),
    }
}

impl Iterator for PageReader<'_> {
    type Item = Result<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_page().transpose()
    }
}

/// Scans the whole block and returns the first page whose id is `page_id`.
pub fn locate_page(block: &[u8], page_id: u64) -> Result<Page> {
    let mut pages = PageReader::new(block);
    while let Some(page) = pages.next_page()? {
        if page.id == page_id {
            return Ok(page);
        }
    }
    Err(ExtractError::PageNotFound(page_id))
}

/// Every page of the block, in order.
pub fn pages(block: &[u8]) -> Result<Vec<Page>> {
    PageReader::new(block).collect()
}
