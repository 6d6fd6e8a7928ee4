//! Random access into a multistream bzip2 dump
//!
//! Extracts one compressed stream by byte range and finds a page by id in the
//! decompressed block.

pub mod error;
pub mod extract;
pub mod page;

pub use error::{ExtractError, Result};
pub use extract::{extract, Archive, ByteRange};
pub use page::{locate_page, pages, Page, PageReader};
