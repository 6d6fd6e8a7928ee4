//! Offset index over a multistream bzip2 dump
//!
//! Maps article titles and page ids to the byte range of the compressed stream
//! holding them, and persists the built table as a compressed snapshot so that
//! restarts skip the listing scan.

pub mod build;
pub mod entry;
pub mod error;
pub mod framed;
pub mod index;
pub mod snapshot;

pub use build::{BuildStats, IndexOptions, DEFAULT_RESERVED_PREFIXES};
pub use entry::{IndexEntry, OffsetPair};
pub use error::{IndexError, Result};
pub use index::OffsetIndex;
