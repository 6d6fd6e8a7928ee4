use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Byte range of one independently decompressible stream in the archive.
///
/// `end` is exclusive; `None` means the stream runs to the end of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OffsetPair {
    pub start: u64,
    pub end: Option<u64>,
}

impl OffsetPair {
    /// Compressed length, when bounded.
    #[inline]
    pub fn len(&self) -> Option<u64> {
        self.end.map(|e| e.saturating_sub(self.start))
    }
}

/// One article in the index. Entries sharing a stream share the same pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub offsets: Arc<OffsetPair>,
    pub page_id: u64,
    pub title: String,
}

/// Interns offset pairs so structurally identical ranges share one allocation.
#[derive(Debug, Default)]
pub(crate) struct PairCache {
    pairs: FxHashMap<(u64, Option<u64>), Arc<OffsetPair>>,
}

impl PairCache {
    pub(crate) fn with_capacity(cap: usize) -> Self {
        Self {
            pairs: FxHashMap::with_capacity_and_hasher(cap, Default::default()),
        }
    }

    #[inline]
    pub(crate) fn get_or_create(&mut self, start: u64, end: Option<u64>) -> Arc<OffsetPair> {
        self.pairs
            .entry((start, end))
            .or_insert_with(|| Arc::new(OffsetPair { start, end }))
            .clone()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.pairs.len()
    }
}
