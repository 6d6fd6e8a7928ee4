use rand::Rng;
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

use crate::build::{build_entries, open_listing, BuildStats, IndexOptions};
use crate::entry::IndexEntry;
use crate::error::{IndexError, Result};
use crate::snapshot;

/// Read-only title → stream table, sorted by stream start offset.
///
/// Built once and never mutated afterwards; share it behind an `Arc` for
/// concurrent lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OffsetIndex {
    entries: Vec<IndexEntry>,
}

impl OffsetIndex {
    /// Builds from an in-memory listing reader.
    pub fn build<R: std::io::BufRead>(
        reader: R,
        options: &IndexOptions,
    ) -> Result<(Self, BuildStats)> {
        let (entries, stats) = build_entries(reader, options)?;
        Ok((Self { entries }, stats))
    }

    /// Builds from a listing file (plain or `.bz2`), ignoring any snapshot.
    pub fn build_from_path(listing: &Path, options: &IndexOptions) -> Result<(Self, BuildStats)> {
        info!("building index from {}", listing.display());
        Self::build(open_listing(listing)?, options)
    }

    /// Loads the snapshot next to `listing`, or rebuilds and rewrites it.
    ///
    /// Snapshot problems are logged and recovered; only a missing or
    /// unreadable listing is an error.
    pub fn load_or_build(listing: &Path, options: &IndexOptions) -> Result<Self> {
        let snapshot_path = options.snapshot_for(listing);

        let t = Instant::now();
        match snapshot::load(&snapshot_path) {
            Ok(entries) => {
                info!(
                    entries = entries.len(),
                    elapsed_ms = t.elapsed().as_millis() as u64,
                    "loaded index from {}",
                    snapshot_path.display()
                );
                return Ok(Self { entries });
            }
            Err(e) => warn!("index snapshot unavailable, rebuilding: {e}"),
        }

        let (index, _) = Self::build_from_path(listing, options)?;
        index.save_snapshot(&snapshot_path);
        Ok(index)
    }

    /// Writes a snapshot; failures are logged, never returned.
    pub fn save_snapshot(&self, path: &Path) {
        match snapshot::save(path, &self.entries) {
            Ok(()) => info!("index snapshot saved to {}", path.display()),
            Err(e) => warn!("failed to save index snapshot: {e}"),
        }
    }

    /// Loads a snapshot strictly, surfacing the failure.
    pub fn load_snapshot(path: &Path) -> Result<Self> {
        Ok(Self {
            entries: snapshot::load(path)?,
        })
    }

    #[inline]
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct streams referenced by the index.
    pub fn stream_count(&self) -> usize {
        let mut n = 0;
        let mut last = None;
        for e in &self.entries {
            if last != Some(e.offsets.start) {
                n += 1;
                last = Some(e.offsets.start);
            }
        }
        n
    }

    /// Exact title match first, then case-insensitive. Underscores in the
    /// query are read as spaces. First match in index order wins.
    pub fn lookup(&self, title: &str) -> Result<&IndexEntry> {
        let wanted = title.replace('_', " ");

        self.entries
            .iter()
            .find(|e| e.title == wanted)
            .or_else(|| {
                let folded = wanted.to_lowercase();
                self.entries
                    .iter()
                    .find(|e| e.title.to_lowercase() == folded)
            })
            .ok_or(IndexError::TitleNotFound(wanted))
    }

    pub fn find_by_id(&self, page_id: u64) -> Option<&IndexEntry> {
        self.entries.iter().find(|e| e.page_id == page_id)
    }

    /// All entries sharing `entry`'s stream, in index order.
    pub fn stream_members(&self, entry: &IndexEntry) -> &[IndexEntry] {
        let start = entry.offsets.start;
        let lo = self.entries.partition_point(|e| e.offsets.start < start);
        let hi = self.entries.partition_point(|e| e.offsets.start <= start);
        &self.entries[lo..hi]
    }

    /// Case-insensitive substring search, in index order.
    pub fn search(&self, query: &str) -> Vec<&IndexEntry> {
        self.search_limited(query, usize::MAX)
    }

    pub fn search_limited(&self, query: &str, limit: usize) -> Vec<&IndexEntry> {
        let query = query.to_lowercase();
        self.entries
            .iter()
            .filter(|e| e.title.to_lowercase().contains(&query))
            .take(limit)
            .collect()
    }

    /// `k` distinct entries chosen uniformly without replacement.
    pub fn sample(&self, k: usize) -> Vec<&IndexEntry> {
        self.sample_with(&mut rand::rng(), k)
    }

    pub fn sample_with<R: Rng + ?Sized>(&self, rng: &mut R, k: usize) -> Vec<&IndexEntry> {
        if self.entries.len() <= k {
            return self.entries.iter().collect();
        }
        rand::seq::index::sample(rng, self.entries.len(), k)
            .into_iter()
            .map(|i| &self.entries[i])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::tempdir;

    const LISTING: &str = "\
600:10:AccessibleComputing
600:12:Anarchism
600:13:ANARCHISM
1500:25:Autism
1500:39:Albedo
2400:290:A
2400:303:Alabama
3100:305:Achilles
3100:307:Abraham Lincoln
";

    fn index() -> OffsetIndex {
        OffsetIndex::build(LISTING.as_bytes(), &IndexOptions::default())
            .unwrap()
            .0
    }

    #[test]
    fn test_lookup_prefers_exact_case() {
        let idx = index();
        assert_eq!(idx.lookup("ANARCHISM").unwrap().page_id, 13);
        assert_eq!(idx.lookup("Anarchism").unwrap().page_id, 12);
        // No exact match: the first case-insensitive hit in index order.
        assert_eq!(idx.lookup("anarchism").unwrap().page_id, 12);
    }

    #[test]
    fn test_lookup_normalizes_underscores() {
        let idx = index();
        assert_eq!(idx.lookup("Abraham_Lincoln").unwrap().page_id, 307);
        assert_eq!(idx.lookup("abraham_lincoln").unwrap().page_id, 307);
    }

    #[test]
    fn test_lookup_missing_title() {
        match index().lookup("Zebra_crossing") {
            Err(IndexError::TitleNotFound(t)) => assert_eq!(t, "Zebra crossing"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_search_is_case_insensitive_in_index_order() {
        let idx = index();
        let hits: Vec<_> = idx.search("AL").iter().map(|e| e.page_id).collect();
        assert_eq!(hits, vec![39, 303]);
        assert_eq!(idx.search_limited("a", 2).len(), 2);
        assert!(idx.search("xyz").is_empty());
    }

    #[test]
    fn test_sample_distinct_and_bounded() {
        let idx = index();
        let mut rng = SmallRng::seed_from_u64(7);

        let picked = idx.sample_with(&mut rng, 4);
        assert_eq!(picked.len(), 4);
        let ids: HashSet<_> = picked.iter().map(|e| e.page_id).collect();
        assert_eq!(ids.len(), 4);

        assert_eq!(idx.sample(100).len(), idx.len());
        assert!(idx.sample(0).is_empty());
    }

    #[test]
    fn test_stream_members() {
        let idx = index();
        let autism = idx.lookup("Autism").unwrap();
        let members: Vec<_> = idx.stream_members(autism).iter().map(|e| e.page_id).collect();
        assert_eq!(members, vec![25, 39]);
        assert_eq!(idx.stream_count(), 4);
        assert_eq!(idx.find_by_id(305).unwrap().title, "Achilles");
    }

    #[test]
    fn test_load_or_build_writes_and_reuses_snapshot() {
        let dir = tempdir().unwrap();
        let listing = dir.path().join("index.txt");
        fs::write(&listing, LISTING).unwrap();
        let options = IndexOptions::default();

        let built = OffsetIndex::load_or_build(&listing, &options).unwrap();
        let snap = options.snapshot_for(&listing);
        assert!(snap.exists());

        // The snapshot now wins even if the listing disappears.
        fs::remove_file(&listing).unwrap();
        let loaded = OffsetIndex::load_or_build(&listing, &options).unwrap();
        assert_eq!(loaded, built);
    }

    #[test]
    fn test_load_or_build_recovers_from_corrupt_snapshot() {
        let dir = tempdir().unwrap();
        let listing = dir.path().join("index.txt");
        fs::write(&listing, LISTING).unwrap();
        let options = IndexOptions::default();
        fs::write(options.snapshot_for(&listing), b"not a snapshot").unwrap();

        let idx = OffsetIndex::load_or_build(&listing, &options).unwrap();
        assert_eq!(idx, index());
        assert_eq!(OffsetIndex::load_snapshot(&options.snapshot_for(&listing)).unwrap(), idx);
    }

    #[test]
    fn test_load_or_build_missing_listing_is_an_error() {
        let dir = tempdir().unwrap();
        let res = OffsetIndex::load_or_build(&dir.path().join("nope.txt"), &IndexOptions::default());
        assert!(matches!(res, Err(IndexError::Io { .. })));
    }

    #[test]
    fn test_build_from_bz2_listing() {
        use bzip2::write::BzEncoder;
        use bzip2::Compression;
        use std::io::Write;

        let dir = tempdir().unwrap();
        let listing = dir.path().join("index.txt.bz2");
        let mut enc = BzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(LISTING.as_bytes()).unwrap();
        fs::write(&listing, enc.finish().unwrap()).unwrap();

        let (idx, stats) = OffsetIndex::build_from_path(&listing, &IndexOptions::default()).unwrap();
        assert_eq!(stats.entries, 9);
        assert_eq!(idx, index());
    }
}
