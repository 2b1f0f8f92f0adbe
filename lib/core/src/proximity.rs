//! Hash-exact and size-windowed lookup of stored files
//!
//! The storage mechanism lives behind [`FileIndex`]; this module owns only
//! the predicate that decides which records are candidates.

use crate::file::{DuplicateCandidateSet, FileRecord};
use crate::Result;
use tracing::debug;

/// Size tolerance in tenths: a record qualifies when `|size - query| <= query / 10`
pub const SIZE_TOLERANCE_DIVISOR: u64 = 10;

/// Backing store of known files.
///
/// Lookups may return deleted records or records outside the exact range;
/// [`ProximitySearch`] re-applies the full predicate. Errors mean the store
/// could not be searched and must never be reported as an empty result.
pub trait FileIndex: Send + Sync {
    /// Records whose digest equals `digest`
    fn find_by_digest(&self, digest: &str) -> Result<Vec<FileRecord>>;

    /// Records whose size lies in `min..=max`
    fn find_by_size_range(&self, min: u64, max: u64) -> Result<Vec<FileRecord>>;

    /// Insert or replace a record by id
    fn insert(&self, record: FileRecord) -> Result<()>;

    fn get(&self, id: &str) -> Result<Option<FileRecord>>;

    /// Soft-delete a record. Returns false if the id is unknown.
    fn mark_deleted(&self, id: &str) -> Result<bool>;

    /// Number of stored records, deleted ones included
    fn count(&self) -> Result<usize>;
}

/// Inclusive size window `(min, max)` around `size`
pub fn size_window(size: u64) -> (u64, u64) {
    let tolerance = size / SIZE_TOLERANCE_DIVISOR;
    (size - tolerance, size.saturating_add(tolerance))
}

/// Whether `candidate` lies within the size window of `size`
pub fn within_size_window(candidate: u64, size: u64) -> bool {
    candidate.abs_diff(size) <= size / SIZE_TOLERANCE_DIVISOR
}

/// Proximity search over a file index
pub struct ProximitySearch<'a> {
    index: &'a dyn FileIndex,
}

impl<'a> ProximitySearch<'a> {
    pub fn new(index: &'a dyn FileIndex) -> Self {
        Self { index }
    }

    /// Find exact and size-similar candidates for a digest and byte size
    pub fn search(&self, digest: &str, size: u64) -> Result<DuplicateCandidateSet> {
        self.search_inner(digest, size, None)
    }

    /// Like [`search`](Self::search), but never returns the record `exclude_id`.
    /// Use this when the queried file is already indexed.
    pub fn search_excluding(
        &self,
        digest: &str,
        size: u64,
        exclude_id: &str,
    ) -> Result<DuplicateCandidateSet> {
        self.search_inner(digest, size, Some(exclude_id))
    }

    fn search_inner(
        &self,
        digest: &str,
        size: u64,
        exclude_id: Option<&str>,
    ) -> Result<DuplicateCandidateSet> {
        let keep = |record: &FileRecord| !record.deleted && Some(record.id.as_str()) != exclude_id;

        let mut exact: Vec<FileRecord> = self
            .index
            .find_by_digest(digest)?
            .into_iter()
            .filter(|r| keep(r) && r.digest == digest)
            .collect();

        let (min, max) = size_window(size);
        let mut similar_by_size: Vec<FileRecord> = self
            .index
            .find_by_size_range(min, max)?
            .into_iter()
            .filter(|r| keep(r) && r.digest != digest && within_size_window(r.size, size))
            .collect();

        exact.sort_by(|a, b| a.id.cmp(&b.id));
        similar_by_size.sort_by(|a, b| {
            a.size
                .abs_diff(size)
                .cmp(&b.size.abs_diff(size))
                .then_with(|| a.id.cmp(&b.id))
        });

        debug!(
            digest,
            size,
            exact = exact.len(),
            similar_by_size = similar_by_size.len(),
            "proximity search"
        );

        Ok(DuplicateCandidateSet {
            exact,
            similar_by_size,
        })
    }
}
