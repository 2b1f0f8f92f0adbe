use dedupx_core::{Error, FileIndex, FileRecord, Result};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

#[derive(Default)]
struct Inner {
    records: HashMap<String, FileRecord>,
    by_digest: HashMap<String, BTreeSet<String>>,
    by_size: BTreeMap<u64, BTreeSet<String>>,
}

impl Inner {
    fn unlink(&mut self, record: &FileRecord) {
        if let Some(ids) = self.by_digest.get_mut(&record.digest) {
            ids.remove(&record.id);
            if ids.is_empty() {
                self.by_digest.remove(&record.digest);
            }
        }
        if let Some(ids) = self.by_size.get_mut(&record.size) {
            ids.remove(&record.id);
            if ids.is_empty() {
                self.by_size.remove(&record.size);
            }
        }
    }

    fn collect<'a>(&self, ids: impl Iterator<Item = &'a String>) -> Vec<FileRecord> {
        ids.filter_map(|id| self.records.get(id).cloned()).collect()
    }
}

/// In-memory file index with digest buckets and an ordered size map
#[derive(Default)]
pub struct MemoryFileIndex {
    inner: RwLock<Inner>,
}

impl MemoryFileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from existing records
    pub fn from_records(records: impl IntoIterator<Item = FileRecord>) -> Result<Self> {
        let index = Self::new();
        for record in records {
            index.insert(record)?;
        }
        Ok(index)
    }

    /// Soft-delete a record, failing if the id is unknown
    pub fn delete(&self, id: &str) -> Result<()> {
        if self.mark_deleted(id)? {
            Ok(())
        } else {
            Err(Error::RecordNotFound(id.to_string()))
        }
    }
}

impl FileIndex for MemoryFileIndex {
    fn find_by_digest(&self, digest: &str) -> Result<Vec<FileRecord>> {
        let inner = self.inner.read();
        Ok(match inner.by_digest.get(digest) {
            Some(ids) => inner.collect(ids.iter()),
            None => Vec::new(),
        })
    }

    fn find_by_size_range(&self, min: u64, max: u64) -> Result<Vec<FileRecord>> {
        if min > max {
            return Ok(Vec::new());
        }
        let inner = self.inner.read();
        Ok(inner.collect(inner.by_size.range(min..=max).flat_map(|(_, ids)| ids.iter())))
    }

    fn insert(&self, record: FileRecord) -> Result<()> {
        let mut inner = self.inner.write();
        if let Some(previous) = inner.records.remove(&record.id) {
            inner.unlink(&previous);
        }
        inner
            .by_digest
            .entry(record.digest.clone())
            .or_default()
            .insert(record.id.clone());
        inner
            .by_size
            .entry(record.size)
            .or_default()
            .insert(record.id.clone());
        debug!(id = %record.id, size = record.size, "indexed file");
        inner.records.insert(record.id.clone(), record);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<FileRecord>> {
        Ok(self.inner.read().records.get(id).cloned())
    }

    fn mark_deleted(&self, id: &str) -> Result<bool> {
        let mut inner = self.inner.write();
        match inner.records.get_mut(id) {
            Some(record) => {
                record.deleted = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn count(&self) -> Result<usize> {
        Ok(self.inner.read().records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dedupx_core::ProximitySearch;

    fn record(id: &str, size: u64, digest: &str) -> FileRecord {
        FileRecord::new(id, size, digest, "text/csv")
    }

    #[test]
    fn test_lookup_by_digest_and_size() {
        let index = MemoryFileIndex::from_records([
            record("a", 100, "d1"),
            record("b", 95, "d2"),
            record("c", 200, "d1"),
        ])
        .unwrap();

        let by_digest: Vec<String> = index
            .find_by_digest("d1")
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(by_digest, vec!["a", "c"]);

        let by_size: Vec<String> = index
            .find_by_size_range(90, 110)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(by_size, vec!["b", "a"]);
        assert!(index.find_by_size_range(10, 5).unwrap().is_empty());
    }

    #[test]
    fn test_reinsert_moves_buckets() {
        let index = MemoryFileIndex::new();
        index.insert(record("a", 100, "old")).unwrap();
        index.insert(record("a", 500, "new")).unwrap();

        assert_eq!(index.count().unwrap(), 1);
        assert!(index.find_by_digest("old").unwrap().is_empty());
        assert!(index.find_by_size_range(100, 100).unwrap().is_empty());
        assert_eq!(index.find_by_digest("new").unwrap().len(), 1);
    }

    #[test]
    fn test_soft_delete() {
        let index = MemoryFileIndex::from_records([record("a", 100, "d1")]).unwrap();
        index.delete("a").unwrap();
        assert!(index.get("a").unwrap().unwrap().deleted);
        assert!(matches!(index.delete("nope"), Err(Error::RecordNotFound(_))));

        let result = ProximitySearch::new(&index).search("d1", 100).unwrap();
        assert!(result.is_empty());
    }
}
