// LMDB-backed file index
use anyhow::Result as AnyResult;
use dedupx_core::{Error, FileIndex, FileRecord, Result};
use heed::byteorder::BE;
use heed::types::{Bytes, Str, U64};
use heed::{Database, Env, EnvOpenOptions, RwTxn};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

const DB_RECORDS: &str = "records";
const DB_DIGESTS: &str = "digests";
const DB_SIZES: &str = "sizes";

/// File index persisted in LMDB.
///
/// Records are stored as JSON by id. Two secondary databases map a digest and
/// a big-endian size to the JSON list of ids carrying it, so size windows are
/// a key range scan.
pub struct LmdbFileIndex {
    env: Arc<Env>,
    records_db: Database<Str, Bytes>,
    digests_db: Database<Str, Bytes>,
    sizes_db: Database<U64<BE>, Bytes>,
}

impl LmdbFileIndex {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_inner(path.as_ref()).map_err(unavailable)
    }

    fn open_inner(path: &Path) -> AnyResult<Self> {
        std::fs::create_dir_all(path)?;

        let env = Arc::new(unsafe {
            EnvOpenOptions::new()
                .map_size(10 * 1024 * 1024 * 1024) // 10GB
                .max_dbs(4)
                .open(path)?
        });

        let mut wtxn = env.write_txn()?;
        let records_db = env.create_database(&mut wtxn, Some(DB_RECORDS))?;
        let digests_db = env.create_database(&mut wtxn, Some(DB_DIGESTS))?;
        let sizes_db = env.create_database(&mut wtxn, Some(DB_SIZES))?;
        wtxn.commit()?;

        info!("Opened file index at {:?}", path);

        Ok(Self {
            env,
            records_db,
            digests_db,
            sizes_db,
        })
    }

    fn load_record(&self, txn: &heed::RoTxn, id: &str) -> AnyResult<Option<FileRecord>> {
        match self.records_db.get(txn, id)? {
            Some(data) => Ok(Some(serde_json::from_slice(data)?)),
            None => Ok(None),
        }
    }

    fn load_records(&self, txn: &heed::RoTxn, ids: &[String]) -> AnyResult<Vec<FileRecord>> {
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(record) = self.load_record(txn, id)? {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn digest_ids(&self, txn: &heed::RoTxn, digest: &str) -> AnyResult<Vec<String>> {
        match self.digests_db.get(txn, digest)? {
            Some(data) => Ok(serde_json::from_slice(data)?),
            None => Ok(Vec::new()),
        }
    }

    fn size_ids(&self, txn: &heed::RoTxn, size: u64) -> AnyResult<Vec<String>> {
        match self.sizes_db.get(txn, &size)? {
            Some(data) => Ok(serde_json::from_slice(data)?),
            None => Ok(Vec::new()),
        }
    }

    fn put_digest_ids(&self, wtxn: &mut RwTxn, digest: &str, ids: &[String]) -> AnyResult<()> {
        if ids.is_empty() {
            self.digests_db.delete(wtxn, digest)?;
        } else {
            self.digests_db.put(wtxn, digest, &serde_json::to_vec(ids)?)?;
        }
        Ok(())
    }

    fn put_size_ids(&self, wtxn: &mut RwTxn, size: u64, ids: &[String]) -> AnyResult<()> {
        if ids.is_empty() {
            self.sizes_db.delete(wtxn, &size)?;
        } else {
            self.sizes_db.put(wtxn, &size, &serde_json::to_vec(ids)?)?;
        }
        Ok(())
    }

    fn find_by_digest_inner(&self, digest: &str) -> AnyResult<Vec<FileRecord>> {
        let rtxn = self.env.read_txn()?;
        let ids = self.digest_ids(&rtxn, digest)?;
        self.load_records(&rtxn, &ids)
    }

    fn find_by_size_range_inner(&self, min: u64, max: u64) -> AnyResult<Vec<FileRecord>> {
        let rtxn = self.env.read_txn()?;
        let mut ids = Vec::new();
        for result in self.sizes_db.range(&rtxn, &(min..=max))? {
            let (_, data) = result?;
            let bucket: Vec<String> = serde_json::from_slice(data)?;
            ids.extend(bucket);
        }
        self.load_records(&rtxn, &ids)
    }

    fn insert_inner(&self, record: &FileRecord) -> AnyResult<()> {
        let mut wtxn = self.env.write_txn()?;

        if let Some(previous) = self.load_record(&wtxn, &record.id)? {
            let mut ids = self.digest_ids(&wtxn, &previous.digest)?;
            ids.retain(|id| id != &record.id);
            self.put_digest_ids(&mut wtxn, &previous.digest, &ids)?;

            let mut ids = self.size_ids(&wtxn, previous.size)?;
            ids.retain(|id| id != &record.id);
            self.put_size_ids(&mut wtxn, previous.size, &ids)?;
        }

        let mut ids = self.digest_ids(&wtxn, &record.digest)?;
        ids.push(record.id.clone());
        self.put_digest_ids(&mut wtxn, &record.digest, &ids)?;

        let mut ids = self.size_ids(&wtxn, record.size)?;
        ids.push(record.id.clone());
        self.put_size_ids(&mut wtxn, record.size, &ids)?;

        self.records_db
            .put(&mut wtxn, &record.id, &serde_json::to_vec(record)?)?;
        wtxn.commit()?;
        Ok(())
    }

    fn mark_deleted_inner(&self, id: &str) -> AnyResult<bool> {
        let mut wtxn = self.env.write_txn()?;
        let Some(mut record) = self.load_record(&wtxn, id)? else {
            return Ok(false);
        };
        record.deleted = true;
        self.records_db
            .put(&mut wtxn, id, &serde_json::to_vec(&record)?)?;
        wtxn.commit()?;
        Ok(true)
    }

    fn count_inner(&self) -> AnyResult<usize> {
        let rtxn = self.env.read_txn()?;
        Ok(self.records_db.len(&rtxn)? as usize)
    }
}

fn unavailable(e: anyhow::Error) -> Error {
    Error::IndexUnavailable(e.to_string())
}

impl FileIndex for LmdbFileIndex {
    fn find_by_digest(&self, digest: &str) -> Result<Vec<FileRecord>> {
        self.find_by_digest_inner(digest).map_err(unavailable)
    }

    fn find_by_size_range(&self, min: u64, max: u64) -> Result<Vec<FileRecord>> {
        if min > max {
            return Ok(Vec::new());
        }
        self.find_by_size_range_inner(min, max).map_err(unavailable)
    }

    fn insert(&self, record: FileRecord) -> Result<()> {
        self.insert_inner(&record).map_err(unavailable)?;
        debug!(id = %record.id, size = record.size, "indexed file");
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<FileRecord>> {
        let rtxn = self.env.read_txn().map_err(|e| Error::IndexUnavailable(e.to_string()))?;
        self.load_record(&rtxn, id).map_err(unavailable)
    }

    fn mark_deleted(&self, id: &str) -> Result<bool> {
        self.mark_deleted_inner(id).map_err(unavailable)
    }

    fn count(&self) -> Result<usize> {
        self.count_inner().map_err(unavailable)
    }
}
