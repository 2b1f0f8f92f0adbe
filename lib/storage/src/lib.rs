pub mod lmdb_storage;
pub mod memory;

pub use lmdb_storage::LmdbFileIndex;
pub use memory::MemoryFileIndex;
