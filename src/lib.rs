//! # dedupx
//!
//! Duplicate detection for tabular datasets.
//!
//! dedupx finds duplicates at two granularities:
//!
//! - **Whole files**: SHA-256 content digests for exact matches, plus a ±10%
//!   size window for near-duplicates that are then ranked by metadata similarity
//! - **Records**: field-by-field fuzzy comparison of table rows, grouped greedily
//!   into confidence-scored clusters with field-level provenance
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! dedupx rows --input customers.json --threshold 0.85
//! dedupx files add --index ./index data/*.csv
//! dedupx files scan --index ./index upload.csv
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use dedupx::prelude::*;
//! use serde_json::json;
//!
//! let table = Table::from_json(&json!([
//!     {"name": "Alice", "age": "30"},
//!     {"name": "Alice", "age": "30"},
//!     {"name": "Bob", "age": "40"}
//! ])).unwrap();
//!
//! let config = DedupConfig::new(0.8).unwrap();
//! let groups = RowClusterer::new(config).unwrap().cluster(&table).unwrap();
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].confidence, 1.0);
//!
//! let index = MemoryFileIndex::new();
//! let digest = hash::hash_bytes(b"name,age\nAlice,30\n");
//! index.insert(FileRecord::new("f1", 18, digest.clone(), "text/csv")).unwrap();
//! let candidates = ProximitySearch::new(&index).search(&digest, 18).unwrap();
//! assert_eq!(candidates.exact.len(), 1);
//! ```
//!
//! ## Crate Structure
//!
//! - [`dedupx-core`](https://docs.rs/dedupx-core) - Data model, hashing, proximity search
//! - [`dedupx-similarity`](https://docs.rs/dedupx-similarity) - Scorers, row clustering, reports
//! - [`dedupx-storage`](https://docs.rs/dedupx-storage) - In-memory and LMDB file indexes

// Re-export core types
pub use dedupx_core::{
    hash, CancelToken, DuplicateCandidateSet, DuplicateGroup, Error, FieldMatch, FileIndex,
    FileMetadata, FileRecord, GroupMember, Period, ProximitySearch, Result, Row, Table,
};

// Re-export similarity
pub use dedupx_similarity::{
    dice_coefficient, field_similarity, index_files, metadata_similarity, rank_similar_files,
    DedupConfig, DuplicateReport, IndexedFile, MatchAttribution, MatchKind, ReportGroup,
    RowClusterer, SimilarFile,
};

// Re-export storage
pub use dedupx_storage::{LmdbFileIndex, MemoryFileIndex};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        hash, CancelToken, DedupConfig, DuplicateCandidateSet, DuplicateGroup, DuplicateReport,
        Error, FieldMatch, FileIndex, FileMetadata, FileRecord, LmdbFileIndex, MatchAttribution,
        MemoryFileIndex, ProximitySearch, Result, Row, RowClusterer, Table,
    };
}
