//! # dedupx Similarity
//!
//! Fuzzy matching and greedy clustering of tabular rows, plus metadata
//! scoring for whole-file near-duplicates.
//!
//! ## Features
//!
//! - **Field similarity**: case-insensitive Dice coefficient over character bigrams
//! - **Metadata similarity**: mean of size, type, period and spatial-domain factors
//! - **Row clustering**: single-pass greedy grouping with field-level provenance
//! - **Reports**: serializable duplicate reports with group ids and explanations
//!
//! ## Example
//!
//! ```rust
//! use dedupx_core::Table;
//! use dedupx_similarity::{DedupConfig, RowClusterer, DuplicateReport};
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
//! assert_eq!(groups[0].member_indices, vec![0, 1]);
//!
//! let report = DuplicateReport::assemble(&table, groups, &config);
//! assert_eq!(report.duplicate_rows, 2);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │    Table    │────>│  Clusterer  │────>│   Report    │
//! │   (rows)    │     │  (greedy)   │     │ (group ids) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            │
//!                     ┌─────────────┐
//!                     │  Distance   │
//!                     │ (bigrams)   │
//!                     └─────────────┘
//! ```

pub mod cluster;
pub mod config;
pub mod distance;
pub mod files;
pub mod report;

pub use cluster::{score_pair, PairScore, RowClusterer};
pub use config::{DedupConfig, MatchAttribution, DEFAULT_THRESHOLD};
pub use distance::{dice_coefficient, field_similarity, metadata_similarity, size_similarity};
pub use files::{
    index_files, media_type_for_path, rank_similar_files, IndexedFile, MatchKind, SimilarFile,
};
pub use report::{DuplicateReport, ReportGroup};
