//! # dedupx Core
//!
//! Core library for the dedupx duplicate detector.
//!
//! This crate provides the data model and the whole-file side of detection:
//!
//! - [`Table`] / [`Row`] - Ordered tabular input handed over by a table loader
//! - [`DuplicateGroup`] / [`FieldMatch`] - Row-level clustering output
//! - [`FileRecord`] / [`FileMetadata`] - Stored-file model
//! - [`hash`] - SHA-256 content hashing
//! - [`ProximitySearch`] - Exact-digest and size-window candidate lookup over a [`FileIndex`]
//! - [`CancelToken`] - Cooperative cancellation for long clustering runs
//!
//! ## Example
//!
//! ```rust
//! use dedupx_core::{hash, Table};
//! use serde_json::json;
//!
//! let digest = hash::hash_bytes(b"name,age\nAlice,30\n");
//! assert_eq!(digest.len(), 64);
//!
//! let table = Table::from_json(&json!([
//!     {"name": "Alice", "age": "30"},
//!     {"name": "Bob", "age": "40"}
//! ])).unwrap();
//! assert_eq!(table.headers(), &["name".to_string(), "age".to_string()]);
//! ```

pub mod cancel;
pub mod error;
pub mod file;
pub mod group;
pub mod hash;
pub mod proximity;
pub mod table;

pub use cancel::CancelToken;
pub use error::{Error, Result};
pub use file::{DuplicateCandidateSet, FileMetadata, FileRecord, Period};
pub use group::{DuplicateGroup, FieldMatch, GroupMember};
pub use proximity::{size_window, within_size_window, FileIndex, ProximitySearch};
pub use table::{value_as_text, Row, Table};
