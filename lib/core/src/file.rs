//! Stored-file model used by whole-file duplicate detection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A closed time interval covered by a file's data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Period {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Inclusive overlap test
    pub fn overlaps(&self, other: &Period) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Comparable metadata of a file. Every factor is optional; only factors
/// present on both sides take part in a comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial_domain: Option<String>,
}

/// A file as known to the storage layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub size: u64,
    /// Lowercase hex SHA-256 of the file contents
    pub digest: String,
    pub media_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial_domain: Option<String>,
    #[serde(default)]
    pub deleted: bool,
}

impl FileRecord {
    pub fn new(
        id: impl Into<String>,
        size: u64,
        digest: impl Into<String>,
        media_type: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            size,
            digest: digest.into(),
            media_type: media_type.into(),
            period: None,
            spatial_domain: None,
            deleted: false,
        }
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.period = Some(period);
        self
    }

    pub fn with_spatial_domain(mut self, domain: impl Into<String>) -> Self {
        self.spatial_domain = Some(domain.into());
        self
    }

    /// Metadata view used by the metadata similarity scorer
    pub fn metadata(&self) -> FileMetadata {
        FileMetadata {
            size: Some(self.size),
            media_type: Some(self.media_type.clone()),
            period: self.period,
            spatial_domain: self.spatial_domain.clone(),
        }
    }
}

/// Result of a proximity lookup. The two lists are disjoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateCandidateSet {
    /// Live files whose digest equals the query digest
    pub exact: Vec<FileRecord>,
    /// Live files within the size window whose digest differs
    pub similar_by_size: Vec<FileRecord>,
}

impl DuplicateCandidateSet {
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.similar_by_size.is_empty()
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.similar_by_size.len()
    }
}
