//! Ranking of whole-file duplicate candidates
//!
//! Combines the output of a proximity search with metadata similarity into a
//! single list of similar files, and drives batch indexing of new files.

use crate::distance::metadata_similarity;
use dedupx_core::{
    hash, DuplicateCandidateSet, FileIndex, FileMetadata, FileRecord, ProximitySearch, Result,
};
use serde::Serialize;
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Why a file was reported as similar
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MatchKind {
    /// Identical content digest
    Exact,
    /// Different content, size within the proximity window
    SimilarBySize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarFile {
    pub record: FileRecord,
    pub kind: MatchKind,
    pub score: f64,
}

/// Merge a candidate set into a ranked similar-file list.
///
/// Exact matches score 1.0. Size-window matches are scored against `query`
/// with [`metadata_similarity`] and dropped below `min_score`. Exact matches
/// come first, then by descending score, ties broken by id.
pub fn rank_similar_files(
    query: &FileMetadata,
    candidates: DuplicateCandidateSet,
    min_score: f64,
) -> Vec<SimilarFile> {
    let exact = candidates.exact.into_iter().map(|record| SimilarFile {
        record,
        kind: MatchKind::Exact,
        score: 1.0,
    });

    let near = candidates
        .similar_by_size
        .into_iter()
        .map(|record| {
            let score = metadata_similarity(query, &record.metadata());
            SimilarFile {
                record,
                kind: MatchKind::SimilarBySize,
                score,
            }
        })
        .filter(|f| f.score >= min_score);

    let mut ranked: Vec<SimilarFile> = exact.chain(near).collect();
    ranked.sort_by(|a, b| {
        let kind_rank = |k: MatchKind| match k {
            MatchKind::Exact => 0,
            MatchKind::SimilarBySize => 1,
        };
        kind_rank(a.kind)
            .cmp(&kind_rank(b.kind))
            .then_with(|| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal))
            .then_with(|| a.record.id.cmp(&b.record.id))
    });
    ranked
}

/// A file added to an index, with what it matched before insertion
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedFile {
    pub path: PathBuf,
    pub record: FileRecord,
    pub similar: Vec<SimilarFile>,
}

/// Hash `paths`, rank each file against `index`, then insert it under a new id.
///
/// Every file is hashed before the first insert, so an unreadable path fails
/// the batch with `Error::Unreadable` and nothing is written. Files are
/// searched and inserted in order; later files see earlier ones as matches.
/// `media_type` applies to every file, otherwise it is inferred per path.
pub fn index_files(
    index: &dyn FileIndex,
    paths: &[PathBuf],
    media_type: Option<&str>,
    min_score: f64,
) -> Result<Vec<IndexedFile>> {
    let hashed = hash::hash_all(paths)?;
    let search = ProximitySearch::new(index);
    let mut added = Vec::with_capacity(hashed.len());

    for (path, digest, size) in hashed {
        let candidates = search.search(&digest, size)?;
        let kind = match media_type {
            Some(kind) => kind.to_string(),
            None => media_type_for_path(&path),
        };
        let record = FileRecord::new(Uuid::new_v4().to_string(), size, digest, kind);
        let similar = rank_similar_files(&record.metadata(), candidates, min_score);

        index.insert(record.clone())?;
        debug!(path = ?path, id = %record.id, similar = similar.len(), "indexed file");
        added.push(IndexedFile {
            path,
            record,
            similar,
        });
    }

    info!(files = added.len(), "batch indexed");
    Ok(added)
}

/// Media type guessed from a file extension
pub fn media_type_for_path(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase());
    match ext.as_deref() {
        Some("csv") => "text/csv",
        Some("tsv") => "text/tab-separated-values",
        Some("xlsx") => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        Some("xls") => "application/vnd.ms-excel",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranking_order_and_cutoff() {
        let query = FileMetadata {
            size: Some(100),
            media_type: Some("text/csv".into()),
            ..Default::default()
        };
        let candidates = DuplicateCandidateSet {
            exact: vec![FileRecord::new("z-exact", 100, "d0", "text/csv")],
            similar_by_size: vec![
                FileRecord::new("xlsx", 100, "d1", "application/vnd.ms-excel"),
                FileRecord::new("csv", 105, "d2", "text/csv"),
                FileRecord::new("csv-b", 105, "d3", "text/csv"),
            ],
        };

        let ranked = rank_similar_files(&query, candidates, 0.6);
        let ids: Vec<&str> = ranked.iter().map(|f| f.record.id.as_str()).collect();
        // xlsx scores (1 + 0) / 2 = 0.5 and is cut
        assert_eq!(ids, vec!["z-exact", "csv", "csv-b"]);
        assert_eq!(ranked[0].kind, MatchKind::Exact);
        assert_eq!(ranked[0].score, 1.0);
        assert!(ranked[1].score > 0.9 && ranked[1].score < 1.0);
    }

    #[test]
    fn test_media_type_for_path() {
        assert_eq!(media_type_for_path(Path::new("a/B.CSV")), "text/csv");
        assert_eq!(media_type_for_path(Path::new("x.json")), "application/json");
        assert_eq!(
            media_type_for_path(Path::new("noext")),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_empty_candidates() {
        let ranked = rank_similar_files(
            &FileMetadata::default(),
            DuplicateCandidateSet::default(),
            0.0,
        );
        assert!(ranked.is_empty());
    }
}
