//! Greedy row deduplication
//!
//! Seeds are taken in ascending row order. Each unclaimed later row is scored
//! against the seed; rows whose best field similarity reaches the threshold
//! join the seed's group and are claimed for good. There is no backtracking
//! and no transitive closure: a row claimed by an earlier seed is never
//! reconsidered, even if it would match a later seed better.
//!
//! Scoring the partners of one seed only reads rows, so it runs on the rayon
//! pool. Claiming rows and closing groups stays sequential per seed.

use crate::config::{DedupConfig, MatchAttribution};
use crate::distance::field_similarity;
use dedupx_core::{CancelToken, DuplicateGroup, FieldMatch, Result, Row, Table};
use rayon::prelude::*;
use tracing::{debug, info};

/// Below this many partners a seed is scored on the calling thread
const PARALLEL_MIN_PARTNERS: usize = 64;

/// Field-by-field comparison of one pair of rows
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PairScore {
    /// Best similarity over all comparable fields, 0.0 if none were comparable
    pub max_similarity: f64,
    /// Fields at or above the threshold, in the first row's column order
    pub matches: Vec<FieldMatch>,
}

/// Compare every field that is non-null in both rows
pub fn score_pair(a: &Row, b: &Row, threshold: f64) -> PairScore {
    let mut score = PairScore::default();

    for (name, left) in a.present_fields() {
        let Some(right) = b.get(name) else {
            continue;
        };
        let Some(similarity) = field_similarity(left, right) else {
            continue;
        };

        if similarity > score.max_similarity {
            score.max_similarity = similarity;
        }
        if similarity >= threshold {
            score.matches.push(FieldMatch::new(name, similarity));
        }
    }

    score
}

/// Row deduplication clusterer
#[derive(Debug, Clone)]
pub struct RowClusterer {
    config: DedupConfig,
    cancel: Option<CancelToken>,
}

impl RowClusterer {
    /// Create a clusterer, rejecting an invalid configuration
    pub fn new(config: DedupConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: None,
        })
    }

    /// Stop the run with `Error::Cancelled` once `token` is cancelled.
    /// The token is checked before every seed and between pair evaluations.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &DedupConfig {
        &self.config
    }

    /// Cluster the rows of a table
    pub fn cluster(&self, table: &Table) -> Result<Vec<DuplicateGroup>> {
        self.cluster_rows(table.rows())
    }

    /// Cluster rows by position. Groups come out in ascending anchor order.
    pub fn cluster_rows(&self, rows: &[Row]) -> Result<Vec<DuplicateGroup>> {
        let threshold = self.config.threshold;
        let n = rows.len();
        let mut processed = vec![false; n];
        let mut groups = Vec::new();

        info!(rows = n, threshold, "clustering rows");

        for seed in 0..n {
            self.check_cancelled()?;
            if processed[seed] {
                continue;
            }

            let partners: Vec<usize> = (seed + 1..n).filter(|&j| !processed[j]).collect();
            let scores = self.score_partners(rows, seed, &partners)?;

            let mut group: Option<DuplicateGroup> = None;
            for (j, score) in scores {
                if score.max_similarity < threshold {
                    continue;
                }
                let current =
                    group.get_or_insert_with(|| DuplicateGroup::new(seed, rows[seed].clone()));
                current.push_member(j, rows[j].clone());
                self.attribute(current, score);
                processed[j] = true;
            }

            if let Some(group) = group.filter(|g| g.len() >= 2) {
                debug!(
                    anchor = seed,
                    members = group.len(),
                    confidence = group.confidence,
                    "duplicate group"
                );
                processed[seed] = true;
                groups.push(group);
            }
        }

        info!(rows = n, groups = groups.len(), "clustering finished");
        Ok(groups)
    }

    fn score_partners(
        &self,
        rows: &[Row],
        seed: usize,
        partners: &[usize],
    ) -> Result<Vec<(usize, PairScore)>> {
        let threshold = self.config.threshold;
        let anchor = &rows[seed];
        let evaluate = |&j: &usize| -> Result<(usize, PairScore)> {
            self.check_cancelled()?;
            Ok((j, score_pair(anchor, &rows[j], threshold)))
        };

        if self.config.parallel && partners.len() >= PARALLEL_MIN_PARTNERS {
            partners.par_iter().map(evaluate).collect()
        } else {
            partners.iter().map(evaluate).collect()
        }
    }

    fn attribute(&self, group: &mut DuplicateGroup, score: PairScore) {
        match self.config.attribution {
            MatchAttribution::LastPair => {
                group.matched_fields = score.matches;
                group.confidence = score.max_similarity;
            }
            MatchAttribution::Union => {
                for m in score.matches {
                    match group
                        .matched_fields
                        .iter_mut()
                        .find(|existing| existing.field_name == m.field_name)
                    {
                        Some(existing) => {
                            existing.similarity = existing.similarity.max(m.similarity)
                        }
                        None => group.matched_fields.push(m),
                    }
                }
                group.confidence = group.confidence.max(score.max_similarity);
            }
        }
    }

    #[inline]
    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(token) => token.check(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dedupx_core::Error;
    use serde_json::{json, Value};

    fn rows(values: Vec<Value>) -> Vec<Row> {
        values.into_iter().map(|v| Row::from_json(v).unwrap()).collect()
    }

    fn clusterer(threshold: f64) -> RowClusterer {
        RowClusterer::new(DedupConfig::new(threshold).unwrap()).unwrap()
    }

    #[test]
    fn test_exact_duplicate_pair() {
        let rows = rows(vec![
            json!({"name": "Alice", "age": "30"}),
            json!({"name": "Alice", "age": "30"}),
            json!({"name": "Bob", "age": "40"}),
        ]);
        let groups = clusterer(0.8).cluster_rows(&rows).unwrap();

        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.anchor, 0);
        assert_eq!(group.member_indices, vec![0, 1]);
        assert_eq!(group.confidence, 1.0);
        assert_eq!(
            group.matched_fields,
            vec![FieldMatch::new("name", 1.0), FieldMatch::new("age", 1.0)]
        );
        assert_eq!(group.members[1].index, 1);
        assert_eq!(group.members[1].fields, rows[1]);
    }

    #[test]
    fn test_empty_and_single_row() {
        assert!(clusterer(0.8).cluster_rows(&[]).unwrap().is_empty());
        let one = rows(vec![json!({"name": "Alice"})]);
        assert!(clusterer(0.8).cluster_rows(&one).unwrap().is_empty());
    }

    #[test]
    fn test_single_field_match_is_enough() {
        // Any one field at or above the threshold admits the row
        let rows = rows(vec![
            json!({"email": "a@x.io", "name": "Alice"}),
            json!({"email": "a@x.io", "name": "Zed"}),
        ]);
        let groups = clusterer(0.9).cluster_rows(&rows).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].matched_fields, vec![FieldMatch::new("email", 1.0)]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        // night/nacht scores exactly 0.25
        let rows = rows(vec![json!({"w": "night"}), json!({"w": "nacht"})]);
        assert_eq!(clusterer(0.25).cluster_rows(&rows).unwrap().len(), 1);
        assert!(clusterer(0.26).cluster_rows(&rows).unwrap().is_empty());
    }

    #[test]
    fn test_nulls_and_missing_fields_not_compared() {
        let rows = rows(vec![
            json!({"name": null, "city": "Paris"}),
            json!({"name": null, "zip": "75001"}),
            json!({"city": null}),
        ]);
        let (a, b) = (&rows[0], &rows[1]);
        assert_eq!(score_pair(a, b, 0.5), PairScore::default());
        assert!(clusterer(0.1).cluster_rows(&rows).unwrap().is_empty());
    }

    #[test]
    fn test_claimed_rows_are_not_reused() {
        // Row 2 matches both 0 and 1, but 0 claims it first
        let rows = rows(vec![
            json!({"k": "apple pie"}),
            json!({"k": "cherry pie"}),
            json!({"k": "apple pie"}),
            json!({"k": "cherry pie"}),
        ]);
        let groups = clusterer(0.9).cluster_rows(&rows).unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].member_indices, vec![0, 2]);
        assert_eq!(groups[1].member_indices, vec![1, 3]);
    }

    #[test]
    fn test_greedy_no_backtracking() {
        // 1 also matches 2 on `b`, but seed 0 claims 1 first and 2 is left alone
        let rows = rows(vec![
            json!({"a": "same", "b": "left"}),
            json!({"a": "same", "b": "right"}),
            json!({"a": "other", "b": "right"}),
        ]);
        let groups = clusterer(1.0).cluster_rows(&rows).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].member_indices, vec![0, 1]);
    }

    #[test]
    fn test_last_pair_attribution() {
        let rows = rows(vec![
            json!({"name": "Alice", "city": "Rome"}),
            json!({"name": "Alice", "city": "Oslo"}),
            json!({"name": "Alicia", "city": "Rome"}),
        ]);
        let groups = clusterer(0.9).cluster_rows(&rows).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].member_indices, vec![0, 1, 2]);
        // Only the (0, 2) comparison is reported
        assert_eq!(groups[0].matched_fields, vec![FieldMatch::new("city", 1.0)]);
        assert_eq!(groups[0].confidence, 1.0);
    }

    #[test]
    fn test_union_attribution() {
        let rows = rows(vec![
            json!({"name": "Alice", "city": "Rome"}),
            json!({"name": "Alice", "city": "Oslo"}),
            json!({"name": "Alicia", "city": "Rome"}),
        ]);
        let config = DedupConfig::new(0.9)
            .unwrap()
            .with_attribution(MatchAttribution::Union);
        let groups = RowClusterer::new(config).unwrap().cluster_rows(&rows).unwrap();
        assert_eq!(
            groups[0].matched_fields,
            vec![FieldMatch::new("name", 1.0), FieldMatch::new("city", 1.0)]
        );
        assert_eq!(groups[0].confidence, 1.0);
    }

    #[test]
    fn test_confidence_follows_last_accepted_pair() {
        // (0, 1) scores 1.0, then (0, 2) scores 20/24 and replaces it
        let rows = rows(vec![
            json!({"name": "Jonathan Smith"}),
            json!({"name": "Jonathan Smith"}),
            json!({"name": "Jonathon Smith"}),
        ]);
        let expected = 20.0 / 24.0;

        let groups = clusterer(0.8).cluster_rows(&rows).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].member_indices, vec![0, 1, 2]);
        assert!((groups[0].confidence - expected).abs() < 1e-12);
        assert_eq!(groups[0].matched_fields.len(), 1);
        assert_eq!(groups[0].matched_fields[0].field_name, "name");
        assert!((groups[0].matched_fields[0].similarity - expected).abs() < 1e-12);

        let config = DedupConfig::new(0.8)
            .unwrap()
            .with_attribution(MatchAttribution::Union);
        let groups = RowClusterer::new(config).unwrap().cluster_rows(&rows).unwrap();
        assert_eq!(groups[0].confidence, 1.0);
        assert_eq!(groups[0].matched_fields, vec![FieldMatch::new("name", 1.0)]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let names = ["alpha", "bravo", "charlie", "delta", "echo", "foxtrot"];
        let values: Vec<Value> = (0..200)
            .map(|i| json!({"name": names[i % names.len()], "n": (i % 7).to_string()}))
            .collect();
        let rows = rows(values);

        let parallel = RowClusterer::new(DedupConfig::new(0.8).unwrap())
            .unwrap()
            .cluster_rows(&rows)
            .unwrap();
        let sequential = RowClusterer::new(DedupConfig::new(0.8).unwrap().with_parallel(false))
            .unwrap()
            .cluster_rows(&rows)
            .unwrap();
        assert_eq!(parallel, sequential);
        assert!(!parallel.is_empty());
    }

    #[test]
    fn test_cancelled_before_start() {
        let rows = rows(vec![json!({"a": "x"}), json!({"a": "x"})]);
        let token = CancelToken::new();
        token.cancel();
        let result = clusterer(0.8).with_cancel_token(token).cluster_rows(&rows);
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_cancelled_from_another_thread() {
        // Disjoint field names: no pair is comparable, so every seed scans all partners
        let rows: Vec<Row> = (0..20_000)
            .map(|i| {
                let mut row = Row::new();
                row.insert(format!("f{}", i), json!("value")).unwrap();
                row
            })
            .collect();

        let token = CancelToken::new();
        let canceller = {
            let token = token.clone();
            std::thread::spawn(move || {
                std::thread::sleep(std::time::Duration::from_millis(20));
                token.cancel();
            })
        };

        let result = clusterer(0.8).with_cancel_token(token).cluster_rows(&rows);
        canceller.join().unwrap();
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let config = DedupConfig {
            threshold: 1.01,
            ..DedupConfig::default()
        };
        assert!(matches!(RowClusterer::new(config), Err(Error::InvalidConfig(_))));
    }
}
