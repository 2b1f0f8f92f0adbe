//! Field and metadata similarity functions
//!
//! All functions return a similarity score in range [0.0, 1.0] where 1.0 means identical.

use ahash::AHashMap;
use dedupx_core::{value_as_text, FileMetadata};
use serde_json::Value;

/// Similarity between two cell values.
///
/// Both values are rendered as text and compared case-insensitively with
/// [`dice_coefficient`]. Returns `None` when either side is null, meaning the
/// field is not comparable for this pair.
pub fn field_similarity(a: &Value, b: &Value) -> Option<f64> {
    let a = value_as_text(a)?;
    let b = value_as_text(b)?;
    Some(dice_coefficient(&a, &b))
}

/// Sørensen–Dice coefficient over character bigrams.
///
/// Whitespace is ignored and comparison is case-insensitive. Bigrams are
/// counted as a multiset, so repeated pairs only match as often as they occur
/// on both sides. Identical normalized strings score 1.0; a string shorter
/// than two characters that is not identical to the other scores 0.0.
pub fn dice_coefficient(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);

    if a == b {
        return 1.0;
    }
    if a.len() < 2 || b.len() < 2 {
        return 0.0;
    }

    let mut bigrams: AHashMap<(char, char), usize> = AHashMap::with_capacity(a.len());
    for pair in a.windows(2) {
        *bigrams.entry((pair[0], pair[1])).or_insert(0) += 1;
    }

    let mut intersection = 0usize;
    for pair in b.windows(2) {
        if let Some(count) = bigrams.get_mut(&(pair[0], pair[1])) {
            if *count > 0 {
                *count -= 1;
                intersection += 1;
            }
        }
    }

    (2 * intersection) as f64 / (a.len() + b.len() - 2) as f64
}

fn normalize(s: &str) -> Vec<char> {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Similarity between two file metadata records.
///
/// Each factor present on both sides contributes a partial score:
/// - size: `1 - |a - b| / max(a, b)`, or 1.0 when both are zero
/// - type: 1.0 when identical
/// - period: 1.0 when the periods overlap
/// - spatial domain: 1.0 when identical
///
/// The result is the mean over the comparable factors, or 0.0 when there are none.
pub fn metadata_similarity(a: &FileMetadata, b: &FileMetadata) -> f64 {
    let mut total = 0.0;
    let mut factors = 0u32;

    if let (Some(x), Some(y)) = (a.size, b.size) {
        total += size_similarity(x, y);
        factors += 1;
    }
    if let (Some(x), Some(y)) = (&a.media_type, &b.media_type) {
        total += exact(x == y);
        factors += 1;
    }
    if let (Some(x), Some(y)) = (&a.period, &b.period) {
        total += exact(x.overlaps(y));
        factors += 1;
    }
    if let (Some(x), Some(y)) = (&a.spatial_domain, &b.spatial_domain) {
        total += exact(x == y);
        factors += 1;
    }

    if factors == 0 {
        0.0
    } else {
        total / factors as f64
    }
}

/// Relative size similarity: `1 - |a - b| / max(a, b)`
pub fn size_similarity(a: u64, b: u64) -> f64 {
    let max = a.max(b);
    if max == 0 {
        1.0
    } else {
        1.0 - a.abs_diff(b) as f64 / max as f64
    }
}

#[inline]
fn exact(equal: bool) -> f64 {
    if equal {
        1.0
    } else {
        0.0
    }
}
