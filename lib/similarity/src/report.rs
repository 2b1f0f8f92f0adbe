//! Duplicate report assembly
//!
//! Turns clustering output into a serializable report with group ids and a
//! human-readable explanation of which fields matched.

use crate::config::{DedupConfig, MatchAttribution};
use chrono::{DateTime, Utc};
use dedupx_core::{DuplicateGroup, FieldMatch, GroupMember, Result, Table};
use serde::Serialize;
use uuid::Uuid;

/// A duplicate group as exposed to callers
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportGroup {
    pub group_id: Uuid,
    pub anchor_index: usize,
    pub member_indices: Vec<usize>,
    pub members: Vec<GroupMember>,
    pub matched_fields: Vec<FieldMatch>,
    pub confidence: f64,
    pub explanation: String,
}

impl ReportGroup {
    pub fn from_group(group: DuplicateGroup) -> Self {
        let explanation = explain(&group);
        Self {
            group_id: Uuid::new_v4(),
            anchor_index: group.anchor,
            member_indices: group.member_indices,
            members: group.members,
            matched_fields: group.matched_fields,
            confidence: group.confidence,
            explanation,
        }
    }
}

/// Full result of a row deduplication run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateReport {
    pub generated_at: DateTime<Utc>,
    pub threshold: f64,
    pub attribution: MatchAttribution,
    pub headers: Vec<String>,
    pub total_rows: usize,
    /// Rows that belong to some group
    pub duplicate_rows: usize,
    pub groups: Vec<ReportGroup>,
}

impl DuplicateReport {
    /// Build a report for `groups` produced from `table` under `config`
    pub fn assemble(table: &Table, groups: Vec<DuplicateGroup>, config: &DedupConfig) -> Self {
        let duplicate_rows = groups.iter().map(DuplicateGroup::len).sum();
        Self {
            generated_at: Utc::now(),
            threshold: config.threshold,
            attribution: config.attribution,
            headers: table.headers().to_vec(),
            total_rows: table.len(),
            duplicate_rows,
            groups: groups.into_iter().map(ReportGroup::from_group).collect(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn explain(group: &DuplicateGroup) -> String {
    let rows = group
        .member_indices
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let fields = group
        .matched_fields
        .iter()
        .map(|m| format!("{} ({:.0}%)", m.field_name, m.similarity * 100.0))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "rows {} match on {} with confidence {:.0}%",
        rows,
        fields,
        group.confidence * 100.0
    )
}
