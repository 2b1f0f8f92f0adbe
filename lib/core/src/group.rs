use crate::table::Row;
use serde::{Deserialize, Serialize};

/// A field whose similarity met the threshold for an accepted pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMatch {
    pub field_name: String,
    pub similarity: f64,
}

impl FieldMatch {
    pub fn new(field_name: impl Into<String>, similarity: f64) -> Self {
        Self {
            field_name: field_name.into(),
            similarity,
        }
    }
}

/// A row that belongs to a duplicate group, with a copy of its fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMember {
    pub index: usize,
    pub fields: Row,
}

/// A cluster of rows considered duplicates of the anchor row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
    /// Seed row the group was grown around
    pub anchor: usize,
    /// Member row indices: anchor first, then duplicates in ascending order
    pub member_indices: Vec<usize>,
    pub members: Vec<GroupMember>,
    pub matched_fields: Vec<FieldMatch>,
    pub confidence: f64,
}

impl DuplicateGroup {
    pub fn new(anchor: usize, anchor_fields: Row) -> Self {
        Self {
            anchor,
            member_indices: vec![anchor],
            members: vec![GroupMember {
                index: anchor,
                fields: anchor_fields,
            }],
            matched_fields: Vec::new(),
            confidence: 0.0,
        }
    }

    pub fn push_member(&mut self, index: usize, fields: Row) {
        self.member_indices.push(index);
        self.members.push(GroupMember { index, fields });
    }

    pub fn len(&self) -> usize {
        self.member_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.member_indices.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.member_indices.contains(&index)
    }
}
