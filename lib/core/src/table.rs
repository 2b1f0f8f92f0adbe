//! Tabular input model
//!
//! A [`Table`] is the hand-off from whatever loader parsed the source file:
//! an ordered list of unique headers plus an ordered list of [`Row`]s.
//! Row position (0-based) is the identity used by the clusterer.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::HashSet;

/// One record of a table, keyed by header name in column order.
///
/// Values are JSON scalars (string, number, bool) or null. Nested arrays and
/// objects are rejected at construction time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Row {
    fields: Map<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from a JSON object
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Self::try_from(map),
            other => Err(Error::InputShape(format!(
                "row must be an object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Insert or replace a field value
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Result<()> {
        let name = name.into();
        ensure_scalar(&name, &value)?;
        self.fields.insert(name, value);
        Ok(())
    }

    /// Get a field value, treating explicit nulls as absent
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    /// Iterate over all fields (including nulls) in column order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over fields that carry a value
    pub fn present_fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.iter().filter(|(_, v)| !v.is_null())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl TryFrom<Map<String, Value>> for Row {
    type Error = Error;

    fn try_from(fields: Map<String, Value>) -> Result<Self> {
        for (name, value) in &fields {
            ensure_scalar(name, value)?;
        }
        Ok(Self { fields })
    }
}

impl From<Row> for Map<String, Value> {
    fn from(row: Row) -> Self {
        row.fields
    }
}

/// Render a scalar as text for comparison. Null and nested values yield `None`.
///
/// Whole-valued floats lose their fraction, so `30.0` and `"30"` compare equal.
pub fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(number_as_text(n)),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn number_as_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f == 0.0 => "0".to_string(),
        // f64 Display prints 30.0 as "30" and keeps 0.5 as "0.5"
        Some(f) if n.is_f64() => f.to_string(),
        _ => n.to_string(),
    }
}

fn ensure_scalar(name: &str, value: &Value) -> Result<()> {
    match value {
        Value::Array(_) | Value::Object(_) => Err(Error::InputShape(format!(
            "field '{}' holds a {}, expected a scalar or null",
            name,
            json_kind(value)
        ))),
        _ => Ok(()),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Ordered headers plus ordered rows, as produced by a table loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Create a table, rejecting duplicate header names
    pub fn new(headers: Vec<String>, rows: Vec<Row>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(headers.len());
        for header in &headers {
            if !seen.insert(header.as_str()) {
                return Err(Error::InputShape(format!("duplicate header '{}'", header)));
            }
        }
        Ok(Self { headers, rows })
    }

    /// Create a table whose headers are the field names in first-seen order
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut seen = HashSet::new();
        let mut headers = Vec::new();
        for row in &rows {
            for (name, _) in row.iter() {
                if seen.insert(name.to_string()) {
                    headers.push(name.to_string());
                }
            }
        }
        Self { headers, rows }
    }

    /// Parse a table from JSON.
    ///
    /// Accepts either `{"headers": [...], "rows": [...]}` or a bare array of
    /// row objects.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) => Ok(Self::from_rows(parse_rows(items)?)),
            Value::Object(obj) => {
                let rows = match obj.get("rows") {
                    Some(Value::Array(items)) => parse_rows(items)?,
                    Some(other) => {
                        return Err(Error::InputShape(format!(
                            "'rows' must be an array, got {}",
                            json_kind(other)
                        )))
                    }
                    None => return Err(Error::InputShape("missing 'rows'".to_string())),
                };

                match obj.get("headers") {
                    None => Ok(Self::from_rows(rows)),
                    Some(Value::Array(items)) => {
                        let headers = items
                            .iter()
                            .map(|h| {
                                h.as_str().map(str::to_string).ok_or_else(|| {
                                    Error::InputShape("headers must be strings".to_string())
                                })
                            })
                            .collect::<Result<Vec<_>>>()?;
                        Self::new(headers, rows)
                    }
                    Some(other) => Err(Error::InputShape(format!(
                        "'headers' must be an array, got {}",
                        json_kind(other)
                    ))),
                }
            }
            other => Err(Error::InputShape(format!(
                "table must be an object or array, got {}",
                json_kind(other)
            ))),
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(s)?;
        Self::from_json(&value)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn parse_rows(items: &[Value]) -> Result<Vec<Row>> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            Row::from_json(item.clone())
                .map_err(|e| Error::InputShape(format!("row {}: {}", i, e)))
        })
        .collect()
}
