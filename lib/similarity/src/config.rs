//! Deduplication configuration
//!
//! A single threshold drives both per-field acceptance and group admission.

use dedupx_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Default similarity threshold
pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// How a group's matched fields and confidence are attributed when it has
/// more than one accepted pair
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MatchAttribution {
    /// Keep only the most recently accepted pair's matches and confidence
    #[default]
    LastPair,
    /// Keep the best similarity per field across all accepted pairs, and the
    /// best pair confidence
    Union,
}

impl fmt::Display for MatchAttribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchAttribution::LastPair => write!(f, "last-pair"),
            MatchAttribution::Union => write!(f, "union"),
        }
    }
}

impl FromStr for MatchAttribution {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "last-pair" | "last_pair" | "lastpair" => Ok(MatchAttribution::LastPair),
            "union" => Ok(MatchAttribution::Union),
            other => Err(format!(
                "unknown attribution '{}', expected 'last-pair' or 'union'",
                other
            )),
        }
    }
}

/// Configuration for a clustering run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DedupConfig {
    /// Minimum similarity, in (0, 1], for a field match and for row admission
    pub threshold: f64,
    /// Score candidate pairs of a seed on the rayon pool
    pub parallel: bool,
    pub attribution: MatchAttribution,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            parallel: true,
            attribution: MatchAttribution::LastPair,
        }
    }
}

impl DedupConfig {
    /// Create a validated configuration with the given threshold
    pub fn new(threshold: f64) -> Result<Self> {
        let config = Self {
            threshold,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_attribution(mut self, attribution: MatchAttribution) -> Self {
        self.attribution = attribution;
        self
    }

    /// Check that the threshold lies in (0, 1]
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 || self.threshold > 1.0 {
            return Err(Error::InvalidConfig(format!(
                "threshold must be in (0, 1], got {}",
                self.threshold
            )));
        }
        Ok(())
    }

    /// Load and validate a JSON configuration file. Missing keys take defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: DedupConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }
}
