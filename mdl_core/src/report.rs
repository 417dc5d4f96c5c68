//! # Transform Reports
//!
//! Every high-level pass on a [`ModelGraph`](crate::graph::ModelGraph)
//! returns a [`TransformReport`]: per-collection counts before and after, the
//! skipped candidates, and when the pass ran. Reports serialize to JSON for
//! the CLI and for audit files written next to a model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{ModelError, ModelResult};

/// Item count of one collection before and after a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountChange {
    pub before: usize,
    pub after: usize,
}

impl CountChange {
    pub fn added(&self) -> isize {
        self.after as isize - self.before as isize
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformReport {
    /// `mirror`, `replicate` or `merge`
    pub operation: String,
    pub generated_at: DateTime<Utc>,
    pub counts: BTreeMap<String, CountChange>,
    /// Non-fatal `GeometryMismatch` entries, in pass order
    pub warnings: Vec<ModelError>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl TransformReport {
    pub fn new(
        operation: impl Into<String>,
        before: &BTreeMap<String, usize>,
        after: &BTreeMap<String, usize>,
        warnings: Vec<ModelError>,
    ) -> Self {
        let counts = after
            .iter()
            .map(|(name, &after)| {
                let before = before.get(name).copied().unwrap_or(0);
                (name.clone(), CountChange { before, after })
            })
            .collect();
        TransformReport {
            operation: operation.into(),
            generated_at: Utc::now(),
            counts,
            warnings,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn to_json(&self) -> ModelResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(&str, usize)]) -> BTreeMap<String, usize> {
        pairs.iter().map(|&(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn test_counts_pair_up() {
        let report = TransformReport::new(
            "mirror",
            &counts(&[("nodes", 4), ("beams", 3)]),
            &counts(&[("nodes", 6), ("beams", 5), ("regions", 1)]),
            Vec::new(),
        );
        assert_eq!(report.counts["nodes"], CountChange { before: 4, after: 6 });
        assert_eq!(report.counts["regions"].added(), 1);
        assert!(!report.has_warnings());
    }

    #[test]
    fn test_json_carries_warnings() {
        let warning = ModelError::geometry_mismatch("Beam", 3, "end node has no image");
        let report = TransformReport::new("replicate", &counts(&[]), &counts(&[("beams", 1)]), vec![warning])
            .with_note("template had no elset table");

        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["operation"], "replicate");
        assert_eq!(value["warnings"][0]["type"], "GeometryMismatch");
        assert_eq!(value["notes"][0], "template had no elset table");

        let back: TransformReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
