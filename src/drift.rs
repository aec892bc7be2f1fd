//! Drift analysis between referenced and declared variable sets.
//!
//! Pure set algebra: the same two inputs always produce the same two
//! outputs. `missing` (referenced but undeclared) is a hard finding;
//! `unused` (declared but unreferenced) is informational.

use serde::Serialize;
use std::collections::BTreeSet;

/// The two drift sets for one run. Computed fresh each time, never
/// persisted.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DriftReport {
    pub missing: BTreeSet<String>,
    pub unused: BTreeSet<String>,
}

impl DriftReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.unused.is_empty()
    }
}

/// Compute `missing = referenced − declared` and
/// `unused = declared − referenced`.
pub fn analyze(referenced: &BTreeSet<String>, declared: &BTreeSet<String>) -> DriftReport {
    DriftReport {
        missing: referenced.difference(declared).cloned().collect(),
        unused: declared.difference(referenced).cloned().collect(),
    }
}
