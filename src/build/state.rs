//! Per-unit build records and the published per-cycle report.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::base::{Diagnostic, Severity};

/// What the engine remembers about one analyzed unit between cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub(crate) struct UnitRecord {
    /// Public-signature fingerprint from the last successful analysis.
    pub signature: u64,
    /// Resolved structural references (qualified type names).
    pub references: Vec<SmolStr>,
}

/// Build-to-build bookkeeping: signatures and references per unit, plus the
/// options fingerprint of the last completed build.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct BuildState {
    records: FxHashMap<SmolStr, UnitRecord>,
    built_once: bool,
    options_fingerprint: u64,
}

impl BuildState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True before the first completed build of this configuration.
    pub fn is_first_build(&self) -> bool {
        !self.built_once
    }

    pub fn options_changed(&self, fingerprint: u64) -> bool {
        self.built_once && self.options_fingerprint != fingerprint
    }

    pub fn mark_built(&mut self, fingerprint: u64) {
        self.built_once = true;
        self.options_fingerprint = fingerprint;
    }

    /// Store a unit's fresh analysis record. Returns true if the unit's
    /// public signature changed (or the unit had no prior record) — the
    /// signal that the edit must propagate to dependents.
    pub(crate) fn record(&mut self, unit: &str, signature: u64, references: Vec<SmolStr>) -> bool {
        let changed = self
            .records
            .get(unit)
            .is_none_or(|prev| prev.signature != signature);
        self.records.insert(
            SmolStr::new(unit),
            UnitRecord {
                signature,
                references,
            },
        );
        changed
    }

    pub(crate) fn remove(&mut self, unit: &str) {
        self.records.remove(unit);
    }

    /// Per-unit reference lists, for deriving the dependency graph.
    pub(crate) fn references(&self) -> impl Iterator<Item = (&SmolStr, &[SmolStr])> {
        self.records
            .iter()
            .map(|(unit, record)| (unit, record.references.as_slice()))
    }
}

/// The aggregate result of one build cycle.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    full_build: bool,
    compiled: Vec<SmolStr>,
    woven: Vec<SmolStr>,
    diagnostics: Vec<Diagnostic>,
}

impl BuildReport {
    pub(crate) fn new(
        full_build: bool,
        compiled: Vec<SmolStr>,
        woven: Vec<SmolStr>,
        mut diagnostics: Vec<Diagnostic>,
    ) -> Self {
        diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Self {
            full_build,
            compiled,
            woven,
            diagnostics,
        }
    }

    pub fn was_full_build(&self) -> bool {
        self.full_build
    }

    /// Units reanalyzed this cycle, in plan order.
    pub fn compiled(&self) -> &[SmolStr] {
        &self.compiled
    }

    pub fn compile_count(&self) -> usize {
        self.compiled.len()
    }

    /// Units whose final artifact required applying at least one
    /// relationship this cycle.
    pub fn woven(&self) -> &[SmolStr] {
        &self.woven
    }

    pub fn weave_count(&self) -> usize {
        self.woven.len()
    }

    /// The cycle's diagnostics, in file-then-position order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Rendered error diagnostics, in file-then-position order.
    pub fn error_messages(&self) -> Vec<String> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(Diagnostic::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_reports_signature_change() {
        let mut state = BuildState::new();
        assert!(state.record("A.java", 1, vec![]));
        assert!(!state.record("A.java", 1, vec![]));
        assert!(state.record("A.java", 2, vec![]));
    }

    #[test]
    fn test_error_messages_sorted_and_filtered() {
        let report = BuildReport::new(
            false,
            vec![],
            vec![],
            vec![
                Diagnostic::error("B.java", 4, 0, "late"),
                Diagnostic::warning("A.java", 0, 0, "not an error"),
                Diagnostic::error("A.java", 2, 1, "early"),
            ],
        );
        assert_eq!(
            report.error_messages(),
            vec!["A.java:2:1::0 early", "B.java:4:0::0 late"]
        );
    }
}
