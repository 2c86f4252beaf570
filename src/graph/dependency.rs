//! Unit-level dependency tracking and the affected-closure fixpoint.

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::trace;

use crate::model::StructuralModel;

/// Maps each compilation unit to the units whose structural signature, if
/// changed, could change the unit's analysis result.
///
/// Forward edges point from a unit to its dependencies; the reverse index is
/// kept alongside so the affected-closure walk is O(edges). Both indices are
/// insertion-ordered for deterministic iteration.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct DependencyGraph {
    /// unit → units it structurally depends on.
    forward: IndexMap<SmolStr, IndexSet<SmolStr>>,
    /// unit → units that depend on it.
    reverse: IndexMap<SmolStr, IndexSet<SmolStr>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive the graph from the model and each unit's recorded structural
    /// references (qualified type names).
    ///
    /// A reference that resolves to no declaring unit is an external type
    /// and contributes no edge.
    pub fn rebuild<'a>(
        model: &StructuralModel,
        references: impl Iterator<Item = (&'a SmolStr, &'a [SmolStr])>,
    ) -> Self {
        let mut graph = Self::new();
        for (unit, refs) in references {
            graph.forward.entry(unit.clone()).or_default();
            for qname in refs {
                match model.unit_declaring_type(qname) {
                    Some(declaring) if declaring != unit => {
                        graph.add_edge(unit.clone(), declaring.clone());
                    }
                    _ => {}
                }
            }
        }
        trace!("[DEPS] rebuilt: {} units", graph.forward.len());
        graph
    }

    fn add_edge(&mut self, from: SmolStr, to: SmolStr) {
        self.forward.entry(from.clone()).or_default().insert(to.clone());
        self.reverse.entry(to).or_default().insert(from);
    }

    /// The units `unit` structurally depends on.
    pub fn dependencies_of(&self, unit: &str) -> impl Iterator<Item = &SmolStr> {
        self.forward.get(unit).into_iter().flatten()
    }

    /// The units that structurally depend on `unit`.
    pub fn dependents_of(&self, unit: &str) -> impl Iterator<Item = &SmolStr> {
        self.reverse.get(unit).into_iter().flatten()
    }

    /// The affected closure of a seed set: the fixpoint of repeatedly adding
    /// every unit that depends on a unit already in the set.
    ///
    /// Implemented with an explicit worklist to bound stack use on large
    /// graphs. Deterministic (insertion-ordered) and monotonic in the seed
    /// set; the seeds themselves are included.
    pub fn affected_closure(&self, seeds: &IndexSet<SmolStr>) -> IndexSet<SmolStr> {
        let mut closure: IndexSet<SmolStr> = seeds.iter().cloned().collect();
        let mut worklist: Vec<SmolStr> = seeds.iter().cloned().collect();
        while let Some(unit) = worklist.pop() {
            for dependent in self.dependents_of(&unit) {
                if closure.insert(dependent.clone()) {
                    worklist.push(dependent.clone());
                }
            }
        }
        trace!("[DEPS] closure of {:?}: {:?}", seeds, closure);
        closure
    }

    /// The units of `pending` with no dependency on another pending unit —
    /// the set that can be analyzed next without observing stale structure.
    /// Empty only when every pending unit sits on a dependency cycle.
    pub fn ready_layer(&self, pending: &IndexSet<SmolStr>) -> Vec<SmolStr> {
        pending
            .iter()
            .filter(|unit| {
                !self
                    .dependencies_of(unit)
                    .any(|dep| dep != *unit && pending.contains(dep.as_str()))
            })
            .cloned()
            .collect()
    }

    /// Order a plan's units so dependencies come before dependents where the
    /// graph can tell, falling back to the given order on ties and cycles.
    pub fn topological(&self, units: &IndexSet<SmolStr>) -> Vec<SmolStr> {
        // Kahn's algorithm restricted to the plan set, taking units in
        // plan order whenever several are ready.
        let mut indegree: FxHashMap<&SmolStr, usize> = FxHashMap::default();
        for unit in units {
            let n = self
                .dependencies_of(unit)
                .filter(|dep| units.contains(dep.as_str()))
                .count();
            indegree.insert(unit, n);
        }
        let mut out: Vec<SmolStr> = Vec::with_capacity(units.len());
        let mut done: IndexSet<&SmolStr> = IndexSet::new();
        while out.len() < units.len() {
            let next = units
                .iter()
                .find(|u| !done.contains(*u) && indegree.get(*u).copied().unwrap_or(0) == 0)
                // A dependency cycle: fall back to plan order.
                .or_else(|| units.iter().find(|u| !done.contains(*u)));
            let Some(unit) = next else { break };
            done.insert(unit);
            out.push(unit.clone());
            for dependent in self.dependents_of(unit) {
                if let Some(n) = indegree.get_mut(dependent) {
                    *n = n.saturating_sub(1);
                }
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}
