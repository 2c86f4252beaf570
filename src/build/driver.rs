//! The build driver — orchestrates one build cycle.
//!
//! A cycle is a small state machine, re-entrant per build:
//!
//! ```text
//! IDLE → PLANNING → REANALYZING → MERGING → DONE
//!            ↑            └──────────┘ (one pass per wave)
//! ```
//!
//! REANALYZING hands each planned unit to the external analyzer; units of
//! one wave are independent until merge, so they are analyzed in parallel.
//! MERGING applies results serially in plan order: each unit's subtree
//! replacement happens under the model's write lock, so a concurrent reader
//! never observes a half-merged file. Units whose public signature changed
//! seed the next wave through the previous cycle's dependency graph, until
//! the plan reaches a fixpoint.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use indexmap::IndexSet;
use parking_lot::RwLock;
use rayon::prelude::*;
use smol_str::SmolStr;
use thiserror::Error;
use tracing::{debug, error, trace};

use crate::base::{Diagnostic, Handle, ModelError, codes};
use crate::graph::DependencyGraph;
use crate::model::{ProgramElement, StructuralModel};

use super::analyzer::{AnalysisFailure, AnalyzedFile, FileAnalyzer};
use super::classifier::{BuildPlan, ChangeSet, FullBuildReason, classify};
use super::config::BuildConfig;
use super::state::{BuildReport, BuildState};

/// Errors that abort a build cycle.
///
/// A cycle that returns one of these leaves the engine poisoned: the model
/// may be inconsistent, so the next cycle discards it and rebuilds from
/// scratch.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// The driver's position in the cycle state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Idle,
    Planning,
    Reanalyzing,
    Merging,
    Done,
}

/// The incremental build engine for one build configuration.
///
/// Owns the structural model, the per-unit build state, and the dependency
/// graph of the last completed cycle. One engine supports one build at a
/// time (`build` takes `&mut self`); read-only queries go through the
/// model's read lock and may run concurrently with each other and with the
/// reanalysis phase, but never with a merge.
pub struct BuildEngine {
    config: BuildConfig,
    model: Arc<RwLock<StructuralModel>>,
    graph: DependencyGraph,
    state: BuildState,
    report: BuildReport,
    phase: BuildPhase,
    poisoned: AtomicBool,
}

impl BuildEngine {
    pub fn new(config: BuildConfig) -> Self {
        let model = StructuralModel::new(config.name(), config.minimal_model());
        Self {
            config,
            model: Arc::new(RwLock::new(model)),
            graph: DependencyGraph::new(),
            state: BuildState::new(),
            report: BuildReport::default(),
            phase: BuildPhase::Idle,
            poisoned: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Mutate the configuration between builds (add/remove units, toggle
    /// options). Option changes force the next build to be full.
    pub fn config_mut(&mut self) -> &mut BuildConfig {
        &mut self.config
    }

    /// Run one build cycle. Wholly synchronous; returns the cycle's report.
    pub fn build<A: FileAnalyzer>(
        &mut self,
        analyzer: &A,
        changes: &ChangeSet,
    ) -> Result<&BuildReport, BuildError> {
        match self.run_cycle(analyzer, changes) {
            Ok(report) => {
                self.report = report;
                self.enter(BuildPhase::Idle);
                Ok(&self.report)
            }
            Err(err) => {
                error!("[DRIVER] cycle aborted: {err}");
                self.poisoned.store(true, Ordering::SeqCst);
                self.enter(BuildPhase::Idle);
                Err(err)
            }
        }
    }

    fn run_cycle<A: FileAnalyzer>(
        &mut self,
        analyzer: &A,
        changes: &ChangeSet,
    ) -> Result<BuildReport, BuildError> {
        self.enter(BuildPhase::Planning);
        let plan = if self.poisoned.swap(false, Ordering::SeqCst) {
            BuildPlan::Full {
                reason: FullBuildReason::ModelDiscarded,
            }
        } else {
            let model = self.model.read();
            classify(
                changes,
                &self.graph,
                &model,
                self.state.is_first_build(),
                self.state.options_changed(self.config.options_fingerprint()),
            )
        };

        let full = plan.is_full_build();
        let mut pending: IndexSet<SmolStr> = if full {
            // The old model has no successor state worth keeping; every
            // unit is reanalyzed into a fresh one.
            *self.model.write() =
                StructuralModel::new(self.config.name(), self.config.minimal_model());
            self.state = BuildState::new();
            self.config.units().cloned().collect()
        } else {
            {
                let mut model = self.model.write();
                for deleted in &changes.deleted {
                    model.remove_unit(deleted);
                }
            }
            for deleted in &changes.deleted {
                self.state.remove(deleted);
            }
            plan.units().iter().cloned().collect()
        };

        let mut analyzed: IndexSet<SmolStr> = IndexSet::new();
        let mut signature_changed: IndexSet<SmolStr> = IndexSet::new();
        let mut diagnostics: Vec<Diagnostic> = Vec::new();

        while !pending.is_empty() {
            // Dependencies first: only units with no pending dependency are
            // analyzed in one wave, so a dependent's diagnostics are always
            // computed against its dependencies' merged structure. A pure
            // dependency cycle is analyzed as one wave on a shared snapshot.
            let mut wave = self.graph.ready_layer(&pending);
            if wave.is_empty() {
                wave = self.graph.topological(&pending);
            }
            for unit in &wave {
                pending.shift_remove(unit);
            }
            trace!("[DRIVER] wave: {:?}", wave);

            self.enter(BuildPhase::Reanalyzing);
            let model = Arc::clone(&self.model);
            let results: Vec<(SmolStr, Result<AnalyzedFile, AnalysisFailure>)> = wave
                .par_iter()
                .map(|unit| {
                    let snapshot = model.read();
                    (unit.clone(), analyzer.analyze(unit, &snapshot))
                })
                .collect();

            self.enter(BuildPhase::Merging);
            for (unit, result) in results {
                match result {
                    Ok(analysis) => {
                        {
                            let mut model = self.model.write();
                            model.merge_unit(
                                &unit,
                                analysis.package.as_deref(),
                                &analysis.elements,
                                &analysis.relationships,
                            )?;
                        }
                        if self
                            .state
                            .record(&unit, analysis.signature, analysis.references)
                        {
                            trace!("[DRIVER] signature changed: {}", unit);
                            signature_changed.insert(unit.clone());
                        }
                        diagnostics.extend(analysis.diagnostics);
                    }
                    Err(failure) => {
                        // The unit keeps its stale structure; everything
                        // else in the plan still reanalyzes against it.
                        debug!("[DRIVER] analysis failed for {}: {}", unit, failure);
                        diagnostics.push(
                            Diagnostic::error(
                                unit.clone(),
                                failure.line,
                                failure.column,
                                failure.message.clone(),
                            )
                            .with_code(codes::ANALYSIS_FAILED),
                        );
                    }
                }
                analyzed.insert(unit);
            }

            // Widen the plan through the previous graph: anything depending
            // on a unit whose public signature changed is affected too.
            for unit in self.graph.affected_closure(&signature_changed) {
                if !analyzed.contains(&unit)
                    && !changes.deleted.contains(&unit)
                    && self.config.contains_unit(&unit)
                {
                    pending.insert(unit);
                }
            }
        }

        // Derived data for the next cycle's classification.
        {
            let model = self.model.read();
            self.graph = DependencyGraph::rebuild(&model, self.state.references());
        }
        self.state.mark_built(self.config.options_fingerprint());

        self.enter(BuildPhase::Done);
        let compiled: Vec<SmolStr> = analyzed.into_iter().collect();
        let woven: Vec<SmolStr> = {
            let model = self.model.read();
            compiled
                .iter()
                .filter(|unit| model.unit_is_woven(unit))
                .cloned()
                .collect()
        };
        debug!(
            "[DRIVER] cycle done: full={} compiled={} woven={} diagnostics={}",
            full,
            compiled.len(),
            woven.len(),
            diagnostics.len()
        );
        Ok(BuildReport::new(full, compiled, woven, diagnostics))
    }

    fn enter(&mut self, phase: BuildPhase) {
        trace!("[DRIVER] → {:?}", phase);
        self.phase = phase;
    }

    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    // ========================================================================
    // QUERY SURFACE
    // ========================================================================

    /// The last cycle's report.
    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    pub fn was_full_build(&self) -> bool {
        self.report.was_full_build()
    }

    pub fn compile_count(&self) -> usize {
        self.report.compile_count()
    }

    pub fn weave_count(&self) -> usize {
        self.report.weave_count()
    }

    /// Rendered error diagnostics of the last cycle, file/position ordered.
    pub fn error_messages(&self) -> Vec<String> {
        self.report.error_messages()
    }

    /// Resolve a handle to its element, optionally creating placeholder
    /// elements along the path.
    ///
    /// A creation that violates the handle-reuse invariant poisons the
    /// engine (the next build discards the model) and resolves to `None`.
    pub fn find_element_for_handle(
        &self,
        handle: &Handle,
        create_if_absent: bool,
    ) -> Option<ProgramElement> {
        if create_if_absent {
            let mut model = self.model.write();
            match model.find_or_create(handle) {
                Ok(element) => Some(element.clone()),
                Err(err) => {
                    error!("[MODEL] {err}");
                    self.poisoned.store(true, Ordering::SeqCst);
                    None
                }
            }
        } else {
            self.model.read().find_element(handle).cloned()
        }
    }

    /// Shared read access to the structural model. Callers must not hold a
    /// guard across a call to [`BuildEngine::build`].
    pub fn model(&self) -> Arc<RwLock<StructuralModel>> {
        Arc::clone(&self.model)
    }

    /// Render the model dump (tree plus relationship list).
    pub fn dump_model(&self) -> String {
        self.model.read().dump()
    }

    #[cfg(feature = "persist")]
    pub(super) fn to_snapshot_parts(&self) -> (StructuralModel, DependencyGraph, BuildState) {
        (
            self.model.read().clone(),
            self.graph.clone(),
            self.state.clone(),
        )
    }

    #[cfg(feature = "persist")]
    pub(super) fn from_snapshot_parts(
        config: BuildConfig,
        model: StructuralModel,
        graph: DependencyGraph,
        state: BuildState,
    ) -> Self {
        Self {
            config,
            model: Arc::new(RwLock::new(model)),
            graph,
            state,
            report: BuildReport::default(),
            phase: BuildPhase::Idle,
            poisoned: AtomicBool::new(false),
        }
    }
}
