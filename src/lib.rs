//! # weft-base
//!
//! Core library for the Weft toolchain: structural program model, dependency
//! graph, and incremental change-impact engine.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! build   → build driver, change classifier, analyzer contract
//!   ↓
//! graph   → dependency graph derived from the structural model
//!   ↓
//! model   → element hierarchy, relationship map, pruning
//!   ↓
//! base    → primitives (Handle, ElementKind, RelationKind, Diagnostic)
//! ```
//!
//! A build cycle flows in the opposite direction: an edit set is classified
//! against the dependency graph of the *previous* cycle, the affected units
//! are handed to the external analyzer, and the results are merged back into
//! the structural model, from which the graph for the next cycle is derived.

// ============================================================================
// MODULES (dependency order: base → model → graph → build)
// ============================================================================

/// Foundation types: Handle, ElementKind, RelationKind, Diagnostic
pub mod base;

/// Structural model: element hierarchy, relationship map, minimal-model pruning
pub mod model;

/// Dependency graph between compilation units, derived from the model
pub mod graph;

/// Build driver, change classifier, and the external analyzer contract
pub mod build;

// Re-export foundation types
pub use base::{Diagnostic, ElementKind, Handle, ModelError, RelationKind, Severity};

// Re-export the primary entry points
pub use build::{BuildConfig, BuildEngine, BuildPlan, BuildReport, ChangeSet, FileAnalyzer};
pub use model::{ProgramElement, StructuralModel};
