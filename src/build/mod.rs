//! # Build Driver & Change Classifier
//!
//! One build cycle: an edit set is classified against the previous cycle's
//! dependency graph, the affected units are reanalyzed by the external
//! analyzer, results are merged into the structural model, and the graph is
//! re-derived for the next cycle.

pub mod analyzer;
pub mod classifier;
pub mod config;
pub mod driver;
pub mod state;

#[cfg(feature = "persist")]
pub mod snapshot;

pub use analyzer::{AnalysisFailure, AnalyzedFile, FileAnalyzer};
pub use classifier::{BuildPlan, ChangeSet, FullBuildReason, classify};
pub use config::{BuildConfig, SourceRoot};
pub use driver::{BuildEngine, BuildError, BuildPhase};
pub use state::{BuildReport, BuildState};

#[cfg(feature = "persist")]
pub use snapshot::{Snapshot, SnapshotError};
