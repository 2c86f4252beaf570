//! Model persistence (`persist` feature).
//!
//! Serializes the full handle-addressed tree, the relationship edge list,
//! the per-unit build state, and the derived dependency graph. A restored
//! snapshot is used verbatim by the next classification: no partial or
//! streaming format.

use std::io::{Read, Write};

use thiserror::Error;

use crate::graph::DependencyGraph;
use crate::model::StructuralModel;

use super::config::BuildConfig;
use super::driver::BuildEngine;
use super::state::BuildState;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot format: {0}")]
    Format(#[from] serde_json::Error),
}

/// Everything the engine needs to classify the next edit set after a
/// process restart.
#[derive(serde::Serialize, serde::Deserialize)]
pub struct Snapshot {
    model: StructuralModel,
    graph: DependencyGraph,
    state: BuildState,
}

impl Snapshot {
    /// Capture the engine's current persisted state.
    pub fn of(engine: &BuildEngine) -> Self {
        let (model, graph, state) = engine.to_snapshot_parts();
        Self { model, graph, state }
    }

    /// Rebuild an engine around the snapshot. The configuration is supplied
    /// by the caller (configuration loading is out of scope).
    pub fn restore(self, config: BuildConfig) -> BuildEngine {
        BuildEngine::from_snapshot_parts(config, self.model, self.graph, self.state)
    }

    pub fn write_json<W: Write>(&self, writer: W) -> Result<(), SnapshotError> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    pub fn read_json<R: Read>(reader: R) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_reader(reader)?)
    }
}
