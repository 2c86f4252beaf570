//! The change classifier — decides full versus incremental, and which units
//! an incremental cycle must reanalyze.

use indexmap::IndexSet;
use smol_str::SmolStr;
use tracing::debug;

use crate::base::Handle;
use crate::graph::DependencyGraph;
use crate::model::StructuralModel;

/// The set of units touched since the previous build.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    /// Edited or newly added units.
    pub edited: IndexSet<SmolStr>,
    /// Units removed from the build.
    pub deleted: IndexSet<SmolStr>,
}

impl ChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edit(unit: impl Into<SmolStr>) -> Self {
        Self::new().and_edit(unit)
    }

    pub fn delete(unit: impl Into<SmolStr>) -> Self {
        Self::new().and_delete(unit)
    }

    pub fn and_edit(mut self, unit: impl Into<SmolStr>) -> Self {
        self.edited.insert(unit.into());
        self
    }

    pub fn and_delete(mut self, unit: impl Into<SmolStr>) -> Self {
        self.deleted.insert(unit.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.edited.is_empty() && self.deleted.is_empty()
    }

    fn touches(&self, unit: &str) -> bool {
        self.edited.contains(unit) || self.deleted.contains(unit)
    }
}

/// Why a cycle escalated to a full build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FullBuildReason {
    /// No completed build exists for this configuration.
    FirstBuild,
    /// The configuration options or source roots changed.
    OptionsChanged,
    /// A prior fatal model error forced the model to be discarded.
    ModelDiscarded,
    /// A deleted unit is the target of a cross-file relationship whose
    /// source is not being rebuilt, so the edge cannot be re-derived.
    DeletedRelationshipTarget(SmolStr),
    /// A relationship source could not be mapped back to a unit; the engine
    /// prefers recomputation over propagating stale state.
    UntrackedRelationshipSource(Handle),
}

impl std::fmt::Display for FullBuildReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FullBuildReason::FirstBuild => write!(f, "first build"),
            FullBuildReason::OptionsChanged => write!(f, "configuration changed"),
            FullBuildReason::ModelDiscarded => write!(f, "structural model was discarded"),
            FullBuildReason::DeletedRelationshipTarget(unit) => {
                write!(f, "deleted unit '{unit}' is a relationship target")
            }
            FullBuildReason::UntrackedRelationshipSource(handle) => {
                write!(f, "relationship source '{handle}' has no declaring unit")
            }
        }
    }
}

/// The classifier's output: what the driver reanalyzes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildPlan {
    Full {
        reason: FullBuildReason,
    },
    /// Units to reanalyze, dependencies before dependents.
    Incremental {
        units: Vec<SmolStr>,
    },
}

impl BuildPlan {
    pub fn is_full_build(&self) -> bool {
        matches!(self, BuildPlan::Full { .. })
    }

    pub fn units(&self) -> &[SmolStr] {
        match self {
            BuildPlan::Full { .. } => &[],
            BuildPlan::Incremental { units } => units,
        }
    }
}

/// Classify an edit set against the previous build's dependency graph.
///
/// Decision order: full-build escalations first (first build, option
/// changes, non-re-derivable deletions), then the incremental set — the
/// edited units plus the affected closure of the deletions, topologically
/// ordered. Deterministic: re-running on an unchanged graph and edit set
/// yields the same plan.
///
/// Signature-change propagation for *edited* units is resolved by the
/// driver after reanalysis (see `BuildEngine`), since only the analyzer can
/// tell a body-only edit from a signature change.
pub fn classify(
    changes: &ChangeSet,
    graph: &DependencyGraph,
    model: &StructuralModel,
    first_build: bool,
    options_changed: bool,
) -> BuildPlan {
    if first_build {
        return full(FullBuildReason::FirstBuild);
    }
    if options_changed {
        return full(FullBuildReason::OptionsChanged);
    }

    // A deletion is only incremental when every relationship into the
    // deleted structure comes from a unit that is itself being rebuilt.
    for deleted in &changes.deleted {
        let Some(file) = model.file_handle(deleted) else {
            continue;
        };
        for handle in model.hierarchy().subtree(file) {
            for edge in model.relations().incoming(&handle) {
                match model.unit_of_handle(&edge.source) {
                    None => {
                        return full(FullBuildReason::UntrackedRelationshipSource(
                            edge.source.clone(),
                        ));
                    }
                    Some(source_unit) if !changes.touches(source_unit) => {
                        return full(FullBuildReason::DeletedRelationshipTarget(deleted.clone()));
                    }
                    Some(_) => {}
                }
            }
        }
    }

    let mut units: IndexSet<SmolStr> = changes.edited.clone();
    for unit in graph.affected_closure(&changes.deleted) {
        units.insert(unit);
    }
    units.retain(|u| !changes.deleted.contains(u));
    let ordered = graph.topological(&units);
    debug!("[CLASSIFY] incremental plan: {:?}", ordered);
    BuildPlan::Incremental { units: ordered }
}

fn full(reason: FullBuildReason) -> BuildPlan {
    debug!("[CLASSIFY] full build: {}", reason);
    BuildPlan::Full { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::RelationKind;
    use crate::model::{ElementDecl, RelationDecl};

    fn model_with_advice() -> StructuralModel {
        let mut model = StructuralModel::new("p", false);
        model
            .merge_unit("Code2.java", Some("a"), &[ElementDecl::ty("Code2")], &[])
            .unwrap();
        model
            .merge_unit(
                "Azpect.java",
                Some("a"),
                &[ElementDecl::ty("Azpect").with_child(ElementDecl::advice("before"))],
                &[RelationDecl {
                    source: Handle::parse("=p<a{Azpect.java[Azpect&before").unwrap(),
                    kind: RelationKind::Advises,
                    target: Handle::parse("=p<a{Code2.java[Code2").unwrap(),
                }],
            )
            .unwrap();
        model
    }

    #[test]
    fn test_first_build_is_full() {
        let plan = classify(
            &ChangeSet::new(),
            &DependencyGraph::new(),
            &StructuralModel::new("p", false),
            true,
            false,
        );
        assert_eq!(
            plan,
            BuildPlan::Full {
                reason: FullBuildReason::FirstBuild
            }
        );
    }

    #[test]
    fn test_empty_edit_set_yields_empty_incremental_plan() {
        let plan = classify(
            &ChangeSet::new(),
            &DependencyGraph::new(),
            &StructuralModel::new("p", false),
            false,
            false,
        );
        assert!(!plan.is_full_build());
        assert!(plan.units().is_empty());
    }

    #[test]
    fn test_options_change_is_full() {
        let plan = classify(
            &ChangeSet::new(),
            &DependencyGraph::new(),
            &StructuralModel::new("p", false),
            false,
            true,
        );
        assert_eq!(
            plan,
            BuildPlan::Full {
                reason: FullBuildReason::OptionsChanged
            }
        );
    }

    #[test]
    fn test_deleting_advised_unit_is_full() {
        let model = model_with_advice();
        let plan = classify(
            &ChangeSet::delete("Code2.java"),
            &DependencyGraph::new(),
            &model,
            false,
            false,
        );
        assert_eq!(
            plan,
            BuildPlan::Full {
                reason: FullBuildReason::DeletedRelationshipTarget(SmolStr::new("Code2.java"))
            }
        );
    }

    #[test]
    fn test_untracked_relationship_source_escalates_to_full() {
        let mut model = StructuralModel::new("p", false);
        model
            .merge_unit("Code2.java", Some("a"), &[ElementDecl::ty("Code2")], &[])
            .unwrap();
        // An edge whose source file was never merged as a unit: the engine
        // cannot tell which unit to rebuild, so it recomputes everything.
        model
            .add_relationship(
                Handle::parse("=p<a{Ghost.java[Ghost&before").unwrap(),
                RelationKind::Advises,
                Handle::parse("=p<a{Code2.java[Code2").unwrap(),
            )
            .unwrap();
        let plan = classify(
            &ChangeSet::delete("Code2.java"),
            &DependencyGraph::new(),
            &model,
            false,
            false,
        );
        assert!(matches!(
            plan,
            BuildPlan::Full {
                reason: FullBuildReason::UntrackedRelationshipSource(_)
            }
        ));
    }

    #[test]
    fn test_deleting_advised_unit_with_edited_source_is_incremental() {
        let model = model_with_advice();
        let plan = classify(
            &ChangeSet::delete("Code2.java").and_edit("Azpect.java"),
            &DependencyGraph::new(),
            &model,
            false,
            false,
        );
        assert_eq!(
            plan,
            BuildPlan::Incremental {
                units: vec![SmolStr::new("Azpect.java")]
            }
        );
    }
}
