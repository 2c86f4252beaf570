//! Bidirectional storage for cross-cutting relationship edges.
//!
//! Edges are directed `(source, kind, target)` triples, stored independently
//! of containment: they may cross file and package boundaries and may form
//! cycles (mutual advice is legal). Enables both:
//! - forward traversal: given a source, which elements does it advise?
//! - reverse traversal: given a target, which elements advise it?
//!
//! The reverse direction is a redundant index over the same edges; both maps
//! are updated together on every mutation so either traversal is O(1).

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::base::{Handle, RelationKind};

/// A directed relationship edge between two element handles.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct RelationshipEdge {
    pub source: Handle,
    pub kind: RelationKind,
    pub target: Handle,
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct RelationshipMap {
    /// Forward index: source handle → edges out of it.
    forward: FxHashMap<Handle, Vec<RelationshipEdge>>,
    /// Reverse index: target handle → edges into it.
    reverse: FxHashMap<Handle, Vec<RelationshipEdge>>,
}

impl RelationshipMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edge. Duplicate edges are ignored.
    pub fn add(&mut self, source: Handle, kind: RelationKind, target: Handle) {
        let edge = RelationshipEdge { source, kind, target };
        let out = self.forward.entry(edge.source.clone()).or_default();
        if out.contains(&edge) {
            return;
        }
        trace!(
            "[RELATIONS] add: {} ({}) {}",
            edge.source, edge.kind, edge.target
        );
        out.push(edge.clone());
        self.reverse.entry(edge.target.clone()).or_default().push(edge);
    }

    /// Edges whose source is the given handle.
    pub fn outgoing(&self, source: &Handle) -> &[RelationshipEdge] {
        self.forward.get(source).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Edges whose target is the given handle.
    pub fn incoming(&self, target: &Handle) -> &[RelationshipEdge] {
        self.reverse.get(target).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Targets the source relates to under one kind, in insertion order.
    pub fn targets_of(&self, source: &Handle, kind: RelationKind) -> Vec<&Handle> {
        self.outgoing(source)
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| &e.target)
            .collect()
    }

    /// Sources relating to the target under one kind, in insertion order.
    pub fn sources_of(&self, target: &Handle, kind: RelationKind) -> Vec<&Handle> {
        self.incoming(target)
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| &e.source)
            .collect()
    }

    /// True if any edge names the handle as source or target.
    pub fn has_endpoint(&self, handle: &Handle) -> bool {
        self.forward.contains_key(handle) || self.reverse.contains_key(handle)
    }

    /// Every handle that is an endpoint of some edge.
    pub fn endpoints(&self) -> FxHashSet<&Handle> {
        self.forward.keys().chain(self.reverse.keys()).collect()
    }

    /// All edges, by source insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &RelationshipEdge> {
        self.forward.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.forward.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Remove every edge naming the handle as source or target.
    ///
    /// Called when an element is removed from the hierarchy, keeping the
    /// edge-endpoint invariant: no stored edge may name an absent element.
    pub fn remove_naming(&mut self, handle: &Handle) {
        let mut touched = false;
        if let Some(out) = self.forward.remove(handle) {
            touched = !out.is_empty();
            for edge in out {
                if let Some(rev) = self.reverse.get_mut(&edge.target) {
                    rev.retain(|e| e != &edge);
                }
            }
        }
        if let Some(inc) = self.reverse.remove(handle) {
            touched |= !inc.is_empty();
            for edge in inc {
                if let Some(fwd) = self.forward.get_mut(&edge.source) {
                    fwd.retain(|e| e != &edge);
                }
            }
        }
        if touched {
            trace!("[RELATIONS] removed edges naming {}", handle);
        }
        self.drop_empty();
    }

    /// Remove edges originating from elements inside one file, returning
    /// them. Called before a reanalyzed file's fresh edges are applied.
    pub fn remove_outgoing_from_file(&mut self, file: &Handle) -> Vec<RelationshipEdge> {
        let sources: Vec<Handle> = self
            .forward
            .keys()
            .filter(|h| *h == file || h.is_extension_of(file))
            .cloned()
            .collect();
        let mut removed = Vec::new();
        for source in sources {
            if let Some(out) = self.forward.remove(&source) {
                for edge in out {
                    if let Some(rev) = self.reverse.get_mut(&edge.target) {
                        rev.retain(|e| e != &edge);
                    }
                    removed.push(edge);
                }
            }
        }
        self.drop_empty();
        removed
    }

    /// Detach edges targeting elements inside one file, returning them.
    ///
    /// Merge stashes these before replacing the file's subtree and re-adds
    /// the ones whose target still exists afterwards, so an unedited aspect's
    /// advice survives a rebuild of its target file.
    pub fn detach_incoming_to_file(&mut self, file: &Handle) -> Vec<RelationshipEdge> {
        let targets: Vec<Handle> = self
            .reverse
            .keys()
            .filter(|h| *h == file || h.is_extension_of(file))
            .cloned()
            .collect();
        let mut detached = Vec::new();
        for target in targets {
            if let Some(inc) = self.reverse.remove(&target) {
                for edge in inc {
                    if let Some(fwd) = self.forward.get_mut(&edge.source) {
                        fwd.retain(|e| e != &edge);
                    }
                    detached.push(edge);
                }
            }
        }
        self.drop_empty();
        detached
    }

    fn drop_empty(&mut self) {
        self.forward.retain(|_, v| !v.is_empty());
        self.reverse.retain(|_, v| !v.is_empty());
    }
}
