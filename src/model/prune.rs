//! Minimal-model pruning.
//!
//! After a file is (re)analyzed, the subtrees of import references and
//! members that participate in no relationship are pure noise: dropping them
//! keeps the model's size proportional to cross-cutting complexity rather
//! than raw source size. Pruning is a bottom-up reachability pass over the
//! freshly rebuilt file subtree:
//!
//! - an element is retained if it is the source or target of a relationship
//!   edge, or if any descendant is;
//! - everything else under the file node is removed;
//! - a file with no relationship-bearing structure keeps its File node as a
//!   placeholder, so the driver can still see that the file was analyzed.

use tracing::trace;

use crate::base::Handle;

use super::hierarchy::ElementHierarchy;
use super::relations::RelationshipMap;

/// Prune a rebuilt file's subtree. Returns the removed handles.
pub(crate) fn prune_file_subtree(
    hierarchy: &mut ElementHierarchy,
    relations: &RelationshipMap,
    file: &Handle,
) -> Vec<Handle> {
    let mut doomed = Vec::new();
    let children: Vec<Handle> = hierarchy
        .find(file)
        .map(|el| el.children().to_vec())
        .unwrap_or_default();
    for child in children {
        sweep(hierarchy, relations, &child, &mut doomed);
    }
    for handle in &doomed {
        // Topmost unkept nodes only; descendants of a doomed node are
        // removed with it.
        hierarchy.remove(handle);
    }
    if !doomed.is_empty() {
        trace!("[PRUNE] {}: removed {} elements", file, doomed.len());
    }
    doomed
}

/// Post-order sweep. Returns true if the element is retained.
fn sweep(
    hierarchy: &ElementHierarchy,
    relations: &RelationshipMap,
    handle: &Handle,
    doomed: &mut Vec<Handle>,
) -> bool {
    let children: Vec<Handle> = hierarchy
        .find(handle)
        .map(|el| el.children().to_vec())
        .unwrap_or_default();
    let mut kept_child = false;
    let mut child_doomed = Vec::new();
    for child in &children {
        kept_child |= sweep(hierarchy, relations, child, &mut child_doomed);
    }
    if relations.has_endpoint(handle) || kept_child {
        // Keep this node; only its unkept children go.
        doomed.extend(child_doomed);
        true
    } else {
        // The whole subtree is unreachable from any edge.
        doomed.push(handle.clone());
        false
    }
}
