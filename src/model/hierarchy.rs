//! The element hierarchy — a strict forest rooted at one configuration node.
//!
//! Elements live in a single arena map keyed by handle; containment is the
//! child-handle lists on each element. The tree cannot form cycles because
//! every handle is a strict extension of its parent's handle.

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::base::{ElementKind, Handle, ModelError};

use super::element::ProgramElement;

#[derive(Debug, Clone)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct ElementHierarchy {
    root: Handle,
    elements: FxHashMap<Handle, ProgramElement>,
}

impl ElementHierarchy {
    /// Create a hierarchy holding only the configuration root.
    pub fn new(config_name: &str) -> Self {
        let root = Handle::configuration(config_name);
        let mut elements = FxHashMap::default();
        elements.insert(
            root.clone(),
            ProgramElement::new(ElementKind::Configuration, config_name, root.clone()),
        );
        Self { root, elements }
    }

    pub fn root(&self) -> &Handle {
        &self.root
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Exact lookup. Absent handles resolve to `None`.
    pub fn find(&self, handle: &Handle) -> Option<&ProgramElement> {
        self.elements.get(handle)
    }

    pub fn contains(&self, handle: &Handle) -> bool {
        self.elements.contains_key(handle)
    }

    pub(crate) fn find_mut(&mut self, handle: &Handle) -> Option<&mut ProgramElement> {
        self.elements.get_mut(handle)
    }

    /// Look an element up, creating placeholder elements along the handle's
    /// containment path for every level that does not exist yet.
    ///
    /// Placeholders take the kind implied by the handle separator; a later
    /// merge of the owning file replaces them with analyzer-declared
    /// elements. Finding an existing element whose kind contradicts the
    /// handle is a fatal [`ModelError::HandleReuse`] — handles are never
    /// reused for a different element.
    pub fn find_or_create(&mut self, handle: &Handle) -> Result<&ProgramElement, ModelError> {
        let segments = handle.segments();
        let mut path = Handle::configuration(segments[0].name);
        if path != self.root {
            return Err(ModelError::HandleReuse {
                handle: handle.clone(),
                existing: ElementKind::Configuration,
                requested: segments[0].kind,
            });
        }
        for segment in &segments[1..] {
            let child = match segment.kind {
                ElementKind::Package => path.package(segment.name),
                ElementKind::File => path.file(segment.name),
                ElementKind::Type => path.nested_type(segment.name),
                ElementKind::Method | ElementKind::Constructor => path.method(segment.name),
                ElementKind::Field => path.field(segment.name),
                ElementKind::Advice => path.advice(segment.name),
                ElementKind::ImportReference => path.import_reference(segment.name),
                ElementKind::Configuration => unreachable!("root is always the first segment"),
            };
            match self.elements.get(&child) {
                Some(existing) if !kinds_compatible(existing.kind(), segment.kind) => {
                    return Err(ModelError::HandleReuse {
                        handle: child.clone(),
                        existing: existing.kind(),
                        requested: segment.kind,
                    });
                }
                Some(_) => {}
                None => {
                    trace!("[MODEL] placeholder {} [{}]", child, segment.kind);
                    self.insert_element(ProgramElement::new(
                        segment.kind,
                        segment.name,
                        child.clone(),
                    ));
                }
            }
            path = child;
        }
        Ok(&self.elements[&path])
    }

    /// Insert a fully-formed element, attaching it to its parent's children.
    ///
    /// The parent must already exist; merge inserts top-down.
    pub(crate) fn insert_element(&mut self, element: ProgramElement) {
        let handle = element.handle().clone();
        if let Some(parent) = handle.parent() {
            if let Some(parent_el) = self.elements.get_mut(&parent) {
                parent_el.push_child(handle.clone());
            }
        }
        self.elements.insert(handle, element);
    }

    /// Remove an element and its whole subtree, detaching it from its
    /// parent. Returns the removed handles (subtree preorder). Removing an
    /// absent handle is a no-op.
    pub fn remove(&mut self, handle: &Handle) -> Vec<Handle> {
        if !self.elements.contains_key(handle) {
            return Vec::new();
        }
        if let Some(parent) = handle.parent() {
            if let Some(parent_el) = self.elements.get_mut(&parent) {
                parent_el.remove_child(handle);
            }
        }
        let doomed = self.subtree(handle);
        for h in &doomed {
            self.elements.remove(h);
        }
        doomed
    }

    /// Remove all children of an element, keeping the element itself.
    /// Returns the removed handles.
    pub(crate) fn remove_children(&mut self, handle: &Handle) -> Vec<Handle> {
        let children = match self.elements.get_mut(handle) {
            Some(el) => el.clear_children(),
            None => return Vec::new(),
        };
        let mut doomed = Vec::new();
        for child in children {
            doomed.extend(self.subtree(&child));
        }
        for h in &doomed {
            self.elements.remove(h);
        }
        doomed
    }

    /// Handles of an element's subtree in preorder (declaration order),
    /// including the element itself.
    pub fn subtree(&self, handle: &Handle) -> Vec<Handle> {
        let mut out = Vec::new();
        let mut stack = vec![handle.clone()];
        while let Some(h) = stack.pop() {
            if let Some(el) = self.elements.get(&h) {
                // Push children reversed so preorder pops left-to-right.
                for child in el.children().iter().rev() {
                    stack.push(child.clone());
                }
                out.push(h);
            }
        }
        out
    }

    /// The elements of one file's subtree in preorder.
    pub fn elements_in_file(&self, file: &Handle) -> Vec<&ProgramElement> {
        self.subtree(file)
            .iter()
            .filter_map(|h| self.elements.get(h))
            .collect()
    }
}

/// `~` infers Method, but the element may be a constructor.
fn kinds_compatible(existing: ElementKind, inferred: ElementKind) -> bool {
    existing == inferred
        || (inferred == ElementKind::Method && existing == ElementKind::Constructor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(text: &str) -> Handle {
        Handle::parse(text).unwrap()
    }

    #[test]
    fn test_find_or_create_builds_path() {
        let mut tree = ElementHierarchy::new("p");
        tree.find_or_create(&h("=p<a.b.c{Code.java[Code~m")).unwrap();
        assert!(tree.contains(&h("=p<a.b.c")));
        assert!(tree.contains(&h("=p<a.b.c{Code.java")));
        assert!(tree.contains(&h("=p<a.b.c{Code.java[Code")));
        let file = tree.find(&h("=p<a.b.c{Code.java")).unwrap();
        assert_eq!(file.kind(), ElementKind::File);
        assert_eq!(file.children(), &[h("=p<a.b.c{Code.java[Code")]);
    }

    #[test]
    fn test_find_or_create_is_idempotent() {
        let mut tree = ElementHierarchy::new("p");
        tree.find_or_create(&h("=p<a{F.java[T")).unwrap();
        let before = tree.len();
        tree.find_or_create(&h("=p<a{F.java[T")).unwrap();
        assert_eq!(tree.len(), before);
    }

    #[test]
    fn test_handle_reuse_is_fatal() {
        let mut tree = ElementHierarchy::new("p");
        tree.insert_element(ProgramElement::new(
            ElementKind::Advice,
            "T",
            h("=p<a{F.java[T"),
        ));
        // The path walk reaches the same handle expecting a type.
        let err = tree.find_or_create(&h("=p<a{F.java[T~m")).unwrap_err();
        assert!(matches!(err, ModelError::HandleReuse { .. }));
    }

    #[test]
    fn test_remove_subtree_detaches_parent() {
        let mut tree = ElementHierarchy::new("p");
        tree.find_or_create(&h("=p<a{F.java[T~m")).unwrap();
        tree.find_or_create(&h("=p<a{F.java[T^f")).unwrap();
        let removed = tree.remove(&h("=p<a{F.java[T"));
        assert_eq!(removed.len(), 3);
        assert!(!tree.contains(&h("=p<a{F.java[T~m")));
        assert!(tree.find(&h("=p<a{F.java")).unwrap().children().is_empty());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut tree = ElementHierarchy::new("p");
        assert!(tree.remove(&h("=p<a{F.java")).is_empty());
    }

    #[test]
    fn test_preorder_follows_declaration_order() {
        let mut tree = ElementHierarchy::new("p");
        tree.find_or_create(&h("=p<a{F.java[T~m1")).unwrap();
        tree.find_or_create(&h("=p<a{F.java[T~m2")).unwrap();
        tree.find_or_create(&h("=p<a{F.java[U")).unwrap();
        let names: Vec<&str> = tree
            .elements_in_file(&h("=p<a{F.java"))
            .iter()
            .map(|e| e.name())
            .collect();
        assert_eq!(names, vec!["F.java", "T", "m1", "m2", "U"]);
    }
}
