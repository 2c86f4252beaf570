//! # Structural Model
//!
//! The structural model for one build configuration: a hierarchy of program
//! elements addressed by stable handles, plus a separate graph of
//! cross-cutting relationships between element handles. The model is the
//! engine's cache — it carries no independent identity beyond the handles,
//! and a file's subtree is replaced wholesale when the file is reanalyzed.

mod element;
mod hierarchy;
mod prune;
mod relations;

pub use element::ProgramElement;
pub use hierarchy::ElementHierarchy;
pub use relations::{RelationshipEdge, RelationshipMap};

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::{debug, trace};

use crate::base::{ElementKind, Handle, ModelError, RelationKind};

/// A structural delta for one declaration, produced by the external
/// analyzer and merged into the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDecl {
    pub kind: ElementKind,
    pub name: SmolStr,
    pub line: Option<u32>,
    pub children: Vec<ElementDecl>,
}

impl ElementDecl {
    pub fn new(kind: ElementKind, name: impl Into<SmolStr>) -> Self {
        Self {
            kind,
            name: name.into(),
            line: None,
            children: Vec::new(),
        }
    }

    pub fn ty(name: impl Into<SmolStr>) -> Self {
        Self::new(ElementKind::Type, name)
    }

    pub fn method(name: impl Into<SmolStr>) -> Self {
        Self::new(ElementKind::Method, name)
    }

    pub fn constructor(name: impl Into<SmolStr>) -> Self {
        Self::new(ElementKind::Constructor, name)
    }

    pub fn field(name: impl Into<SmolStr>) -> Self {
        Self::new(ElementKind::Field, name)
    }

    pub fn advice(name: impl Into<SmolStr>) -> Self {
        Self::new(ElementKind::Advice, name)
    }

    pub fn import(name: impl Into<SmolStr>) -> Self {
        Self::new(ElementKind::ImportReference, name)
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_child(mut self, child: ElementDecl) -> Self {
        self.children.push(child);
        self
    }
}

/// A relationship edge declared by the analyzer, endpoints as full handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDecl {
    pub source: Handle,
    pub kind: RelationKind,
    pub target: Handle,
}

/// The structural model for one build configuration.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct StructuralModel {
    hierarchy: ElementHierarchy,
    relations: RelationshipMap,
    /// Compilation unit name → its file handle (set on first merge).
    files: FxHashMap<SmolStr, Handle>,
    units_by_file: FxHashMap<Handle, SmolStr>,
    /// Qualified type name → declaring unit. Survives pruning: recorded from
    /// the merged subtree before the minimal-model pass runs, so dependency
    /// mapping still works when the declaring elements were pruned away.
    declared_types: FxHashMap<SmolStr, SmolStr>,
    types_by_unit: FxHashMap<SmolStr, Vec<SmolStr>>,
    minimal: bool,
}

impl StructuralModel {
    pub fn new(config_name: &str, minimal: bool) -> Self {
        Self {
            hierarchy: ElementHierarchy::new(config_name),
            relations: RelationshipMap::new(),
            files: FxHashMap::default(),
            units_by_file: FxHashMap::default(),
            declared_types: FxHashMap::default(),
            types_by_unit: FxHashMap::default(),
            minimal,
        }
    }

    pub fn root(&self) -> &Handle {
        self.hierarchy.root()
    }

    pub fn hierarchy(&self) -> &ElementHierarchy {
        &self.hierarchy
    }

    pub fn relations(&self) -> &RelationshipMap {
        &self.relations
    }

    pub fn minimal(&self) -> bool {
        self.minimal
    }

    /// Exact lookup by handle.
    pub fn find_element(&self, handle: &Handle) -> Option<&ProgramElement> {
        self.hierarchy.find(handle)
    }

    /// Lookup-or-create by handle (placeholders along the path).
    pub fn find_or_create(&mut self, handle: &Handle) -> Result<&ProgramElement, ModelError> {
        self.hierarchy.find_or_create(handle)
    }

    /// Remove an element subtree and every edge naming a removed element.
    /// A no-op for absent handles.
    pub fn remove(&mut self, handle: &Handle) {
        for removed in self.hierarchy.remove(handle) {
            self.relations.remove_naming(&removed);
            if let Some(unit) = self.units_by_file.remove(&removed) {
                self.files.remove(&unit);
                self.drop_declared_types(&unit);
            }
        }
    }

    /// Add a relationship edge between two handles, creating placeholder
    /// elements for endpoints not yet in the hierarchy.
    pub fn add_relationship(
        &mut self,
        source: Handle,
        kind: RelationKind,
        target: Handle,
    ) -> Result<(), ModelError> {
        self.hierarchy.find_or_create(&source)?;
        self.hierarchy.find_or_create(&target)?;
        self.relations.add(source, kind, target);
        Ok(())
    }

    /// The file handle for a compilation unit, if it has been merged.
    pub fn file_handle(&self, unit: &str) -> Option<&Handle> {
        self.files.get(unit)
    }

    /// The compilation unit owning a handle, if tracked.
    pub fn unit_of_handle(&self, handle: &Handle) -> Option<&SmolStr> {
        let file = handle.enclosing_file()?;
        self.units_by_file.get(&file)
    }

    /// The unit declaring a qualified type name, if any. External types
    /// resolve to `None`.
    pub fn unit_declaring_type(&self, qname: &str) -> Option<&SmolStr> {
        self.declared_types.get(qname)
    }

    /// All merged units.
    pub fn units(&self) -> impl Iterator<Item = &SmolStr> {
        self.files.keys()
    }

    /// Elements of one file's subtree in declaration order.
    pub fn elements_in_file(&self, file: &Handle) -> Vec<&ProgramElement> {
        self.hierarchy.elements_in_file(file)
    }

    /// True if the unit's final artifact needs at least one relationship
    /// applied (some element of its subtree is an edge endpoint).
    pub fn unit_is_woven(&self, unit: &str) -> bool {
        let Some(file) = self.files.get(unit) else {
            return false;
        };
        self.hierarchy
            .subtree(file)
            .iter()
            .any(|h| self.relations.has_endpoint(h))
    }

    /// Replace one unit's subtree and originated edges with a fresh
    /// analysis result, then prune if minimal-model is enabled.
    ///
    /// The replacement is atomic with respect to this `&mut` borrow: a
    /// reader never observes the file half-merged.
    pub fn merge_unit(
        &mut self,
        unit: &str,
        package: Option<&str>,
        elements: &[ElementDecl],
        relationships: &[RelationDecl],
    ) -> Result<(), ModelError> {
        let file_handle = match package {
            Some(pkg) => self.hierarchy.root().package(pkg).file(unit),
            None => self.hierarchy.root().file(unit),
        };
        // A moved package declaration changes the file handle; the old
        // subtree has no successor and goes away entirely.
        if let Some(old) = self.files.get(unit).cloned() {
            if old != file_handle {
                debug!("[MERGE] {}: file handle moved {} -> {}", unit, old, file_handle);
                self.remove(&old);
            }
        }
        self.hierarchy.find_or_create(&file_handle)?;

        // Edges out of this file are replaced by the fresh analysis; edges
        // into it from other files survive the rebuild when their target is
        // redeclared. Outgoing edges go first so a same-file edge cannot be
        // stashed and resurrected.
        self.relations.remove_outgoing_from_file(&file_handle);
        let stashed = self.relations.detach_incoming_to_file(&file_handle);
        self.hierarchy.remove_children(&file_handle);

        let mut declared = Vec::new();
        for decl in elements {
            self.insert_decl(&file_handle, decl, package, &mut declared)?;
        }

        for rel in relationships {
            self.add_relationship(rel.source.clone(), rel.kind, rel.target.clone())?;
        }
        for edge in stashed {
            if self.hierarchy.contains(&edge.target) {
                self.relations.add(edge.source, edge.kind, edge.target);
            } else {
                trace!(
                    "[MERGE] dropping edge to vanished target {}",
                    edge.target
                );
            }
        }

        self.drop_declared_types(unit);
        for qname in &declared {
            self.declared_types.insert(qname.clone(), SmolStr::new(unit));
        }
        self.types_by_unit.insert(SmolStr::new(unit), declared);
        self.files.insert(SmolStr::new(unit), file_handle.clone());
        self.units_by_file.insert(file_handle.clone(), SmolStr::new(unit));

        if self.minimal {
            prune::prune_file_subtree(&mut self.hierarchy, &self.relations, &file_handle);
        }
        Ok(())
    }

    /// Remove a deleted unit's subtree, edges, and type records. Empty
    /// package nodes left behind are tidied away.
    pub fn remove_unit(&mut self, unit: &str) {
        let Some(file_handle) = self.files.remove(unit) else {
            return;
        };
        debug!("[MERGE] removing deleted unit {}", unit);
        self.units_by_file.remove(&file_handle);
        self.drop_declared_types(unit);
        let parent = file_handle.parent();
        for removed in self.hierarchy.remove(&file_handle) {
            self.relations.remove_naming(&removed);
        }
        // Tidy now-empty package containers up the path.
        let mut cursor = parent;
        while let Some(handle) = cursor {
            let empty_package = self
                .hierarchy
                .find(&handle)
                .is_some_and(|el| el.kind() == ElementKind::Package && el.children().is_empty());
            if !empty_package || self.relations.has_endpoint(&handle) {
                break;
            }
            cursor = handle.parent();
            self.hierarchy.remove(&handle);
        }
    }

    fn drop_declared_types(&mut self, unit: &str) {
        if let Some(old) = self.types_by_unit.remove(unit) {
            for qname in old {
                if self.declared_types.get(&qname).is_some_and(|u| u == unit) {
                    self.declared_types.remove(&qname);
                }
            }
        }
    }

    fn insert_decl(
        &mut self,
        parent: &Handle,
        decl: &ElementDecl,
        package: Option<&str>,
        declared: &mut Vec<SmolStr>,
    ) -> Result<(), ModelError> {
        let handle = match decl.kind {
            ElementKind::Type => parent.nested_type(&decl.name),
            ElementKind::Method | ElementKind::Constructor => parent.method(&decl.name),
            ElementKind::Field => parent.field(&decl.name),
            ElementKind::Advice => parent.advice(&decl.name),
            ElementKind::ImportReference => parent.import_reference(&decl.name),
            ElementKind::Configuration | ElementKind::Package | ElementKind::File => {
                return Err(ModelError::InvalidDeclaration {
                    kind: decl.kind,
                    parent: parent.clone(),
                });
            }
        };
        if decl.kind == ElementKind::Type {
            declared.push(qualified_type_name(package, &handle));
        }
        let mut element = ProgramElement::new(decl.kind, decl.name.clone(), handle.clone());
        if let Some(line) = decl.line {
            element = element.with_line(line);
        }
        self.hierarchy.insert_element(element);
        for child in &decl.children {
            self.insert_decl(&handle, child, package, declared)?;
        }
        Ok(())
    }

    /// Render the model as an indented tree plus the relationship list —
    /// the debugging dump used throughout the tests.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_element(self.hierarchy.root(), 0, &mut out);
        let mut edges: Vec<&RelationshipEdge> = self.relations.iter().collect();
        edges.sort_by(|a, b| (a.source.as_str(), a.target.as_str()).cmp(&(b.source.as_str(), b.target.as_str())));
        let mut hid = 0;
        for edge in &edges {
            hid += 1;
            out.push_str(&format!(
                "Hid:{}:(targets=1) {} ({}) {}\n",
                hid, edge.source, edge.kind, edge.target
            ));
        }
        for edge in &edges {
            hid += 1;
            out.push_str(&format!(
                "Hid:{}:(targets=1) {} ({}) {}\n",
                hid,
                edge.target,
                edge.kind.inverse_label(),
                edge.source
            ));
        }
        out
    }

    fn dump_element(&self, handle: &Handle, depth: usize, out: &mut String) {
        let Some(el) = self.hierarchy.find(handle) else {
            return;
        };
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str(el.name());
        out.push_str("  [");
        out.push_str(el.kind().label());
        out.push(']');
        if let Some(line) = el.source_line() {
            out.push_str(&format!(" {line}"));
        }
        out.push_str(&format!("  hid:{handle}\n"));
        for child in el.children() {
            self.dump_element(child, depth + 1, out);
        }
    }
}

fn qualified_type_name(package: Option<&str>, handle: &Handle) -> SmolStr {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(pkg) = package {
        parts.push(pkg);
    }
    for segment in handle.segments() {
        if segment.kind == ElementKind::Type {
            parts.push(segment.name);
        }
    }
    SmolStr::new(parts.join("."))
}
