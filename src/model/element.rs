//! Program elements — the nodes of the structural model.

use smol_str::SmolStr;

use crate::base::{ElementKind, Handle};

/// One node in the structural model: a file, package, type, member, or
/// advice declaration.
///
/// Elements never hold references to each other. Containment is a list of
/// child *handles* owned by the parent (arena-plus-key: the hierarchy map
/// owns every element; edges and children are keys into it). Child order is
/// declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgramElement {
    kind: ElementKind,
    name: SmolStr,
    handle: Handle,
    source_line: Option<u32>,
    children: Vec<Handle>,
}

impl ProgramElement {
    pub fn new(kind: ElementKind, name: impl Into<SmolStr>, handle: Handle) -> Self {
        Self {
            kind,
            name: name.into(),
            handle,
            source_line: None,
            children: Vec::new(),
        }
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.source_line = Some(line);
        self
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn source_line(&self) -> Option<u32> {
        self.source_line
    }

    /// Child handles in declaration order.
    pub fn children(&self) -> &[Handle] {
        &self.children
    }

    pub(crate) fn push_child(&mut self, child: Handle) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    pub(crate) fn remove_child(&mut self, child: &Handle) {
        self.children.retain(|c| c != child);
    }

    pub(crate) fn clear_children(&mut self) -> Vec<Handle> {
        std::mem::take(&mut self.children)
    }
}
