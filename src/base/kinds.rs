//! Element and relationship kinds.

/// The kind of a program element in the structural model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub enum ElementKind {
    /// The hierarchy root for one build configuration.
    Configuration,
    Package,
    File,
    Type,
    Method,
    Constructor,
    Field,
    Advice,
    ImportReference,
}

impl ElementKind {
    /// Display label, matching the model dump vocabulary.
    pub fn label(&self) -> &'static str {
        match self {
            ElementKind::Configuration => "build configuration",
            ElementKind::Package => "package",
            ElementKind::File => "source file",
            ElementKind::Type => "type",
            ElementKind::Method => "method",
            ElementKind::Constructor => "constructor",
            ElementKind::Field => "field",
            ElementKind::Advice => "advice",
            ElementKind::ImportReference => "import reference",
        }
    }

    /// True for kinds that can own members (types).
    pub fn is_member_container(&self) -> bool {
        matches!(self, ElementKind::Type)
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The kind of a cross-cutting relationship between two elements.
///
/// Every stored edge carries its forward kind; the inverse direction is
/// indexed alongside it so both traversals are O(1) (see
/// `model::RelationshipMap`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub enum RelationKind {
    /// Advice applying to a target element.
    Advises,
    /// An inter-type or annotation-style declaration on a target element.
    Declares,
}

impl RelationKind {
    /// Forward display label.
    pub fn label(&self) -> &'static str {
        match self {
            RelationKind::Advises => "advises",
            RelationKind::Declares => "declares on",
        }
    }

    /// Display label of the inverse direction.
    pub fn inverse_label(&self) -> &'static str {
        match self {
            RelationKind::Advises => "advised by",
            RelationKind::Declares => "declared by",
        }
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
