//! The external analyzer contract.
//!
//! The parser/type-checker/weaver that produces structure and diagnostics
//! for one compilation unit is a collaborator, not part of this crate. The
//! driver hands it the current model (for resolving references against
//! other units' structure) and consumes the structured result; it never
//! inspects the analyzer's internals.

use smol_str::SmolStr;
use thiserror::Error;

use crate::base::Diagnostic;
use crate::model::{ElementDecl, RelationDecl, StructuralModel};

/// A unit whose analysis could not produce a result at all (for example,
/// unresolvable syntax). Recorded as a diagnostic; the unit keeps its stale
/// structural data and the cycle continues.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct AnalysisFailure {
    pub line: u32,
    pub column: u32,
    pub message: String,
}

impl AnalysisFailure {
    pub fn new(line: u32, column: u32, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

/// The structured result of analyzing one compilation unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzedFile {
    /// Declared package, if any.
    pub package: Option<SmolStr>,
    /// Top-level declarations (types and import references), in declaration
    /// order, children nested.
    pub elements: Vec<ElementDecl>,
    /// Relationship edges originating from this unit.
    pub relationships: Vec<RelationDecl>,
    /// Resolved structural references: the qualified names of every type
    /// this unit's structure depends on (supertypes, signature types,
    /// thrown exceptions, overridden-method owners).
    pub references: Vec<SmolStr>,
    /// Fingerprint of the unit's *public* structural signature: thrown
    /// exceptions, return/parameter/generic types, visibility, member and
    /// nested-type set. Bodies are excluded. Any change here propagates to
    /// dependent units.
    pub signature: u64,
    /// Diagnostics attributed to this unit.
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalyzedFile {
    pub fn new(signature: u64) -> Self {
        Self {
            package: None,
            elements: Vec::new(),
            relationships: Vec::new(),
            references: Vec::new(),
            signature,
            diagnostics: Vec::new(),
        }
    }

    pub fn in_package(mut self, package: impl Into<SmolStr>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn with_element(mut self, element: ElementDecl) -> Self {
        self.elements.push(element);
        self
    }

    pub fn with_relationship(mut self, relationship: RelationDecl) -> Self {
        self.relationships.push(relationship);
        self
    }

    pub fn with_reference(mut self, qname: impl Into<SmolStr>) -> Self {
        self.references.push(qname.into());
        self
    }

    pub fn with_diagnostic(mut self, diagnostic: Diagnostic) -> Self {
        self.diagnostics.push(diagnostic);
        self
    }
}

/// The analyzer seam. `Sync` so independent units of one wave can be
/// analyzed in parallel; no shared mutable state is touched until merge.
pub trait FileAnalyzer: Sync {
    fn analyze(
        &self,
        unit: &str,
        model: &StructuralModel,
    ) -> Result<AnalyzedFile, AnalysisFailure>;
}
