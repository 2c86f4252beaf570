//! Structural handles — stable identifiers for program elements.
//!
//! A handle encodes the containment path from the build-configuration root
//! down to one element, using one separator token per level:
//!
//! ```text
//! =demo<a.b.c{Code.java[Code~m
//! ^    ^     ^         ^    ^
//! root package file     type method
//! ```
//!
//! Separators: `=` configuration root, `<` package, `{` source file,
//! `[` type (repeatable for nested types), `~` method/constructor,
//! `^` field, `&` advice, `#` import reference. Package segments are joined
//! with `.` inside a single package node.
//!
//! A handle is a strict extension of its parent's handle, and it resolves to
//! at most one element for the lifetime of a model. Handles are validated at
//! construction: a [`Handle`] value is well-formed by construction, so model
//! lookups never have to re-check the grammar.

use smol_str::SmolStr;
use thiserror::Error;

use super::kinds::ElementKind;

/// Fatal model invariant violations.
///
/// These are programmer errors, not recoverable build diagnostics: a model
/// that observed one must not be reused (the engine discards it and forces a
/// full rebuild on the next cycle).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    /// The handle text does not follow the separator grammar.
    #[error("malformed handle '{0}'")]
    MalformedHandle(String),

    /// A handle already resolves to an element of a different kind.
    ///
    /// Handles are never reused for a different element within the lifetime
    /// of the model.
    #[error("handle '{handle}' already names a {existing:?}, requested {requested:?}")]
    HandleReuse {
        handle: Handle,
        existing: ElementKind,
        requested: ElementKind,
    },

    /// An analyzer delta declared an element kind where the containment
    /// grammar does not allow one.
    #[error("{kind} declaration cannot be nested under '{parent}'")]
    InvalidDeclaration { kind: ElementKind, parent: Handle },
}

/// The separator tokens, in the order they may appear.
const SEPARATORS: [char; 7] = ['<', '{', '[', '~', '^', '&', '#'];

/// One level of a parsed handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandleSegment<'a> {
    /// The element kind implied by the separator token.
    ///
    /// `~` maps to [`ElementKind::Method`]; constructors are textually
    /// indistinguishable, so placeholder creation infers `Method` and the
    /// analyzer's declared kind takes precedence on merge.
    pub kind: ElementKind,
    /// The segment text (without the separator).
    pub name: &'a str,
}

/// A stable, structurally-derived identifier for a program element.
///
/// Cheap to clone (inline small-string). Ordered and hashable so it can key
/// the hierarchy arena and the relationship indices.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct Handle(SmolStr);

impl Handle {
    /// Parse and validate handle text.
    pub fn parse(text: &str) -> Result<Self, ModelError> {
        segments_of(text)?;
        Ok(Self(SmolStr::new(text)))
    }

    /// The handle of a build-configuration root.
    pub fn configuration(name: &str) -> Self {
        debug_assert!(clean_segment(name));
        Self(SmolStr::new(format!("={name}")))
    }

    /// Child package node (dotted segments, one node per package).
    pub fn package(&self, name: &str) -> Self {
        self.child('<', name)
    }

    /// Child source-file node.
    pub fn file(&self, name: &str) -> Self {
        self.child('{', name)
    }

    /// Child type node (may be applied to a file or to an enclosing type).
    pub fn nested_type(&self, name: &str) -> Self {
        self.child('[', name)
    }

    /// Child method or constructor node.
    pub fn method(&self, name: &str) -> Self {
        self.child('~', name)
    }

    /// Child field node.
    pub fn field(&self, name: &str) -> Self {
        self.child('^', name)
    }

    /// Child advice node.
    pub fn advice(&self, name: &str) -> Self {
        self.child('&', name)
    }

    /// Child import-reference node.
    pub fn import_reference(&self, name: &str) -> Self {
        self.child('#', name)
    }

    fn child(&self, sep: char, name: &str) -> Self {
        debug_assert!(clean_segment(name));
        let mut text = String::with_capacity(self.0.len() + name.len() + 1);
        text.push_str(&self.0);
        text.push(sep);
        text.push_str(name);
        Self(SmolStr::new(text))
    }

    /// The handle text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The parsed segments, root first. Never empty.
    pub fn segments(&self) -> Vec<HandleSegment<'_>> {
        // A Handle is validated at construction, so this cannot fail.
        segments_of(&self.0).unwrap_or_default()
    }

    /// The element kind implied by the last segment.
    pub fn kind(&self) -> ElementKind {
        self.segments().last().map(|s| s.kind).unwrap_or(ElementKind::Configuration)
    }

    /// The display name of the last segment.
    pub fn name(&self) -> &str {
        let rest = &self.0[1..];
        match rest.rfind(SEPARATORS) {
            Some(idx) => &rest[idx + 1..],
            None => rest,
        }
    }

    /// The handle of the enclosing element, if any.
    pub fn parent(&self) -> Option<Handle> {
        let rest = &self.0[1..];
        let idx = rest.rfind(SEPARATORS)?;
        Some(Self(SmolStr::new(&self.0[..idx + 1])))
    }

    /// True if `self` names an element strictly inside `ancestor`.
    ///
    /// Prefix comparison respects segment boundaries: `=c{A` is not an
    /// ancestor of `=c{A.java`.
    pub fn is_extension_of(&self, ancestor: &Handle) -> bool {
        if self.0.len() <= ancestor.0.len() || !self.0.starts_with(ancestor.0.as_str()) {
            return false;
        }
        self.0[ancestor.0.len()..]
            .chars()
            .next()
            .is_some_and(|c| SEPARATORS.contains(&c))
    }

    /// The prefix of this handle up to and including its file segment.
    pub fn enclosing_file(&self) -> Option<Handle> {
        let open = self.0.find('{')?;
        let rest = &self.0[open + 1..];
        let end = rest.find(SEPARATORS).map(|i| open + 1 + i).unwrap_or(self.0.len());
        Some(Self(SmolStr::new(&self.0[..end])))
    }
}

impl std::fmt::Display for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::fmt::Debug for Handle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handle({})", self.0)
    }
}

fn clean_segment(name: &str) -> bool {
    !name.is_empty() && !name.contains('=') && !name.contains(&SEPARATORS[..])
}

/// Push one parsed segment, enforcing the level grammar.
fn push_segment<'a>(
    text: &str,
    segments: &mut Vec<HandleSegment<'a>>,
    delim: char,
    name: &'a str,
) -> Result<(), ModelError> {
    if name.is_empty() {
        return Err(ModelError::MalformedHandle(text.to_string()));
    }
    let kind = match delim {
        '=' => ElementKind::Configuration,
        '<' => ElementKind::Package,
        '{' => ElementKind::File,
        '[' => ElementKind::Type,
        '~' => ElementKind::Method,
        '^' => ElementKind::Field,
        '&' => ElementKind::Advice,
        '#' => ElementKind::ImportReference,
        _ => unreachable!("scanner only stops at separator tokens"),
    };
    // Each separator is only legal under certain parents.
    let parent = segments.last().map(|s| s.kind);
    let legal = match kind {
        ElementKind::Configuration => parent.is_none(),
        ElementKind::Package => parent == Some(ElementKind::Configuration),
        ElementKind::File => matches!(
            parent,
            Some(ElementKind::Configuration) | Some(ElementKind::Package)
        ),
        ElementKind::Type => matches!(parent, Some(ElementKind::File) | Some(ElementKind::Type)),
        ElementKind::ImportReference => parent == Some(ElementKind::File),
        ElementKind::Method
        | ElementKind::Constructor
        | ElementKind::Field
        | ElementKind::Advice => parent == Some(ElementKind::Type),
    };
    if !legal {
        return Err(ModelError::MalformedHandle(text.to_string()));
    }
    segments.push(HandleSegment { kind, name });
    Ok(())
}

/// Parse handle text into segments, enforcing the level grammar.
fn segments_of(text: &str) -> Result<Vec<HandleSegment<'_>>, ModelError> {
    let rest = text
        .strip_prefix('=')
        .ok_or_else(|| ModelError::MalformedHandle(text.to_string()))?;
    let mut segments = Vec::new();
    let mut delim = '=';
    let mut start = 0;

    for (i, c) in rest.char_indices() {
        if SEPARATORS.contains(&c) {
            push_segment(text, &mut segments, delim, &rest[start..i])?;
            // Members and import references are terminal levels.
            if matches!(
                segments.last().map(|s| s.kind),
                Some(ElementKind::Method)
                    | Some(ElementKind::Field)
                    | Some(ElementKind::Advice)
                    | Some(ElementKind::ImportReference)
            ) {
                return Err(ModelError::MalformedHandle(text.to_string()));
            }
            delim = c;
            start = i + c.len_utf8();
        }
    }
    push_segment(text, &mut segments, delim, &rest[start..])?;
    Ok(segments)
}
