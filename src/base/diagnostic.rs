//! Diagnostics — structural error reporting for one build cycle.
//!
//! Diagnostic *text* comes from the external analyzer; this module only
//! defines the record the engine collects, orders, and republishes. A
//! diagnostic is always attributed to the file/line/column of the symptom,
//! not to the edited file that caused it.

use smol_str::SmolStr;

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A diagnostic message attributed to a position in one compilation unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// The compilation unit the symptom appears in (e.g. `B.java`).
    pub unit: SmolStr,
    /// Line (0-indexed).
    pub line: u32,
    /// Column (0-indexed).
    pub column: u32,
    /// Severity level.
    pub severity: Severity,
    /// Diagnostic code; rendered as `0` when absent.
    pub code: Option<SmolStr>,
    /// The diagnostic message.
    pub message: String,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(unit: impl Into<SmolStr>, line: u32, column: u32, message: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            line,
            column,
            severity: Severity::Error,
            code: None,
            message: message.into(),
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(
        unit: impl Into<SmolStr>,
        line: u32,
        column: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            unit: unit.into(),
            line,
            column,
            severity: Severity::Warning,
            code: None,
            message: message.into(),
        }
    }

    /// Set the diagnostic code.
    pub fn with_code(mut self, code: impl Into<SmolStr>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Stable ordering key: file, then position.
    pub fn sort_key(&self) -> (&str, u32, u32) {
        (&self.unit, self.line, self.column)
    }
}

impl std::fmt::Display for Diagnostic {
    /// Renders `<file>:<line>:<col>::<code> <message>`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = self.code.as_deref().unwrap_or("0");
        write!(
            f,
            "{}:{}:{}::{} {}",
            self.unit, self.line, self.column, code, self.message
        )
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Diagnostic codes the engine itself attaches (analyzer-produced diagnostics
/// carry whatever code the analyzer chose).
pub mod codes {
    /// A unit's analysis failed outright; its stale structure was retained.
    pub const ANALYSIS_FAILED: &str = "E0100";
}
