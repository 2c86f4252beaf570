//! Foundation types for the Weft toolchain.
//!
//! This module provides fundamental types used throughout the engine:
//! - [`Handle`] - Stable, structurally-derived element identifiers
//! - [`ElementKind`], [`RelationKind`] - Domain enums
//! - [`Diagnostic`], [`Severity`] - Per-cycle diagnostics
//! - [`ModelError`] - Fatal invariant violations
//!
//! This module has NO dependencies on other weft modules.

mod diagnostic;
mod handle;
mod kinds;

pub use diagnostic::{Diagnostic, Severity, codes};
pub use handle::{Handle, HandleSegment, ModelError};
pub use kinds::{ElementKind, RelationKind};
