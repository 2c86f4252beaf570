//! # Dependency Graph
//!
//! The directional graph between compilation units, derived from the
//! structural model after every build cycle. It has no independent identity:
//! rebuilding it is cheap relative to reanalysis, so it is recomputed in
//! full rather than patched.

mod dependency;

pub use dependency::DependencyGraph;
