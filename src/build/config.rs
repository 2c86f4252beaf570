//! Build configuration — the options and source roots for one engine
//! instance. Loading/parsing configuration files is out of scope; callers
//! construct this directly.

use std::hash::{Hash, Hasher};

use smol_str::SmolStr;

/// One declared source root and the compilation units under it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceRoot {
    pub path: SmolStr,
    pub units: Vec<SmolStr>,
}

/// Configuration for one build. An options change (minimal-model toggle,
/// source-root set) forces the next build to be full; unit membership
/// changes within a root flow through `ChangeSet` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct BuildConfig {
    name: SmolStr,
    minimal_model: bool,
    source_roots: Vec<SourceRoot>,
}

impl BuildConfig {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            minimal_model: false,
            source_roots: Vec::new(),
        }
    }

    /// Enable minimal-model pruning (the `minimalModel` option).
    pub fn with_minimal_model(mut self, enabled: bool) -> Self {
        self.minimal_model = enabled;
        self
    }

    /// Toggle minimal-model pruning in place. An option change forces the
    /// next build to be full.
    pub fn set_minimal_model(&mut self, enabled: bool) {
        self.minimal_model = enabled;
    }

    pub fn with_source_root(
        mut self,
        path: impl Into<SmolStr>,
        units: impl IntoIterator<Item = impl Into<SmolStr>>,
    ) -> Self {
        self.source_roots.push(SourceRoot {
            path: path.into(),
            units: units.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn minimal_model(&self) -> bool {
        self.minimal_model
    }

    pub fn source_roots(&self) -> &[SourceRoot] {
        &self.source_roots
    }

    /// All compilation units, in declaration order across roots.
    pub fn units(&self) -> impl Iterator<Item = &SmolStr> {
        self.source_roots.iter().flat_map(|r| r.units.iter())
    }

    pub fn contains_unit(&self, unit: &str) -> bool {
        self.units().any(|u| u == unit)
    }

    /// Add a unit to the first source root (creating a default root if none
    /// is declared). Pair with `ChangeSet::edited` for the new unit.
    pub fn add_unit(&mut self, unit: impl Into<SmolStr>) {
        if self.source_roots.is_empty() {
            self.source_roots.push(SourceRoot {
                path: SmolStr::new("src"),
                units: Vec::new(),
            });
        }
        self.source_roots[0].units.push(unit.into());
    }

    /// Drop a unit from every root. Pair with `ChangeSet::deleted`.
    pub fn remove_unit(&mut self, unit: &str) {
        for root in &mut self.source_roots {
            root.units.retain(|u| u != unit);
        }
    }

    /// Fingerprint of the options that force a full build when changed:
    /// the minimal-model toggle and the source-root set. Unit membership is
    /// deliberately excluded.
    pub fn options_fingerprint(&self) -> u64 {
        let mut hasher = std::hash::DefaultHasher::new();
        self.minimal_model.hash(&mut hasher);
        for root in &self.source_roots {
            root.path.hash(&mut hasher);
        }
        hasher.finish()
    }
}
