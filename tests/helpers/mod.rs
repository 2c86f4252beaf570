//! Shared test support: a scripted stand-in for the external analyzer and
//! canned project fixtures.
#![allow(dead_code)]

use std::collections::HashMap;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use smol_str::SmolStr;

use weft::base::{Handle, RelationKind};
use weft::build::{AnalysisFailure, AnalyzedFile, BuildConfig, BuildEngine, FileAnalyzer};
use weft::model::{ElementDecl, RelationDecl};

/// Parse a known-good handle.
pub fn handle(text: &str) -> Handle {
    Handle::parse(text).unwrap()
}

/// An analyzer that replays scripted per-unit results. Tests mutate the
/// script between builds to simulate edits.
#[derive(Default)]
pub struct ScriptedAnalyzer {
    scripts: RwLock<HashMap<SmolStr, Result<AnalyzedFile, AnalysisFailure>>>,
}

impl ScriptedAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, unit: &str, analysis: AnalyzedFile) {
        self.scripts.write().insert(SmolStr::new(unit), Ok(analysis));
    }

    pub fn fail(&self, unit: &str, failure: AnalysisFailure) {
        self.scripts.write().insert(SmolStr::new(unit), Err(failure));
    }
}

impl FileAnalyzer for ScriptedAnalyzer {
    fn analyze(
        &self,
        unit: &str,
        _model: &weft::StructuralModel,
    ) -> Result<AnalyzedFile, AnalysisFailure> {
        self.scripts
            .read()
            .get(unit)
            .cloned()
            .unwrap_or_else(|| panic!("no script for unit '{unit}'"))
    }
}

/// Two plain units: `B.java` calls into `A.java` (B depends on A). No
/// cross-cutting relationships.
pub fn pair_project(config_name: &str) -> (BuildEngine, ScriptedAnalyzer) {
    let config = BuildConfig::new(config_name).with_source_root("src", ["A.java", "B.java"]);
    let engine = BuildEngine::new(config);
    let analyzer = ScriptedAnalyzer::new();
    analyzer.set(
        "A.java",
        AnalyzedFile::new(1)
            .in_package("demo")
            .with_element(ElementDecl::ty("A").at_line(3).with_child(ElementDecl::method("foo").at_line(4))),
    );
    analyzer.set(
        "B.java",
        AnalyzedFile::new(10)
            .in_package("demo")
            .with_element(ElementDecl::ty("B").at_line(3).with_child(ElementDecl::method("run").at_line(4)))
            .with_reference("demo.A"),
    );
    (engine, analyzer)
}

/// The aspect fixture: `Azpect.java` advises the type in `Code2.java`;
/// `Code.java` participates in no relationship. Config name `aspects`.
pub static ASPECT_SCRIPTS: Lazy<Vec<(&'static str, AnalyzedFile)>> = Lazy::new(|| {
    vec![
        (
            "Azpect.java",
            AnalyzedFile::new(5)
                .in_package("a.b.c")
                .with_element(
                    ElementDecl::ty("Azpect")
                        .at_line(3)
                        .with_child(ElementDecl::advice("before").at_line(4)),
                )
                .with_relationship(RelationDecl {
                    source: handle("=aspects<a.b.c{Azpect.java[Azpect&before"),
                    kind: RelationKind::Advises,
                    target: handle("=aspects<a.b.c{Code2.java[Code2"),
                })
                .with_reference("a.b.c.Code2"),
        ),
        (
            "Code.java",
            AnalyzedFile::new(6)
                .in_package("a.b.c")
                .with_element(ElementDecl::import("java.util.List").at_line(2))
                .with_element(ElementDecl::import("java.util.ArrayList").at_line(3))
                .with_element(
                    ElementDecl::ty("Code")
                        .at_line(5)
                        .with_child(ElementDecl::method("m").at_line(6)),
                ),
        ),
        (
            "Code2.java",
            AnalyzedFile::new(7)
                .in_package("a.b.c")
                .with_element(ElementDecl::import("java.util.List").at_line(2))
                .with_element(ElementDecl::import("java.util.ArrayList").at_line(3))
                .with_element(
                    ElementDecl::ty("Code2")
                        .at_line(5)
                        .with_child(ElementDecl::method("m").at_line(6)),
                ),
        ),
    ]
});

/// Build an engine + analyzer around the aspect fixture.
pub fn aspect_project(minimal_model: bool) -> (BuildEngine, ScriptedAnalyzer) {
    let config = BuildConfig::new("aspects")
        .with_minimal_model(minimal_model)
        .with_source_root("src", ["Azpect.java", "Code.java", "Code2.java"]);
    let engine = BuildEngine::new(config);
    let analyzer = ScriptedAnalyzer::new();
    for (unit, analysis) in ASPECT_SCRIPTS.iter() {
        analyzer.set(unit, analysis.clone());
    }
    (engine, analyzer)
}
