#![allow(clippy::unwrap_used)]
//! Snapshot round-trip: the persisted tree, edges, and build state must be
//! read back verbatim and drive the next classification.

mod helpers;

use std::fs::File;
use std::io::{Seek, SeekFrom};

use helpers::{aspect_project, handle};

use weft::build::{BuildConfig, ChangeSet, Snapshot};

#[test]
fn test_snapshot_round_trip_preserves_model_and_state() {
    let (mut engine, analyzer) = aspect_project(true);
    engine.build(&analyzer, &ChangeSet::new()).unwrap();
    let dump_before = engine.dump_model();

    let mut file = tempfile::tempfile().unwrap();
    Snapshot::of(&engine).write_json(&file).unwrap();
    file.seek(SeekFrom::Start(0)).unwrap();
    let restored = Snapshot::read_json(&file).unwrap();

    let config = BuildConfig::new("aspects")
        .with_minimal_model(true)
        .with_source_root("src", ["Azpect.java", "Code.java", "Code2.java"]);
    let mut engine = restored.restore(config);

    assert_eq!(engine.dump_model(), dump_before);
    assert!(
        engine
            .find_element_for_handle(&handle("=aspects<a.b.c{Code2.java[Code2"), false)
            .is_some()
    );

    // The restored state still classifies incrementally: an empty edit set
    // compiles nothing, and an edit stays scoped.
    engine.build(&analyzer, &ChangeSet::new()).unwrap();
    assert!(!engine.was_full_build());
    assert_eq!(engine.compile_count(), 0);

    engine.build(&analyzer, &ChangeSet::edit("Azpect.java")).unwrap();
    assert!(!engine.was_full_build());
    assert_eq!(engine.compile_count(), 1);
}

#[test]
fn test_snapshot_file_is_self_contained() {
    let (mut engine, analyzer) = aspect_project(false);
    engine.build(&analyzer, &ChangeSet::new()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    Snapshot::of(&engine).write_json(File::create(&path).unwrap()).unwrap();

    let restored = Snapshot::read_json(File::open(&path).unwrap()).unwrap();
    let engine = restored.restore(
        BuildConfig::new("aspects")
            .with_source_root("src", ["Azpect.java", "Code.java", "Code2.java"]),
    );
    assert!(
        engine
            .find_element_for_handle(&handle("=aspects<a.b.c{Code.java[Code~m"), false)
            .is_some()
    );
}
