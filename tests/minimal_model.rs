#![allow(clippy::unwrap_used)]
//! Minimal-model pruning and relationship lifecycle across builds.

mod helpers;

use helpers::{aspect_project, handle};

use weft::build::ChangeSet;

#[test]
fn test_full_build_counts_woven_units() {
    let (mut engine, analyzer) = aspect_project(false);
    engine.build(&analyzer, &ChangeSet::new()).unwrap();
    assert!(engine.was_full_build());
    assert_eq!(engine.compile_count(), 3);
    // Azpect.java (advice source) and Code2.java (advised type); Code.java
    // participates in no relationship.
    assert_eq!(engine.weave_count(), 2);
    let woven: Vec<&str> = engine.report().woven().iter().map(|u| u.as_str()).collect();
    assert!(woven.contains(&"Azpect.java"));
    assert!(woven.contains(&"Code2.java"));
}

#[test]
fn test_without_minimal_model_full_structure_is_kept() {
    let (mut engine, analyzer) = aspect_project(false);
    engine.build(&analyzer, &ChangeSet::new()).unwrap();
    assert!(
        engine
            .find_element_for_handle(&handle("=aspects<a.b.c{Code.java[Code~m"), false)
            .is_some()
    );
    assert!(
        engine
            .find_element_for_handle(&handle("=aspects<a.b.c{Code.java#java.util.List"), false)
            .is_some()
    );
}

/// With minimal-model enabled, a file that no aspect touches keeps only its
/// file node as a placeholder; all finer-grained children are dropped.
#[test]
fn test_unrelated_file_prunes_to_placeholder() {
    let (mut engine, analyzer) = aspect_project(true);
    engine.build(&analyzer, &ChangeSet::new()).unwrap();

    let file = engine
        .find_element_for_handle(&handle("=aspects<a.b.c{Code.java"), false)
        .expect("file placeholder must survive pruning");
    assert!(file.children().is_empty());
    assert!(
        engine
            .find_element_for_handle(&handle("=aspects<a.b.c{Code.java[Code"), false)
            .is_none()
    );
    assert!(
        engine
            .find_element_for_handle(&handle("=aspects<a.b.c{Code.java[Code~m"), false)
            .is_none()
    );
    assert!(
        engine
            .find_element_for_handle(&handle("=aspects<a.b.c{Code.java#java.util.List"), false)
            .is_none()
    );
}

/// Relationship endpoints and their ancestor prefix survive pruning; the
/// members below them do not.
#[test]
fn test_advised_structure_survives_pruning() {
    let (mut engine, analyzer) = aspect_project(true);
    engine.build(&analyzer, &ChangeSet::new()).unwrap();

    assert!(
        engine
            .find_element_for_handle(&handle("=aspects<a.b.c{Code2.java[Code2"), false)
            .is_some()
    );
    assert!(
        engine
            .find_element_for_handle(&handle("=aspects<a.b.c{Code2.java[Code2~m"), false)
            .is_none()
    );
    assert!(
        engine
            .find_element_for_handle(&handle("=aspects<a.b.c{Azpect.java[Azpect&before"), false)
            .is_some()
    );
    assert_eq!(engine.weave_count(), 2);
}

#[test]
fn test_dump_lists_relationships_both_ways() {
    let (mut engine, analyzer) = aspect_project(true);
    engine.build(&analyzer, &ChangeSet::new()).unwrap();
    let dump = engine.dump_model();
    assert!(dump.contains(
        "=aspects<a.b.c{Azpect.java[Azpect&before (advises) =aspects<a.b.c{Code2.java[Code2"
    ));
    assert!(dump.contains(
        "=aspects<a.b.c{Code2.java[Code2 (advised by) =aspects<a.b.c{Azpect.java[Azpect&before"
    ));
    assert!(dump.contains("Code.java  [source file]"));
}

/// Deleting the unrelated file is incremental: nothing depends on it and no
/// relationship names it, so the plan is empty and the node disappears.
#[test]
fn test_deleting_unrelated_unit_is_incremental() {
    let (mut engine, analyzer) = aspect_project(true);
    engine.build(&analyzer, &ChangeSet::new()).unwrap();

    engine.config_mut().remove_unit("Code.java");
    engine.build(&analyzer, &ChangeSet::delete("Code.java")).unwrap();
    assert!(!engine.was_full_build());
    assert_eq!(engine.compile_count(), 0);
    assert!(
        engine
            .find_element_for_handle(&handle("=aspects<a.b.c{Code.java"), false)
            .is_none()
    );
    // The advised structure is untouched.
    assert!(
        engine
            .find_element_for_handle(&handle("=aspects<a.b.c{Code2.java[Code2"), false)
            .is_some()
    );
}

/// Deleting an advised file whose aspect is not being rebuilt cannot be
/// re-derived incrementally: the engine escalates to a full build.
#[test]
fn test_deleting_advised_unit_forces_full_build() {
    let (mut engine, analyzer) = aspect_project(true);
    engine.build(&analyzer, &ChangeSet::new()).unwrap();

    engine.config_mut().remove_unit("Code2.java");
    engine.build(&analyzer, &ChangeSet::delete("Code2.java")).unwrap();
    assert!(engine.was_full_build());
    assert_eq!(engine.compile_count(), 2);
}

/// Reanalyzing the pruned file keeps it pruned; reanalyzing the advised
/// file re-applies the surviving advice edge.
#[test]
fn test_pruning_is_stable_across_incremental_builds() {
    let (mut engine, analyzer) = aspect_project(true);
    engine.build(&analyzer, &ChangeSet::new()).unwrap();

    engine.build(&analyzer, &ChangeSet::edit("Code.java")).unwrap();
    assert!(!engine.was_full_build());
    let file = engine
        .find_element_for_handle(&handle("=aspects<a.b.c{Code.java"), false)
        .unwrap();
    assert!(file.children().is_empty());

    engine.build(&analyzer, &ChangeSet::edit("Code2.java")).unwrap();
    assert!(
        engine
            .find_element_for_handle(&handle("=aspects<a.b.c{Code2.java[Code2"), false)
            .is_some()
    );
    let woven: Vec<&str> = engine.report().woven().iter().map(|u| u.as_str()).collect();
    assert_eq!(woven, vec!["Code2.java"]);
}
