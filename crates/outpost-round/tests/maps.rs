//! Integration tests for custom map loading and rotation.

use std::fs;

use outpost_round::{Gamemode, Map, MapRegistry};

fn write_map(dir: &std::path::Path, file: &str, json: &str) {
    fs::write(dir.join(file), json).unwrap();
}

#[test]
fn test_reload_counts_new_custom_maps() {
    let dir = tempfile::tempdir().unwrap();
    let mut maps = MapRegistry::new(dir.path());
    let defaults = maps.len();
    assert_eq!(maps.reload(), 0);

    write_map(dir.path(), "rivers.json", r#"{"name": "Twin Rivers", "author": "kat", "width": 200, "height": 150}"#);
    write_map(dir.path(), "dunes.json", r#"{"name": "Dunes", "width": 90, "height": 90, "rules": {"waves": false}}"#);
    assert_eq!(maps.reload(), 2);
    assert_eq!(maps.len(), defaults + 2);

    let rivers = maps.find("twin_rivers").unwrap();
    assert!(rivers.custom);
    assert_eq!(rivers.author(), Some("kat"));
    assert_eq!(rivers.file.as_deref(), Some(dir.path().join("rivers.json").as_path()));
    assert!(!maps.find("Dunes").unwrap().apply_rules(Gamemode::Survival).waves);

    // Reloading the same directory finds nothing new.
    assert_eq!(maps.reload(), 0);
}

#[test]
fn test_unreadable_descriptors_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write_map(dir.path(), "good.json", r#"{"name": "Good", "width": 10, "height": 10}"#);
    write_map(dir.path(), "bad.json", "{ not json");
    write_map(dir.path(), "notes.txt", "ignored");

    let mut maps = MapRegistry::with_defaults(Vec::new(), dir.path());
    assert_eq!(maps.reload(), 1);
    assert_eq!(maps.custom()[0].name, "Good");
}

#[test]
fn test_missing_directory_means_no_custom_maps() {
    let dir = tempfile::tempdir().unwrap();
    let mut maps = MapRegistry::new(dir.path().join("absent"));
    assert_eq!(maps.reload(), 0);
    assert!(maps.custom().is_empty());
}

#[test]
fn test_rotation_prefers_custom_pool() {
    let dir = tempfile::tempdir().unwrap();
    write_map(dir.path(), "a.json", r#"{"name": "Custom A", "width": 10, "height": 10}"#);
    write_map(dir.path(), "b.json", r#"{"name": "Custom B", "width": 10, "height": 10}"#);

    let mut maps = MapRegistry::new(dir.path());
    maps.reload();
    assert_eq!(maps.rotation_pool().len(), 2);

    let current = maps.find("Custom A").cloned();
    let mut rng = rand::rng();
    for _ in 0..20 {
        let next = maps.select_next(current.as_ref(), &mut rng).unwrap();
        assert_eq!(next.name, "Custom B");
    }
}

#[test]
fn test_rotation_excludes_current_from_defaults() {
    let maps = MapRegistry::with_defaults(
        vec![Map::new("One", 1, 1), Map::new("Two", 1, 1), Map::new("Three", 1, 1)],
        "unused",
    );
    let current = Map::new("Two", 1, 1);
    let mut rng = rand::rng();
    for _ in 0..50 {
        assert_ne!(maps.select_next(Some(&current), &mut rng).unwrap().name, "Two");
    }
    // Without a current map every entry is a candidate.
    assert!(maps.select_next(None, &mut rng).is_some());
}
