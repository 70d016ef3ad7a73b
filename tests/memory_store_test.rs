/// Integration tests for the markdown memory store.
///
/// Covers the two-tier read path (centralized over legacy), writes landing
/// only in the centralized tier, listing across tiers, and tiered deletes.
use std::fs;
use std::path::Path;

use serena_core::{Error, MemoryStore, SerenaHome};
use tempfile::TempDir;

fn open(home: &TempDir, root: &Path) -> MemoryStore {
    MemoryStore::open(&SerenaHome::at(home.path()), root).unwrap()
}

/// Drop a memory file straight into the project's legacy tier.
fn seed_legacy(root: &Path, name: &str, content: &str) {
    let dir = root.join(".serena/memories");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), content).unwrap();
}

// ─── Round-trips ──────────────────────────────────────────────────────────────

#[test]
fn save_then_load_round_trips() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    let store = open(&home, project.path());

    let path = store.save("architecture", "# Architecture\n\nLayered.\n").unwrap();
    assert!(
        path.starts_with(home.path()),
        "writes must land in the centralized tier, got {path:?}"
    );
    assert_eq!(
        store.load("architecture").unwrap(),
        "# Architecture\n\nLayered.\n"
    );
}

#[test]
fn save_overwrites_existing_memory() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    let store = open(&home, project.path());

    store.save("notes", "v1").unwrap();
    store.save("notes", "v2").unwrap();
    assert_eq!(store.load("notes").unwrap(), "v2");
}

#[test]
fn md_suffix_addresses_the_same_memory() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    let store = open(&home, project.path());

    store.save("style.md", "tabs").unwrap();
    assert_eq!(store.load("style").unwrap(), "tabs");
    assert_eq!(store.load("style.md").unwrap(), "tabs");
}

// ─── Two-tier reads ───────────────────────────────────────────────────────────

#[test]
fn centralized_tier_shadows_legacy() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    seed_legacy(project.path(), "notes.md", "legacy text");

    let store = open(&home, project.path());
    assert_eq!(
        store.load("notes").unwrap(),
        "legacy text",
        "legacy tier must be readable while nothing shadows it"
    );

    store.save("notes", "central text").unwrap();
    assert_eq!(store.load("notes").unwrap(), "central text");

    // The legacy file itself was never touched.
    let legacy = project.path().join(".serena/memories/notes.md");
    assert_eq!(fs::read_to_string(legacy).unwrap(), "legacy text");
}

#[test]
fn legacy_tier_stops_mattering_once_its_directory_is_gone() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    seed_legacy(project.path(), "notes.md", "legacy text");

    let store = open(&home, project.path());
    assert!(store.load("notes").is_ok());

    fs::remove_dir_all(project.path().join(".serena")).unwrap();
    let err = store.load("notes").unwrap_err();
    assert!(matches!(err, Error::MemoryNotFound { .. }), "got {err:?}");
}

#[test]
fn not_found_reports_every_location_checked() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    seed_legacy(project.path(), "other.md", "x");

    let err = open(&home, project.path()).load("missing").unwrap_err();
    match err {
        Error::MemoryNotFound { name, checked } => {
            assert_eq!(name, "missing");
            assert_eq!(checked.len(), 2, "both tiers existed, both must be listed");
        }
        other => panic!("expected MemoryNotFound, got {other:?}"),
    }
}

// ─── Listing ──────────────────────────────────────────────────────────────────

#[test]
fn list_unions_both_tiers_sorted_and_deduplicated() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    seed_legacy(project.path(), "beta.md", "L");
    seed_legacy(project.path(), "gamma.md", "L");
    seed_legacy(project.path(), "README.txt", "not a memory");

    let store = open(&home, project.path());
    store.save("alpha", "C").unwrap();
    store.save("beta", "C").unwrap();

    assert_eq!(store.list().unwrap(), ["alpha", "beta", "gamma"]);
}

#[test]
fn every_listed_name_loads_back() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    let store = open(&home, project.path());

    store.save("notes", "plain").unwrap();
    // Stored as `notes.md.md`: stripping one suffix leaves `.md` in the stem.
    store.save("notes.md.md", "doubled").unwrap();

    let names = store.list().unwrap();
    assert_eq!(names, ["notes", "notes.md.md"]);
    for name in &names {
        assert!(store.load(name).is_ok(), "listed name {name:?} must load");
    }
    assert_eq!(store.load("notes.md.md").unwrap(), "doubled");
}

#[test]
fn list_is_empty_when_neither_tier_exists() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    assert!(open(&home, project.path()).list().unwrap().is_empty());
}

// ─── Deletes ──────────────────────────────────────────────────────────────────

#[test]
fn delete_removes_the_centralized_copy_first() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    seed_legacy(project.path(), "notes.md", "legacy text");

    let store = open(&home, project.path());
    store.save("notes", "central text").unwrap();

    let removed = store.delete("notes").unwrap();
    assert!(removed.starts_with(home.path()));

    // The legacy copy is visible again, and a second delete removes it.
    assert_eq!(store.load("notes").unwrap(), "legacy text");
    let removed = store.delete("notes").unwrap();
    assert!(removed.starts_with(project.path()));

    let err = store.delete("notes").unwrap_err();
    assert!(matches!(err, Error::MemoryNotFound { .. }), "got {err:?}");
}

// ─── Name validation ──────────────────────────────────────────────────────────

#[test]
fn traversal_names_are_rejected_by_every_operation() {
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();
    let store = open(&home, project.path());

    for bad in ["../escape", "a/b", ""] {
        assert!(
            matches!(store.save(bad, "x"), Err(Error::InvalidMemoryName { .. })),
            "save must reject {bad:?}"
        );
        assert!(
            matches!(store.load(bad), Err(Error::InvalidMemoryName { .. })),
            "load must reject {bad:?}"
        );
        assert!(
            matches!(store.delete(bad), Err(Error::InvalidMemoryName { .. })),
            "delete must reject {bad:?}"
        );
    }
}
