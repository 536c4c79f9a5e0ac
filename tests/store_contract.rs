//! Purpose: Contract tests shared by both record-store variants.
//! Exports: Integration tests only.
//! Role: Check append/load ordering, delete bounds, reload stability, and empty files.
//! Invariants: Each test works in its own temp directory.
//! Invariants: Tabular and structured stores must satisfy the same positional rules.

use std::fs;
use std::path::Path;

use recstore::api::{ErrorKind, Record, RecordStore, StoreHandle, create_store_file, open_store};

fn people() -> Vec<Record> {
    vec![
        Record::new().with("name", "Ana").with("age", "30"),
        Record::new().with("name", "Luis").with("age", "41"),
        Record::new().with("name", "Mía, hija").with("age", "7"),
    ]
}

fn fresh(dir: &Path, name: &str) -> Box<dyn RecordStore> {
    let path = dir.join(name);
    create_store_file(&path).expect("create");
    open_store(path).expect("open")
}

fn both_variants(dir: &Path) -> Vec<Box<dyn RecordStore>> {
    vec![fresh(dir, "people.csv"), fresh(dir, "people.json")]
}

#[test]
fn appends_load_back_in_order() {
    let temp = tempfile::tempdir().expect("tempdir");
    for store in both_variants(temp.path()) {
        for record in people() {
            store.append(&record).expect("append");
        }
        assert_eq!(store.load().unwrap(), people(), "{}", store.path().display());
    }
}

#[test]
fn delete_bounds_hold_for_both_variants() {
    let temp = tempfile::tempdir().expect("tempdir");
    for store in both_variants(temp.path()) {
        for record in people() {
            store.append(&record).unwrap();
        }
        let before = fs::read(store.path()).unwrap();
        assert_eq!(store.delete_at(3).unwrap(), 0);
        assert_eq!(store.delete_at(usize::MAX).unwrap(), 0);
        assert_eq!(fs::read(store.path()).unwrap(), before);

        assert_eq!(store.delete_at(1).unwrap(), 1);
        let expected = vec![people()[0].clone(), people()[2].clone()];
        assert_eq!(store.load().unwrap(), expected);
    }
}

#[test]
fn reload_without_mutation_is_stable() {
    let temp = tempfile::tempdir().expect("tempdir");
    for store in both_variants(temp.path()) {
        store.append(&people()[0]).unwrap();
        assert_eq!(store.load().unwrap(), store.load().unwrap());
    }
}

#[test]
fn replace_then_reload_reflects_exact_change() {
    let temp = tempfile::tempdir().expect("tempdir");
    for store in both_variants(temp.path()) {
        for record in people() {
            store.append(&record).unwrap();
        }
        let updated = people()[1].clone().with("age", "42");
        store.replace_record_at(1, &updated).unwrap();

        let mut expected = people();
        expected[1] = updated;
        assert_eq!(store.load().unwrap(), expected);
        assert_eq!(
            store.replace_record_at(3, &people()[0]).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}

#[test]
fn empty_file_semantics() {
    let temp = tempfile::tempdir().expect("tempdir");

    let absent = open_store(temp.path().join("absent.json")).unwrap();
    assert!(absent.load().unwrap().is_empty());

    let blank = temp.path().join("blank.json");
    fs::write(&blank, "").unwrap();
    assert!(open_store(&blank).unwrap().load().unwrap().is_empty());

    let header_only = temp.path().join("header.csv");
    fs::write(&header_only, "name,age\n").unwrap();
    assert!(open_store(&header_only).unwrap().load().unwrap().is_empty());
}

#[test]
fn scenario_tabular_first_append_sets_header() {
    let temp = tempfile::tempdir().expect("tempdir");
    let store = fresh(temp.path(), "people.csv");
    store
        .append(&Record::new().with("name", "Ana").with("age", "30"))
        .unwrap();

    assert_eq!(
        store.load().unwrap(),
        vec![Record::new().with("name", "Ana").with("age", "30")]
    );
    let text = fs::read_to_string(store.path()).unwrap();
    assert_eq!(text.lines().next(), Some("name,age"));
}

#[test]
fn scenario_tabular_delete_middle() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("ids.csv");
    fs::write(&path, "id\n1\n2\n3\n").unwrap();
    let handle = StoreHandle::open(&path).unwrap();

    assert_eq!(handle.delete_at(1).unwrap(), 1);
    assert_eq!(
        handle.load().unwrap(),
        vec![Record::new().with("id", "1"), Record::new().with("id", "3")]
    );
}

#[test]
fn scenario_structured_append_to_empty_list() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("data.json");
    fs::write(&path, "[]").unwrap();
    let handle = StoreHandle::open(&path).unwrap();

    handle.append(&Record::new().with("x", "1")).unwrap();
    assert_eq!(handle.load().unwrap(), vec![Record::new().with("x", "1")]);
}

#[test]
fn scenario_out_of_range_delete_leaves_records() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("pair.csv");
    fs::write(&path, "id\n1\n2\n").unwrap();
    let handle = StoreHandle::open(&path).unwrap();

    assert_eq!(handle.delete_at(5).unwrap(), 0);
    assert_eq!(
        handle.load().unwrap(),
        vec![Record::new().with("id", "1"), Record::new().with("id", "2")]
    );
}

#[cfg(unix)]
#[test]
fn read_only_directory_surfaces_io_failure() {
    use std::os::unix::fs::PermissionsExt;

    let temp = tempfile::tempdir().expect("tempdir");
    let dir = temp.path().join("locked");
    fs::create_dir(&dir).unwrap();
    let path = dir.join("data.json");
    fs::write(&path, "[]").unwrap();
    fs::set_permissions(&dir, fs::Permissions::from_mode(0o555)).unwrap();

    // Root ignores directory permissions; nothing to check there.
    let canary = dir.join(".canary");
    if fs::write(&canary, b"").is_ok() {
        let _ = fs::remove_file(&canary);
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let store = open_store(&path).unwrap();
    let err = store.append(&Record::new().with("x", "1")).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Permission | ErrorKind::Io));
    assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    fs::set_permissions(&dir, fs::Permissions::from_mode(0o755)).unwrap();
}
