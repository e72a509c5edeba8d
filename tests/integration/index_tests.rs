use dupemirror::fingerprint::ContentKey;
use dupemirror::index::{self, ContentIndex, InsertOutcome, SqliteIndex, StoreError};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn key(hex: &str) -> ContentKey {
    ContentKey::from_hex(hex).unwrap()
}

#[test]
fn test_open_transient_when_no_location() {
    let mut index = index::open(None).unwrap();
    assert!(index.insert(&key("aa"), Path::new("/a")).unwrap().is_inserted());
    assert!(!index.insert(&key("aa"), Path::new("/b")).unwrap().is_inserted());
    index.close().unwrap();
}

#[test]
fn test_open_persistent_creates_file() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("sub").join("index.db");

    let mut index = index::open(Some(&db)).unwrap();
    index.insert(&key("aa"), Path::new("/a")).unwrap();
    index.commit().unwrap();
    index.close().unwrap();

    assert!(db.is_file());
}

#[test]
fn test_committed_entries_survive_reopen() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("index.db");

    let mut index = index::open(Some(&db)).unwrap();
    index.insert(&key("aa"), Path::new("/first")).unwrap();
    index.commit().unwrap();
    index.close().unwrap();

    let mut index = index::open(Some(&db)).unwrap();
    let outcome = index.insert(&key("aa"), Path::new("/second")).unwrap();
    assert_eq!(
        outcome,
        InsertOutcome::Duplicate {
            first_seen: Some("/first".into())
        }
    );
    index.close().unwrap();
}

#[test]
fn test_uncommitted_entries_are_discarded_on_close() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("index.db");

    let mut index = index::open(Some(&db)).unwrap();
    index.insert(&key("aa"), Path::new("/a")).unwrap();
    index.close().unwrap();

    let index = SqliteIndex::open(&db).unwrap();
    assert!(index.is_empty().unwrap());
}

#[test]
fn test_table_written_by_other_tools_is_reused() {
    let dir = tempdir().unwrap();
    let db = dir.path().join(".hashed_file.db");

    {
        let conn = rusqlite::Connection::open(&db).unwrap();
        conn.execute(
            "CREATE TABLE file_hash (hash TEXT NOT NULL PRIMARY KEY, path TEXT)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO file_hash VALUES ('deadbeef', '/legacy/a.jpg')",
            [],
        )
        .unwrap();
    }

    let mut index = SqliteIndex::open(&db).unwrap();
    let outcome = index.insert(&key("deadbeef"), Path::new("/new/a.jpg")).unwrap();
    assert!(!outcome.is_inserted());
    assert_eq!(index.len().unwrap(), 1);
}

#[test]
fn test_open_rejects_non_database_file() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("index.db");
    fs::write(&db, vec![0x42u8; 4096]).unwrap();

    let result = SqliteIndex::open(&db);
    assert!(matches!(result, Err(StoreError::Open { .. })));
}

#[test]
fn test_entries_are_in_insertion_order() {
    let mut index = SqliteIndex::open_in_memory().unwrap();
    for (hex, path) in [("cc", "/c"), ("aa", "/a"), ("bb", "/b")] {
        index.insert(&key(hex), Path::new(path)).unwrap();
    }
    index.commit().unwrap();

    let keys: Vec<String> = index
        .entries()
        .unwrap()
        .into_iter()
        .map(|e| e.key.to_string())
        .collect();
    assert_eq!(keys, vec!["cc", "aa", "bb"]);
}
