use dupemirror::engine::{Engine, ScanEvent, ScanOptions};
use dupemirror::fingerprint::ByteHasher;
use dupemirror::index::{MemoryIndex, SqliteIndex};
use dupemirror::mirror::{mirror, mirror_target, MirrorError};
use dupemirror::scanner::{ExtensionFilter, WalkerConfig};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn jpg() -> WalkerConfig {
    WalkerConfig {
        extension: ExtensionFilter::new("jpg"),
        ..Default::default()
    }
}

fn relative_to_root(path: &Path) -> &Path {
    path.strip_prefix("/").unwrap_or(path)
}

#[cfg(unix)]
#[test]
fn test_mirror_target_reproduces_absolute_path() {
    assert_eq!(
        mirror_target(Path::new("/a/b/c.jpg"), Path::new("/out")).unwrap(),
        Path::new("/out/a/b/c.jpg")
    );
}

#[test]
fn test_mirror_target_rejects_parent_components() {
    let result = mirror_target(Path::new("/a/../etc/passwd"), Path::new("/out"));
    assert!(matches!(result, Err(MirrorError::Escapes(_))));
}

#[test]
fn test_copy_mode_mirrors_only_first_seen() {
    let dir = tempdir().unwrap();
    let tree = dir.path().join("tree");
    let dest = dir.path().join("backup");
    fs::create_dir(&tree).unwrap();
    fs::write(tree.join("x.jpg"), b"pixels").unwrap();
    fs::write(tree.join("copy_of_x.jpg"), b"pixels").unwrap();
    fs::write(tree.join("y.jpg"), b"other").unwrap();

    let hasher = ByteHasher::default();
    let options = ScanOptions::new(&tree).with_destination(&dest);
    let engine = Engine::new(options, jpg(), &hasher).unwrap();
    let mut events = Vec::new();
    let summary = engine.run(Box::new(MemoryIndex::new()), &mut events).unwrap();

    assert_eq!(summary.new, 2);
    assert_eq!(summary.duplicates, 1);
    assert_eq!(summary.copied, 2);
    assert_eq!(summary.bytes_copied, 11);

    let canonical = tree.canonicalize().unwrap();
    let mirrored = dest.join(relative_to_root(&canonical));
    assert_eq!(fs::read(mirrored.join("copy_of_x.jpg")).unwrap(), b"pixels");
    assert_eq!(fs::read(mirrored.join("y.jpg")).unwrap(), b"other");
    assert!(!mirrored.join("x.jpg").exists());

    let copied: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, ScanEvent::Copied { .. }))
        .collect();
    assert_eq!(copied.len(), 2);
}

#[test]
fn test_copy_mode_creates_destination() {
    let dir = tempdir().unwrap();
    let tree = dir.path().join("tree");
    let nested_dest = dir.path().join("not").join("yet").join("here");
    fs::create_dir_all(tree.join("deep").join("er")).unwrap();
    fs::write(tree.join("deep").join("er").join("a.jpg"), b"a").unwrap();

    let hasher = ByteHasher::default();
    let options = ScanOptions::new(&tree).with_destination(&nested_dest);
    let engine = Engine::new(options, jpg(), &hasher).unwrap();
    let summary = engine.run(Box::new(MemoryIndex::new()), &mut Vec::new()).unwrap();

    assert_eq!(summary.copied, 1);
    let canonical = tree.canonicalize().unwrap();
    let target = nested_dest
        .join(relative_to_root(&canonical))
        .join("deep")
        .join("er")
        .join("a.jpg");
    assert!(target.is_file());
}

#[test]
fn test_second_copy_run_copies_nothing() {
    let dir = tempdir().unwrap();
    let tree = dir.path().join("tree");
    let dest = dir.path().join("backup");
    fs::create_dir(&tree).unwrap();
    fs::write(tree.join("a.jpg"), b"a").unwrap();
    fs::write(tree.join("b.jpg"), b"b").unwrap();
    let db = dir.path().join("index.db");

    let hasher = ByteHasher::default();
    let options = ScanOptions::new(&tree).with_destination(&dest);
    let engine = Engine::new(options, jpg(), &hasher).unwrap();

    let first = engine
        .run(Box::new(SqliteIndex::open(&db).unwrap()), &mut Vec::new())
        .unwrap();
    assert_eq!(first.copied, 2);

    let second = engine
        .run(Box::new(SqliteIndex::open(&db).unwrap()), &mut Vec::new())
        .unwrap();
    assert_eq!(second.copied, 0);
    assert_eq!(second.duplicates, 2);
}

#[test]
fn test_mirror_overwrites_existing_target() {
    let dir = tempdir().unwrap();
    let source = dir.path().join("src.jpg");
    let dest = dir.path().join("backup");
    fs::write(&source, b"new").unwrap();

    let source = source.canonicalize().unwrap();
    let target = mirror_target(&source, &dest).unwrap();
    fs::create_dir_all(target.parent().unwrap()).unwrap();
    fs::write(&target, b"stale contents").unwrap();

    let outcome = mirror(&source, &dest).unwrap();
    assert_eq!(outcome.target, target);
    assert_eq!(outcome.bytes, 3);
    assert_eq!(fs::read(&target).unwrap(), b"new");
}

#[test]
fn test_failed_copy_keeps_index_entry() {
    let dir = tempdir().unwrap();
    let tree = dir.path().join("tree");
    fs::create_dir(&tree).unwrap();
    fs::write(tree.join("a.jpg"), b"a").unwrap();

    // A file where the destination directory should be makes every copy fail.
    let dest_parent = dir.path().join("blocked");
    fs::create_dir(&dest_parent).unwrap();
    let dest = dest_parent.join("backup");
    let canonical = tree.canonicalize().unwrap();
    let first_component = relative_to_root(&canonical).components().next().unwrap();
    fs::create_dir(&dest).unwrap();
    fs::write(dest.join(first_component.as_os_str()), b"not a dir").unwrap();

    let db = dir.path().join("index.db");
    let hasher = ByteHasher::default();
    let options = ScanOptions::new(&tree).with_destination(&dest);
    let engine = Engine::new(options, jpg(), &hasher).unwrap();
    let summary = engine
        .run(Box::new(SqliteIndex::open(&db).unwrap()), &mut Vec::new())
        .unwrap();

    assert_eq!(summary.new, 1);
    assert_eq!(summary.copied, 0);
    assert_eq!(summary.copy_errors, 1);

    let index = SqliteIndex::open(&db).unwrap();
    assert_eq!(index.entries().unwrap().len(), 1);
}
