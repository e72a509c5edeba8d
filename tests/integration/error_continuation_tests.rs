use dupemirror::engine::{Engine, EngineError, ScanEvent, ScanOptions, WarningKind};
use dupemirror::fingerprint::{ByteHasher, PerceptualAlgorithm, PerceptualHasher};
use dupemirror::index::{MemoryIndex, SqliteIndex};
use dupemirror::scanner::{ExtensionFilter, WalkerConfig};
use std::fs;
use tempfile::tempdir;

fn jpg() -> WalkerConfig {
    WalkerConfig {
        extension: ExtensionFilter::new("jpg"),
        ..Default::default()
    }
}

#[test]
fn test_undecodable_image_is_skipped_with_warning() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("broken.jpg"), b"definitely not a jpeg").unwrap();

    let mut img = image::RgbImage::new(8, 8);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        *pixel = image::Rgb([(x * 30) as u8, (y * 30) as u8, 0]);
    }
    img.save_with_format(dir.path().join("good.jpg"), image::ImageFormat::Jpeg)
        .unwrap();

    let hasher = PerceptualHasher::new(PerceptualAlgorithm::Ahash);
    let engine = Engine::new(ScanOptions::new(dir.path()), jpg(), &hasher).unwrap();
    let mut events = Vec::new();
    let summary = engine.run(Box::new(MemoryIndex::new()), &mut events).unwrap();

    assert_eq!(summary.candidates, 2);
    assert_eq!(summary.fingerprint_errors, 1);
    assert_eq!(summary.new, 1);
    assert!(events.iter().any(|e| matches!(
        e,
        ScanEvent::Warning {
            kind: WarningKind::Fingerprint,
            path,
            ..
        } if path.ends_with("broken.jpg")
    )));
}

#[cfg(unix)]
#[test]
fn test_unreadable_file_does_not_stop_the_walk() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let locked = dir.path().join("locked.jpg");
    fs::write(&locked, b"secret").unwrap();
    fs::write(dir.path().join("open.jpg"), b"public").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Running as root ignores file modes; nothing to test then.
    if fs::File::open(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
        return;
    }

    let hasher = ByteHasher::default();
    let engine = Engine::new(ScanOptions::new(dir.path()), jpg(), &hasher).unwrap();
    let summary = engine.run(Box::new(MemoryIndex::new()), &mut Vec::new()).unwrap();

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(summary.fingerprint_errors, 1);
    assert_eq!(summary.new, 1);
}

#[cfg(unix)]
#[test]
fn test_unreadable_subdirectory_is_reported_and_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let sub = dir.path().join("no_access");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("inside.jpg"), b"inside").unwrap();
    fs::write(dir.path().join("outside.jpg"), b"outside").unwrap();
    fs::set_permissions(&sub, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read_dir(&sub).is_ok() {
        fs::set_permissions(&sub, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let hasher = ByteHasher::default();
    let engine = Engine::new(ScanOptions::new(dir.path()), jpg(), &hasher).unwrap();
    let mut events = Vec::new();
    let summary = engine.run(Box::new(MemoryIndex::new()), &mut events).unwrap();

    fs::set_permissions(&sub, fs::Permissions::from_mode(0o755)).unwrap();

    assert_eq!(summary.walk_errors, 1);
    assert_eq!(summary.new, 1);
    assert!(events.iter().any(|e| matches!(
        e,
        ScanEvent::Warning {
            kind: WarningKind::Walk,
            ..
        }
    )));
}

#[cfg(unix)]
#[test]
fn test_unreadable_root_is_fatal_and_index_is_closed() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let root = dir.path().join("root");
    fs::create_dir(&root).unwrap();
    fs::write(root.join("a.jpg"), b"a").unwrap();
    fs::set_permissions(&root, fs::Permissions::from_mode(0o000)).unwrap();

    if fs::read_dir(&root).is_ok() {
        fs::set_permissions(&root, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let db = dir.path().join("index.db");
    let hasher = ByteHasher::default();
    let engine = Engine::new(ScanOptions::new(&root), jpg(), &hasher).unwrap();
    let result = engine.run(Box::new(SqliteIndex::open(&db).unwrap()), &mut Vec::new());

    fs::set_permissions(&root, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(matches!(result, Err(EngineError::Traversal(_))));
    // The connection was released: the file reopens without a lock.
    assert!(SqliteIndex::open(&db).is_ok());
}
