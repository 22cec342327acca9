use dedupe::duplicates::DuplicateFinder;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path.canonicalize().unwrap()
}

#[test]
fn test_duplicates_across_roots() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    let a = write(first.path(), "photo.jpg", b"jpeg bytes");
    let b = write(second.path(), "backup/photo.jpg", b"jpeg bytes");
    write(second.path(), "other.jpg", b"other bytes");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(&[first.path().to_path_buf(), second.path().to_path_buf()])
        .unwrap();

    assert_eq!(summary.roots.len(), 2);
    assert_eq!(summary.files_discovered, 3);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].paths(), vec![a, b]);
}

#[test]
fn test_root_order_decides_preserved_copy() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    let in_first = write(first.path(), "z.txt", b"shared");
    let in_second = write(second.path(), "a.txt", b"shared");

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(&[second.path().to_path_buf(), first.path().to_path_buf()])
        .unwrap();

    assert_eq!(groups[0].preserved().path, in_second);
    assert_eq!(groups[0].duplicates()[0].path, in_first);
}

#[test]
fn test_nested_root_scanned_once() {
    let dir = tempdir().unwrap();
    write(dir.path(), "top.txt", b"content");
    write(dir.path(), "sub/inner.txt", b"content");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf(), dir.path().join("sub")])
        .unwrap();

    assert_eq!(summary.files_discovered, 2);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
}

#[test]
fn test_same_root_twice() {
    let dir = tempdir().unwrap();
    write(dir.path(), "only.txt", b"content");

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf(), dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(summary.roots.len(), 1);
    assert_eq!(summary.files_discovered, 1);
    assert!(groups.is_empty());
}
