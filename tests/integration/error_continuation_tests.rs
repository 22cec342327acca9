use dedupe::duplicates::{DuplicateFinder, FailureKind, FinderError, Stage};
use dedupe::scanner::FileEntry;
use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;
use tempfile::tempdir;

#[test]
fn test_vanished_files_are_recorded_not_fatal() {
    let finder = DuplicateFinder::with_defaults();
    let file1 = FileEntry::new(PathBuf::from("nonexistent_1.txt"), 100, SystemTime::now());
    let file2 = FileEntry::new(PathBuf::from("nonexistent_2.txt"), 100, SystemTime::now());

    let (groups, summary) = finder.find_duplicates_from_files(vec![file1, file2]).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.failures.len(), 2);
    for failure in &summary.failures {
        assert_eq!(failure.stage, Stage::Prefix);
        assert_eq!(failure.kind, FailureKind::NotFound);
    }

    let failures = summary.failure_summary();
    assert_eq!(failures.count, 2);
    assert_eq!(failures.not_found, 2);
    assert_eq!(failures.io, 0);
}

#[test]
fn test_one_failure_does_not_cancel_siblings() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::write(&a, b"survivor").unwrap();
    fs::write(&b, b"survivor").unwrap();

    let now = SystemTime::now();
    let files = vec![
        FileEntry::new(a.clone(), 8, now),
        FileEntry::new(dir.path().join("gone"), 8, now),
        FileEntry::new(b.clone(), 8, now),
    ];

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_from_files(files)
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].paths(), vec![a, b]);
    assert_eq!(summary.failed_files(), 1);
    assert_eq!(summary.prefix_stage.failed_files, 1);
}

#[test]
fn test_conservation_with_failures() {
    let dir = tempdir().unwrap();
    let now = SystemTime::now();
    let mut files = Vec::new();
    for (name, content) in [("a", "X"), ("b", "X"), ("c", "XY"), ("d", "Y")] {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        files.push(FileEntry::new(path, content.len() as u64, now));
    }
    files.push(FileEntry::new(dir.path().join("missing"), 1, now));

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates_from_files(files)
        .unwrap();

    let grouped: usize = groups.iter().map(|g| g.len()).sum();
    assert_eq!(grouped, 2);
    assert_eq!(summary.failed_files(), 1);
    assert_eq!(
        summary.unique_files() + grouped,
        summary.files_discovered - summary.failed_files()
    );
}

#[test]
fn test_missing_root_is_fatal() {
    let dir = tempdir().unwrap();
    let result = DuplicateFinder::with_defaults().find_duplicates(&[dir.path().join("nope")]);

    assert!(matches!(result, Err(FinderError::PathNotFound(_))));
}

#[test]
fn test_file_root_is_fatal() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("plain.txt");
    fs::write(&file, b"x").unwrap();

    let result = DuplicateFinder::with_defaults().find_duplicates(&[file]);
    assert!(matches!(result, Err(FinderError::NotADirectory(_))));
}

#[cfg(unix)]
#[test]
fn test_permission_denied_file_is_skipped() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"same").unwrap();
    fs::write(dir.path().join("b"), b"same").unwrap();
    let locked = dir.path().join("c");
    fs::write(&locked, b"same").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root ignores permission bits; nothing to observe then.
    if fs::File::open(&locked).is_ok() {
        return;
    }

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].kind, FailureKind::Io);
}
