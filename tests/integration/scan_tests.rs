use dedupe::duplicates::{DuplicateFinder, FinderConfig};
use dedupe::scanner::{hash_bytes, WalkerConfig};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    File::create(&path).unwrap().write_all(content).unwrap();
    path.canonicalize().unwrap()
}

#[test]
fn test_scan_empty_directory() {
    let dir = tempdir().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.files_discovered, 0);
    assert_eq!(summary.duplicate_groups, 0);
    assert_eq!(summary.reclaimable_space, 0);
}

#[test]
fn test_scan_unique_sizes_stop_after_size_stage() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"1");
    write(dir.path(), "b.txt", b"22");
    write(dir.path(), "c.txt", b"333");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.size_stage.unique_files, 3);
    assert_eq!(summary.prefix_stage.input_files, 0);
    assert_eq!(finder.hasher().stats().prefix_reads(), 0);
    assert_eq!(finder.hasher().stats().full_hashes(), 0);
}

#[test]
fn test_scan_four_file_scenario() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a", b"X");
    let b = write(dir.path(), "b", b"X");
    write(dir.path(), "c", b"XY");
    write(dir.path(), "d", b"Y");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].paths(), vec![a, b]);
    assert_eq!(groups[0].redundant_bytes(), 1);
    assert_eq!(groups[0].hash, hash_bytes(b"X"));

    assert_eq!(summary.size_stage.unique_files, 1);
    assert_eq!(summary.prefix_stage.unique_files, 1);
    assert_eq!(summary.unique_files(), 2);
    // c is never read; d is read for its prefix but never hashed
    assert_eq!(finder.hasher().stats().prefix_reads(), 3);
    assert_eq!(finder.hasher().stats().full_hashes(), 2);
}

#[test]
fn test_scan_zero_byte_files_are_duplicates() {
    let dir = tempdir().unwrap();
    write(dir.path(), "empty1", b"");
    write(dir.path(), "empty2", b"");

    let finder = DuplicateFinder::with_defaults();
    let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
    assert_eq!(groups[0].redundant_bytes(), 0);
    assert_eq!(summary.reclaimable_space, 0);
}

#[test]
fn test_scan_nested_directories() {
    let dir = tempdir().unwrap();
    write(dir.path(), "top.txt", b"nested duplicate");
    write(dir.path(), "one/two/three/deep.txt", b"nested duplicate");

    let finder = DuplicateFinder::with_defaults();
    let (groups, _) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
}

#[test]
fn test_scan_shared_prefix_different_tail() {
    let dir = tempdir().unwrap();
    let mut left = vec![b'z'; 4096];
    let mut right = left.clone();
    left[4000] = b'1';
    right[4000] = b'2';
    write(dir.path(), "left.bin", &left);
    write(dir.path(), "right.bin", &right);

    let finder = DuplicateFinder::new(FinderConfig::default().with_prefix_bytes(512));
    let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.prefix_stage.candidate_files, 2);
    assert_eq!(summary.hash_stage.unique_files, 2);
}

#[test]
fn test_scan_min_size_filter() {
    let dir = tempdir().unwrap();
    write(dir.path(), "small1", b"ab");
    write(dir.path(), "small2", b"ab");
    write(dir.path(), "large1", &[7u8; 2048]);
    write(dir.path(), "large2", &[7u8; 2048]);

    let finder = DuplicateFinder::new(FinderConfig::default().with_min_size(1024));
    let (groups, summary) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].size, 2048);
    assert_eq!(summary.skipped_by_min_size, 2);
    assert_eq!(summary.files_discovered, 4);
}

#[test]
fn test_scan_skip_hidden() {
    let dir = tempdir().unwrap();
    write(dir.path(), "visible.txt", b"same bytes");
    write(dir.path(), ".hidden.txt", b"same bytes");

    let config = FinderConfig::default().with_walker_config(WalkerConfig { skip_hidden: true });
    let (groups, summary) = DuplicateFinder::new(config)
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.files_discovered, 1);
}

#[test]
fn test_scan_groups_in_discovery_order() {
    let dir = tempdir().unwrap();
    let a1 = write(dir.path(), "a1", b"second content!");
    write(dir.path(), "a2", b"second content!");
    let b1 = write(dir.path(), "b1", b"first");
    write(dir.path(), "b2", b"first");

    let finder = DuplicateFinder::with_defaults();
    let (groups, _) = finder.find_duplicates(&[dir.path().to_path_buf()]).unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].preserved().path, a1);
    assert_eq!(groups[1].preserved().path, b1);
}

#[test]
fn test_scan_is_reproducible() {
    let dir = tempdir().unwrap();
    for i in 0..5 {
        write(dir.path(), &format!("d{i}/copy.txt"), b"repeated");
        write(dir.path(), &format!("d{i}/other{i}.txt"), format!("unique {i}").as_bytes());
    }

    let roots = [dir.path().to_path_buf()];
    let (first, _) = DuplicateFinder::with_defaults().find_duplicates(&roots).unwrap();
    let (second, _) = DuplicateFinder::with_defaults().find_duplicates(&roots).unwrap();

    assert_eq!(first, second);
}

#[cfg(unix)]
#[test]
fn test_scan_ignores_symlinks() {
    let dir = tempdir().unwrap();
    let target = write(dir.path(), "target.txt", b"linked content");
    std::os::unix::fs::symlink(&target, dir.path().join("link.txt")).unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert!(groups.is_empty());
    assert_eq!(summary.files_discovered, 1);
}

#[cfg(unix)]
#[test]
fn test_scan_reports_existing_hardlinks_as_duplicates() {
    let dir = tempdir().unwrap();
    let original = write(dir.path(), "original.txt", b"linked bytes");
    fs::hard_link(&original, dir.path().join("zz_link.txt")).unwrap();

    let (groups, _) = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].preserved().path, original);
}
