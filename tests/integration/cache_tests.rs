use dedupe::cache::HashCache;
use dedupe::duplicates::{DuplicateFinder, FinderConfig};
use filetime::FileTime;
use std::fs::{self, File};
use std::io::Write;
use std::sync::Arc;
use tempfile::tempdir;

fn scan(
    cache: &Arc<HashCache>,
    root: &std::path::Path,
) -> (
    Vec<dedupe::duplicates::DuplicateGroup>,
    dedupe::duplicates::ScanSummary,
    DuplicateFinder,
) {
    let finder = DuplicateFinder::new(FinderConfig::default().with_cache(cache.clone()));
    let (groups, summary) = finder.find_duplicates(&[root.to_path_buf()]).unwrap();
    (groups, summary, finder)
}

#[test]
fn test_cache_initial_scan_and_rescan() {
    let dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let cache = Arc::new(HashCache::open(&cache_dir.path().join("metadata.db")).unwrap());

    let content = b"duplicate content";
    File::create(dir.path().join("file1.txt"))
        .unwrap()
        .write_all(content)
        .unwrap();
    File::create(dir.path().join("file2.txt"))
        .unwrap()
        .write_all(content)
        .unwrap();

    let (groups, summary, finder) = scan(&cache, dir.path());
    assert_eq!(groups.len(), 1);
    assert_eq!(summary.store_hits, 0);
    assert_eq!(summary.store_misses, 2);
    assert_eq!(finder.hasher().stats().full_hashes(), 2);
    assert_eq!(cache.len().unwrap(), 2);

    let (groups2, summary2, finder2) = scan(&cache, dir.path());
    assert_eq!(groups2, groups);
    assert_eq!(summary2.store_hits, 2);
    assert_eq!(summary2.store_misses, 0);
    assert_eq!(finder2.hasher().stats().full_hashes(), 0);
    // The store never bypasses the cheaper stages
    assert_eq!(finder2.hasher().stats().prefix_reads(), 2);
}

#[test]
fn test_cache_invalidation_on_mtime_change() {
    let dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let cache = Arc::new(HashCache::open(&cache_dir.path().join("metadata.db")).unwrap());

    let file1 = dir.path().join("file1.txt");
    let file2 = dir.path().join("file2.txt");
    let original = vec![b'a'; 1000];
    let mut changed = original.clone();
    changed[999] = b'b';
    fs::write(&file1, &original).unwrap();
    fs::write(&file2, &original).unwrap();

    let (groups, _, _) = scan(&cache, dir.path());
    assert_eq!(groups.len(), 1);

    // Same size and prefix, different tail, new mtime
    fs::write(&file2, &changed).unwrap();
    filetime::set_file_mtime(&file2, FileTime::from_unix_time(1_000_000_000, 0)).unwrap();

    let (groups, summary, finder) = scan(&cache, dir.path());
    assert!(groups.is_empty());
    assert_eq!(summary.store_hits, 1);
    assert_eq!(summary.store_misses, 1);
    assert_eq!(finder.hasher().stats().full_hashes(), 1);
}

#[test]
fn test_cache_does_not_change_results() {
    let dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    for i in 0..4 {
        fs::write(dir.path().join(format!("copy{i}.bin")), [i as u8 % 2; 300]).unwrap();
    }
    fs::write(dir.path().join("solo.bin"), [9u8; 301]).unwrap();

    let (without, _) = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path().to_path_buf()])
        .unwrap();

    let cache = Arc::new(HashCache::open(&cache_dir.path().join("metadata.db")).unwrap());
    let (cold, _, _) = scan(&cache, dir.path());
    let (warm, _, _) = scan(&cache, dir.path());

    assert_eq!(without.len(), 2);
    assert_eq!(cold, without);
    assert_eq!(warm, without);
}

#[test]
fn test_cache_reopen_persists_entries() {
    let dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let db_path = cache_dir.path().join("metadata.db");
    fs::write(dir.path().join("a"), b"persisted").unwrap();
    fs::write(dir.path().join("b"), b"persisted").unwrap();

    {
        let cache = Arc::new(HashCache::open(&db_path).unwrap());
        scan(&cache, dir.path());
    }

    let cache = Arc::new(HashCache::open(&db_path).unwrap());
    let (_, summary, _) = scan(&cache, dir.path());
    assert_eq!(summary.store_hits, 2);
}

#[test]
fn test_cache_prune_and_clear() {
    let dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let cache = Arc::new(HashCache::open(&cache_dir.path().join("metadata.db")).unwrap());
    fs::write(dir.path().join("a"), b"prune me").unwrap();
    fs::write(dir.path().join("b"), b"prune me").unwrap();

    scan(&cache, dir.path());
    fs::remove_file(dir.path().join("b")).unwrap();

    assert_eq!(cache.prune().unwrap(), 1);
    assert_eq!(cache.len().unwrap(), 1);
    assert_eq!(cache.clear().unwrap(), 1);
    assert!(cache.is_empty().unwrap());
}

#[test]
fn test_unusable_cache_path_is_an_error_not_a_panic() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("file");
    fs::write(&blocker, b"not a directory").unwrap();

    let result = HashCache::open(&blocker.join("metadata.db"));
    assert!(result.is_err());
}

#[cfg(target_os = "linux")]
#[test]
fn test_non_utf8_names_never_share_a_stored_hash() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let dir = tempdir().unwrap();
    let cache_dir = tempdir().unwrap();
    let cache = Arc::new(HashCache::open(&cache_dir.path().join("metadata.db")).unwrap());

    let mtime = FileTime::from_unix_time(1_500_000_000, 0);
    for (name, tail) in [(&b"f\xff"[..], b"AAAA"), (&b"f\xfe"[..], b"BBBB")] {
        let path = dir.path().join(OsStr::from_bytes(name));
        let mut content = vec![b'z'; 1000];
        content.extend_from_slice(tail);
        fs::write(&path, &content).unwrap();
        filetime::set_file_mtime(&path, mtime).unwrap();
    }

    let finder = DuplicateFinder::new(
        FinderConfig::default()
            .with_io_threads(1)
            .with_cache(cache.clone()),
    );
    let root = [dir.path().to_path_buf()];

    let (groups, summary) = finder.find_duplicates(&root).unwrap();
    assert!(groups.is_empty());
    assert_eq!(summary.store_misses, 2);
    assert_eq!(cache.len().unwrap(), 2);

    // Each file is served its own digest on the warm run
    let (groups, summary) = finder.find_duplicates(&root).unwrap();
    assert!(groups.is_empty());
    assert_eq!(summary.store_hits, 2);
}
