//! Duplicate finder implementation with progressive, multi-stage detection.
//!
//! # Overview
//!
//! This module orchestrates the duplicate detection pipeline:
//! 1. **Walk**: collect files from every root ([`crate::scanner::Walker`])
//! 2. **Size stage**: partition by size, no I/O
//! 3. **Prefix stage**: partition survivors by size plus leading bytes
//! 4. **Hash stage**: partition survivors by size plus full-content digest
//!
//! Singleton buckets are pruned after every stage, so a file is only
//! prefix-read when another file shares its size, and only fully hashed
//! when another file shares its size and prefix.
//!
//! Key computation inside the prefix and hash stages runs on a bounded
//! rayon pool. Each stage collects every key before building its map, so
//! stages never overlap.
//!
//! # Example
//!
//! ```no_run
//! use dedupe::duplicates::{DuplicateFinder, FinderConfig};
//! use std::path::PathBuf;
//!
//! let config = FinderConfig::default().with_io_threads(4).with_min_size(1);
//! let finder = DuplicateFinder::new(config);
//!
//! let (groups, summary) = finder.find_duplicates(&[PathBuf::from(".")]).unwrap();
//! println!("{} groups, {} reclaimable", groups.len(), summary.reclaimable_display());
//! ```

use std::convert::Infallible;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::Serialize;

use super::partition::{partition_by, PartitionMap};
use super::signals::{hash_key, prefix_key, size_key, HashKey};
use super::DuplicateGroup;
use crate::cache::{CacheEntry, HashCache};
use crate::config::ConfigError;
use crate::progress::ProgressCallback;
use crate::scanner::{
    FileDescriptor, FileEntry, Hasher, ReadError, ScanError, Walker, WalkerConfig,
    DEFAULT_PREFIX_BYTES,
};

/// Progress phase name for directory walking.
pub const PHASE_WALK: &str = "walking";
/// Progress phase name for the prefix stage.
pub const PHASE_PREFIX: &str = "prefix";
/// Progress phase name for the full-hash stage.
pub const PHASE_HASH: &str = "fullhash";

/// Maximum number of failed paths kept as samples in a [`FailureSummary`].
pub const MAX_FAILURE_SAMPLES: usize = 10;

/// Pipeline stage in which a file failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Directory walk (stat of a discovered entry)
    Scan,
    /// Prefix read
    Prefix,
    /// Full-content hash
    Hash,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scan => write!(f, "scan"),
            Self::Prefix => write!(f, "prefix"),
            Self::Hash => write!(f, "hash"),
        }
    }
}

/// Kind of per-file failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The file vanished between discovery and access
    NotFound,
    /// Permission denied, read failure or device error
    Io,
}

/// One file dropped from the pipeline because it could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    /// Path of the file
    pub path: PathBuf,
    /// Stage that dropped it
    pub stage: Stage,
    /// Failure category
    pub kind: FailureKind,
    /// Human-readable error
    pub message: String,
}

impl FileFailure {
    fn from_scan(error: &ScanError) -> Self {
        Self {
            path: error.path().to_path_buf(),
            stage: Stage::Scan,
            kind: if error.is_not_found() {
                FailureKind::NotFound
            } else {
                FailureKind::Io
            },
            message: error.to_string(),
        }
    }

    fn from_read(stage: Stage, error: &ReadError) -> Self {
        Self {
            path: error.path().to_path_buf(),
            stage,
            kind: if error.is_not_found() {
                FailureKind::NotFound
            } else {
                FailureKind::Io
            },
            message: error.to_string(),
        }
    }
}

/// Aggregate of per-file failures, surfaced at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FailureSummary {
    /// Total failed files
    pub count: usize,
    /// Files that vanished
    pub not_found: usize,
    /// Files that could not be read
    pub io: usize,
    /// Up to [`MAX_FAILURE_SAMPLES`] representative paths
    pub samples: Vec<PathBuf>,
}

impl FailureSummary {
    /// Summarise a list of failures.
    #[must_use]
    pub fn from_failures(failures: &[FileFailure]) -> Self {
        let not_found = failures
            .iter()
            .filter(|f| f.kind == FailureKind::NotFound)
            .count();
        Self {
            count: failures.len(),
            not_found,
            io: failures.len() - not_found,
            samples: failures
                .iter()
                .take(MAX_FAILURE_SAMPLES)
                .map(|f| f.path.clone())
                .collect(),
        }
    }

    /// Whether any file failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Statistics for one partition stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StageStats {
    /// Files that entered the stage
    pub input_files: usize,
    /// Files dropped because their key could not be computed
    pub failed_files: usize,
    /// Files pruned as singletons (classified unique)
    pub unique_files: usize,
    /// Files that survived into the next stage
    pub candidate_files: usize,
    /// Non-singleton buckets after pruning
    pub buckets: usize,
    /// Wall-clock time spent in the stage
    #[serde(skip)]
    pub duration: Duration,
}

impl StageStats {
    /// Percentage of input files eliminated by this stage.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.input_files == 0 {
            0.0
        } else {
            let eliminated = self.input_files - self.candidate_files;
            (eliminated as f64 / self.input_files as f64) * 100.0
        }
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Canonical roots that were walked
    pub roots: Vec<PathBuf>,
    /// Regular files discovered by the walk
    pub files_discovered: usize,
    /// Files excluded by the minimum-size pre-filter
    pub skipped_by_min_size: usize,
    /// Size stage statistics
    pub size_stage: StageStats,
    /// Prefix stage statistics
    pub prefix_stage: StageStats,
    /// Full-hash stage statistics
    pub hash_stage: StageStats,
    /// Digests served by the metadata store
    pub store_hits: usize,
    /// Digests the metadata store could not serve
    pub store_misses: usize,
    /// Bytes streamed through the full-content hasher
    pub bytes_hashed: u64,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Duplicate copies (excluding preserved ones)
    pub duplicate_files: usize,
    /// Total space recoverable by removing duplicates
    pub reclaimable_space: u64,
    /// Duration of the entire scan
    pub scan_duration: Duration,
    /// Every per-file failure, in the order encountered
    pub failures: Vec<FileFailure>,
}

impl ScanSummary {
    /// Files classified unique across all stages.
    #[must_use]
    pub fn unique_files(&self) -> usize {
        self.size_stage.unique_files + self.prefix_stage.unique_files + self.hash_stage.unique_files
    }

    /// Number of files dropped by failures.
    #[must_use]
    pub fn failed_files(&self) -> usize {
        self.failures.len()
    }

    /// Aggregated failure counts and sample paths.
    #[must_use]
    pub fn failure_summary(&self) -> FailureSummary {
        FailureSummary::from_failures(&self.failures)
    }

    /// Reclaimable space as a human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        bytesize::ByteSize::b(self.reclaimable_space).to_string()
    }
}

/// Errors that abort a duplicate scan.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// No root paths were given.
    #[error("No paths to scan")]
    NoRoots,

    /// The finder configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The worker pool could not be created.
    #[error("Failed to create worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl FinderError {
    /// Whether this is a configuration-level failure.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::PathNotFound(_) | Self::NotADirectory(_) | Self::NoRoots | Self::Config(_)
        )
    }
}

/// Configuration for the duplicate finder.
///
/// This is the per-run context: everything the pipeline needs is carried
/// here rather than read from ambient state.
#[derive(Clone)]
pub struct FinderConfig {
    /// Leading bytes compared by the prefix stage.
    pub prefix_bytes: usize,
    /// Files smaller than this are excluded before the size stage.
    pub min_size: u64,
    /// Number of I/O threads for prefix reads and hashing.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional metadata store for faster rescans.
    pub cache: Option<Arc<HashCache>>,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("prefix_bytes", &self.prefix_bytes)
            .field("min_size", &self.min_size)
            .field("io_threads", &self.io_threads)
            .field("walker_config", &self.walker_config)
            .field("cache", &self.cache.as_ref().map(|_| "<cache>"))
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            prefix_bytes: DEFAULT_PREFIX_BYTES,
            min_size: 0,
            io_threads: 4,
            walker_config: WalkerConfig::default(),
            cache: None,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the prefix length compared by the prefix stage.
    #[must_use]
    pub fn with_prefix_bytes(mut self, bytes: usize) -> Self {
        self.prefix_bytes = bytes;
        self
    }

    /// Set the minimum file size pre-filter.
    #[must_use]
    pub fn with_min_size(mut self, bytes: u64) -> Self {
        self.min_size = bytes;
        self
    }

    /// Set the I/O thread count.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the metadata store.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<HashCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Reject settings the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a zero prefix length or thread count.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix_bytes == 0 {
            return Err(ConfigError::InvalidPrefixLength(self.prefix_bytes));
        }
        if self.io_threads == 0 {
            return Err(ConfigError::InvalidIoThreads(self.io_threads));
        }
        Ok(())
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Duplicate finder that orchestrates the progressive detection pipeline.
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Arc<Hasher>,
}

impl std::fmt::Debug for DuplicateFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplicateFinder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let mut hasher = Hasher::new();
        if let Some(ref flag) = config.shutdown_flag {
            hasher = hasher.with_shutdown_flag(flag.clone());
        }
        Self {
            config,
            hasher: Arc::new(hasher),
        }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The hasher used by this finder, exposing its I/O counters.
    #[must_use]
    pub fn hasher(&self) -> &Hasher {
        &self.hasher
    }

    /// Find all duplicate files beneath the given roots.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - No roots are given, or a root does not exist or is not a directory
    /// - The configuration is invalid
    /// - The scan is interrupted by shutdown signal
    ///
    /// Unreadable or vanishing files are never fatal; they are recorded in
    /// [`ScanSummary::failures`].
    pub fn find_duplicates(
        &self,
        roots: &[PathBuf],
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        self.config.validate()?;
        let roots = resolve_roots(roots)?;

        let mut summary = ScanSummary {
            roots: roots.clone(),
            ..Default::default()
        };

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        for root in &roots {
            log::info!("Starting duplicate scan of {}", root.display());
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(PHASE_WALK, 0);
        }

        let mut walker = Walker::new(roots, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(flag.clone());
        }

        let mut files = Vec::new();
        for result in walker.walk() {
            match result {
                Ok(file) => {
                    if let Some(ref callback) = self.config.progress_callback {
                        callback.on_progress(files.len() + 1, &file.path.to_string_lossy());
                    }
                    files.push(file);
                }
                Err(e) => summary.failures.push(FileFailure::from_scan(&e)),
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(PHASE_WALK);
        }

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        summary.files_discovered = files.len();
        log::info!(
            "Found {} files ({} total)",
            files.len(),
            bytesize::ByteSize::b(files.iter().map(|f| f.size).sum::<u64>())
        );

        let groups = self.run_pipeline(files, &mut summary)?;
        summary.scan_duration = start_time.elapsed();
        Ok((groups, summary))
    }

    /// Find duplicates among a pre-collected list of files.
    ///
    /// The list order is taken as discovery order.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if the configuration is invalid or the scan is
    /// interrupted.
    pub fn find_duplicates_from_files(
        &self,
        files: Vec<FileEntry>,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        let start_time = Instant::now();
        self.config.validate()?;

        let mut summary = ScanSummary {
            files_discovered: files.len(),
            ..Default::default()
        };

        let groups = self.run_pipeline(files, &mut summary)?;
        summary.scan_duration = start_time.elapsed();
        Ok((groups, summary))
    }

    /// Size, prefix and hash stages over a discovered population.
    fn run_pipeline(
        &self,
        files: Vec<FileEntry>,
        summary: &mut ScanSummary,
    ) -> Result<Vec<DuplicateGroup>, FinderError> {
        let min_size = self.config.min_size;
        let population: Vec<FileDescriptor> = files
            .into_iter()
            .filter(|f| {
                let keep = f.size >= min_size;
                if !keep {
                    log::trace!("Below minimum size: {}", f.path.display());
                }
                keep
            })
            .enumerate()
            .map(|(position, entry)| FileDescriptor::new(entry).with_position(position))
            .collect();
        summary.skipped_by_min_size = summary.files_discovered - population.len();

        // Size stage
        let stage_start = Instant::now();
        let input_files = population.len();
        let (size_map, _) = partition_by(population, |d| Ok::<_, Infallible>(size_key(d)));
        let (size_map, unique) = size_map.split_singletons();
        summary.size_stage = StageStats {
            input_files,
            failed_files: 0,
            unique_files: unique.len(),
            candidate_files: size_map.member_count(),
            buckets: size_map.len(),
            duration: stage_start.elapsed(),
        };
        log_stage("Size", &summary.size_stage);

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }
        if size_map.is_empty() {
            log::info!("No potential duplicates found after size grouping");
            return Ok(Vec::new());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads)
            .build()?;

        // Prefix stage
        let stage_start = Instant::now();
        let candidates = size_map.into_descriptors();
        let input_files = candidates.len();
        let prefix_bytes = self.config.prefix_bytes;
        let keyed = self.compute_keys(&pool, PHASE_PREFIX, candidates, |d| {
            prefix_key(d, &self.hasher, prefix_bytes)
        });
        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }
        let (prefix_map, failures) = PartitionMap::from_keyed(keyed);
        let failed_files = failures.len();
        record_failures(summary, Stage::Prefix, failures);
        let (prefix_map, unique) = prefix_map.split_singletons();
        summary.prefix_stage = StageStats {
            input_files,
            failed_files,
            unique_files: unique.len(),
            candidate_files: prefix_map.member_count(),
            buckets: prefix_map.len(),
            duration: stage_start.elapsed(),
        };
        log_stage("Prefix", &summary.prefix_stage);

        if prefix_map.is_empty() {
            log::info!("No potential duplicates found after prefix comparison");
            return Ok(Vec::new());
        }

        // Hash stage
        let stage_start = Instant::now();
        let candidates = prefix_map.into_descriptors();
        let input_files = candidates.len();
        let store_hits = AtomicUsize::new(0);
        let store_misses = AtomicUsize::new(0);
        let bytes_before = self.hasher.stats().bytes_hashed();
        let keyed = self.compute_keys(&pool, PHASE_HASH, candidates, |d| {
            self.hash_key_with_store(d, &store_hits, &store_misses)
        });
        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }
        let (hash_map, failures) = PartitionMap::from_keyed(keyed);
        let failed_files = failures.len();
        record_failures(summary, Stage::Hash, failures);
        let (hash_map, unique) = hash_map.split_singletons();
        summary.hash_stage = StageStats {
            input_files,
            failed_files,
            unique_files: unique.len(),
            candidate_files: hash_map.member_count(),
            buckets: hash_map.len(),
            duration: stage_start.elapsed(),
        };
        summary.store_hits = store_hits.into_inner();
        summary.store_misses = store_misses.into_inner();
        summary.bytes_hashed = self.hasher.stats().bytes_hashed() - bytes_before;
        log_stage("Hash", &summary.hash_stage);

        let mut groups: Vec<DuplicateGroup> = hash_map
            .into_buckets()
            .into_iter()
            .map(|((size, hash), members)| build_group((size, hash), members))
            .collect();
        groups.sort_by_key(|g| g.position);

        summary.duplicate_groups = groups.len();
        summary.duplicate_files = groups.iter().map(DuplicateGroup::duplicate_count).sum();
        summary.reclaimable_space = groups
            .iter()
            .fold(0u64, |acc, g| acc.saturating_add(g.redundant_bytes()));

        log::info!(
            "Scan complete: {} duplicate groups, {} duplicate files, {} reclaimable, {} store hits",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display(),
            summary.store_hits
        );
        if !summary.failures.is_empty() {
            log::warn!("{} files could not be read", summary.failures.len());
        }

        Ok(groups)
    }

    /// Compute one key per descriptor on the worker pool.
    ///
    /// Results come back in input order. Once shutdown is requested no new
    /// reads start; remaining descriptors report [`ReadError::Interrupted`].
    fn compute_keys<K, F>(
        &self,
        pool: &rayon::ThreadPool,
        phase: &str,
        population: Vec<FileDescriptor>,
        key_fn: F,
    ) -> Vec<(FileDescriptor, Result<K, ReadError>)>
    where
        K: Send,
        F: Fn(&FileDescriptor) -> Result<K, ReadError> + Sync,
    {
        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start(phase, population.len());
        }
        log::info!("Stage {}: processing {} files", phase, population.len());

        let processed = AtomicUsize::new(0);
        let results = pool.install(|| {
            population
                .into_par_iter()
                .map(|descriptor| {
                    if self.config.is_shutdown_requested() {
                        let path = descriptor.path().to_path_buf();
                        return (descriptor, Err(ReadError::Interrupted(path)));
                    }

                    let key = key_fn(&descriptor);
                    if let Err(ref e) = key {
                        log::warn!("Failed to read {}: {}", descriptor.path().display(), e);
                    }

                    if let Some(ref callback) = self.config.progress_callback {
                        let current = processed.fetch_add(1, Ordering::Relaxed) + 1;
                        callback.on_progress(current, &descriptor.path().to_string_lossy());
                        callback.on_item_completed(descriptor.size());
                    }
                    (descriptor, key)
                })
                .collect()
        });

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end(phase);
        }
        results
    }

    /// Hash key, consulting and updating the metadata store when present.
    fn hash_key_with_store(
        &self,
        descriptor: &FileDescriptor,
        hits: &AtomicUsize,
        misses: &AtomicUsize,
    ) -> Result<HashKey, ReadError> {
        let Some(ref cache) = self.config.cache else {
            return hash_key(descriptor, &self.hasher);
        };

        match cache.get_hash(descriptor.path(), descriptor.size(), descriptor.modified()) {
            Ok(Some(hash)) => {
                log::trace!("Store hit: {}", descriptor.path().display());
                hits.fetch_add(1, Ordering::Relaxed);
                descriptor.set_content_hash(hash);
                return hash_key(descriptor, &self.hasher);
            }
            Ok(None) => {
                log::trace!("Store miss: {}", descriptor.path().display());
            }
            Err(e) => {
                log::warn!(
                    "Failed to query store for {}: {}",
                    descriptor.path().display(),
                    e
                );
            }
        }
        misses.fetch_add(1, Ordering::Relaxed);

        let key = hash_key(descriptor, &self.hasher)?;
        if let Err(e) = cache.insert_hash(&CacheEntry::new(descriptor, key.1)) {
            log::warn!(
                "Failed to update store for {}: {}",
                descriptor.path().display(),
                e
            );
        }
        Ok(key)
    }
}

/// Validate, canonicalise and de-duplicate root paths, keeping their order.
fn resolve_roots(roots: &[PathBuf]) -> Result<Vec<PathBuf>, FinderError> {
    if roots.is_empty() {
        return Err(FinderError::NoRoots);
    }

    let mut resolved: Vec<PathBuf> = Vec::with_capacity(roots.len());
    for root in roots {
        let canonical = root
            .canonicalize()
            .map_err(|_| FinderError::PathNotFound(root.clone()))?;
        if !canonical.is_dir() {
            return Err(FinderError::NotADirectory(root.clone()));
        }
        if !resolved.contains(&canonical) {
            resolved.push(canonical);
        }
    }
    Ok(resolved)
}

fn record_failures(
    summary: &mut ScanSummary,
    stage: Stage,
    failures: Vec<(FileDescriptor, ReadError)>,
) {
    summary.failures.extend(
        failures
            .iter()
            .map(|(_, error)| FileFailure::from_read(stage, error)),
    );
}

fn build_group((size, hash): HashKey, members: Vec<FileDescriptor>) -> DuplicateGroup {
    let position = members.first().map_or(0, FileDescriptor::position);
    let files = members.iter().map(|d| d.entry().clone()).collect();
    log::debug!(
        "Duplicate group {}: {} files of {} bytes",
        crate::scanner::hash_to_hex(hash),
        members.len(),
        size
    );
    DuplicateGroup::new(hash, size, files).with_position(position)
}

fn log_stage(name: &str, stats: &StageStats) {
    log::info!(
        "{} stage complete: {} → {} files ({:.1}% eliminated, {} failed)",
        name,
        stats.input_files,
        stats.candidate_files,
        stats.elimination_rate(),
        stats.failed_files
    );
}
