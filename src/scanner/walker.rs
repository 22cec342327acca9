//! Directory walker implementation using jwalk.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing one or more
//! root directories and collecting the `(path, size)` population the
//! duplicate pipeline consumes.
//!
//! # Features
//!
//! - Multiple roots, walked in the order given
//! - Reproducible discovery order (directory children sorted by name)
//! - Nested or repeated roots never yield a path twice
//! - Symbolic links are neither followed nor yielded
//! - Zero-byte files are kept (they are duplicates of each other)
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use dedupe::scanner::{Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let roots = vec![PathBuf::from("/home/user/Downloads"), PathBuf::from("/mnt/backup")];
//! let walker = Walker::new(roots, WalkerConfig::default());
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} files", files.len());
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use jwalk::WalkDir;

use super::{FileEntry, ScanError, WalkerConfig};

/// Directory walker for file discovery across several roots.
#[derive(Debug)]
pub struct Walker {
    /// Root paths to walk, in order
    roots: Vec<PathBuf>,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker over the given roots.
    ///
    /// Roots are expected to be canonical directories; the pipeline
    /// driver validates and canonicalises them before walking.
    #[must_use]
    pub fn new(roots: Vec<PathBuf>, config: WalkerConfig) -> Self {
        Self {
            roots,
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Roots that are not contained in an earlier root.
    fn effective_roots(&self) -> Vec<&Path> {
        let mut kept: Vec<&Path> = Vec::with_capacity(self.roots.len());
        for root in &self.roots {
            if let Some(outer) = kept.iter().find(|k| root.starts_with(k)) {
                log::debug!(
                    "Skipping root {} (already covered by {})",
                    root.display(),
                    outer.display()
                );
                continue;
            }
            kept.push(root);
        }
        kept
    }

    /// Walk every root, yielding file entries in discovery order.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. Each path is yielded at most once.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let mut seen: HashSet<PathBuf> = HashSet::new();

        self.effective_roots()
            .into_iter()
            .flat_map(move |root| self.walk_root(root))
            .filter(move |result| match result {
                Ok(entry) => seen.insert(entry.path.clone()),
                Err(_) => true,
            })
    }

    /// Walk a single root.
    fn walk_root<'a>(
        &'a self,
        root: &'a Path,
    ) -> impl Iterator<Item = Result<FileEntry, ScanError>> + 'a {
        log::debug!("Walking {}", root.display());

        let walk_dir = WalkDir::new(root)
            .follow_links(false)
            .skip_hidden(self.config.skip_hidden)
            .process_read_dir(|_depth, _path, _read_dir_state, children| {
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        walk_dir
            .into_iter()
            .take_while(move |_| {
                let stop = self.is_shutdown_requested();
                if stop {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                }
                !stop
            })
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    if entry.depth == 0 {
                        return None;
                    }

                    let file_type = entry.file_type();
                    if file_type.is_dir() {
                        return None;
                    }

                    let path = entry.path();
                    if file_type.is_symlink() {
                        log::trace!("Skipping symlink: {}", path.display());
                        return None;
                    }

                    Self::stat_file(path)
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| root.to_path_buf(), std::borrow::ToOwned::to_owned);
                    Some(Self::handle_jwalk_error(path, &e))
                }
            })
    }

    /// Stat a discovered path and build its [`FileEntry`].
    fn stat_file(path: PathBuf) -> Option<Result<FileEntry, ScanError>> {
        let metadata = match std::fs::symlink_metadata(&path) {
            Ok(m) => m,
            Err(e) => return Some(Err(Self::handle_io_error(&path, e))),
        };

        // Sockets, FIFOs and device nodes are not candidates
        if !metadata.is_file() {
            log::trace!("Skipping non-regular file: {}", path.display());
            return None;
        }

        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        log::trace!("Found {} ({} bytes)", path.display(), metadata.len());

        Some(Ok(FileEntry::new(path, metadata.len(), modified)))
    }

    /// Handle I/O errors during file access.
    fn handle_io_error(path: &Path, error: std::io::Error) -> ScanError {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => {
                log::warn!("Permission denied: {}", path.display());
                ScanError::PermissionDenied(path.to_path_buf())
            }
            ErrorKind::NotFound => {
                log::debug!("File not found (may have been deleted): {}", path.display());
                ScanError::NotFound(path.to_path_buf())
            }
            _ => {
                log::warn!("I/O error for {}: {}", path.display(), error);
                ScanError::Io {
                    path: path.to_path_buf(),
                    source: error,
                }
            }
        }
    }

    /// Handle jwalk errors.
    fn handle_jwalk_error(path: PathBuf, error: &jwalk::Error) -> Result<FileEntry, ScanError> {
        log::warn!("Walker error for {}: {}", path.display(), error);
        Err(ScanError::Io {
            path,
            source: std::io::Error::other(error.to_string()),
        })
    }
}
