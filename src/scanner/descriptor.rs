//! Per-file descriptor with memoised content signals.
//!
//! A [`FileDescriptor`] is created for every discovered file and carries
//! it through the pipeline. The prefix and content hash are computed on
//! first request and then cached for the rest of the run. Memoised values
//! are never invalidated; a new run rescans from scratch. Failed reads are
//! not memoised.

use std::path::Path;
use std::sync::OnceLock;
use std::time::SystemTime;

use super::{Digest, FileEntry, Hasher, ReadError};

/// Identity plus lazily computed content signals for one file.
#[derive(Debug, Clone)]
pub struct FileDescriptor {
    entry: FileEntry,
    position: usize,
    prefix: OnceLock<Vec<u8>>,
    content_hash: OnceLock<Digest>,
}

impl FileDescriptor {
    /// Wrap a discovered file.
    #[must_use]
    pub fn new(entry: FileEntry) -> Self {
        Self {
            entry,
            position: 0,
            prefix: OnceLock::new(),
            content_hash: OnceLock::new(),
        }
    }

    /// Set the discovery position used for ordering ties.
    #[must_use]
    pub fn with_position(mut self, position: usize) -> Self {
        self.position = position;
        self
    }

    /// Index of this file in discovery order.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Absolute path of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.entry.path
    }

    /// Size captured at discovery time. Never re-read.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.entry.size
    }

    /// Modification time captured at discovery time.
    #[must_use]
    pub fn modified(&self) -> SystemTime {
        self.entry.modified
    }

    /// The underlying scanner entry.
    #[must_use]
    pub fn entry(&self) -> &FileEntry {
        &self.entry
    }

    /// First `min(len, size)` bytes of the file, read once.
    ///
    /// A request for a different length than the memoised one is served
    /// by a fresh read and leaves the memo untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError`] if the file cannot be read.
    pub fn prefix(&self, hasher: &Hasher, len: usize) -> Result<&[u8], ReadError> {
        let expected = self.expected_prefix_len(len);
        if let Some(cached) = self.prefix.get() {
            if cached.len() == expected {
                return Ok(cached);
            }
            log::debug!(
                "Prefix length {} differs from memoised {} for {}",
                expected,
                cached.len(),
                self.path().display()
            );
        }

        let bytes = hasher.read_prefix(self.path(), len)?;
        if bytes.len() != expected {
            log::debug!(
                "{} changed size since discovery ({} prefix bytes, expected {})",
                self.path().display(),
                bytes.len(),
                expected
            );
        }
        Ok(self.prefix.get_or_init(|| bytes))
    }

    /// Full-content digest, computed once.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError`] if the file cannot be read.
    pub fn content_hash(&self, hasher: &Hasher) -> Result<Digest, ReadError> {
        if let Some(hash) = self.content_hash.get() {
            return Ok(*hash);
        }
        let hash = hasher.full_hash(self.path())?;
        Ok(*self.content_hash.get_or_init(|| hash))
    }

    /// Record a digest obtained elsewhere (the metadata store).
    ///
    /// Has no effect if a digest is already memoised.
    pub fn set_content_hash(&self, hash: Digest) {
        let _ = self.content_hash.set(hash);
    }

    /// Memoised prefix, if one has been read.
    #[must_use]
    pub fn cached_prefix(&self) -> Option<&[u8]> {
        self.prefix.get().map(Vec::as_slice)
    }

    /// Memoised digest, if one has been computed.
    #[must_use]
    pub fn cached_content_hash(&self) -> Option<Digest> {
        self.content_hash.get().copied()
    }

    fn expected_prefix_len(&self, len: usize) -> usize {
        usize::try_from(self.entry.size).map_or(len, |size| size.min(len))
    }
}

impl From<FileEntry> for FileDescriptor {
    fn from(entry: FileEntry) -> Self {
        Self::new(entry)
    }
}
