//! Confirmed duplicate groups.
//!
//! # Overview
//!
//! A [`DuplicateGroup`] is what remains of a hash-stage bucket after the
//! final singleton filter: two or more files with identical size and
//! identical content digest, in discovery order. The first member is the
//! preserved copy; the rest are duplicates.
//!
//! Groups are immutable once built. Both script generators read the
//! same group without reshaping it.
//!
//! # Example
//!
//! ```
//! use dedupe::duplicates::DuplicateGroup;
//! use dedupe::scanner::FileEntry;
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let files = vec![
//!     FileEntry::new(PathBuf::from("/keep.txt"), 1024, SystemTime::now()),
//!     FileEntry::new(PathBuf::from("/copy1.txt"), 1024, SystemTime::now()),
//!     FileEntry::new(PathBuf::from("/copy2.txt"), 1024, SystemTime::now()),
//! ];
//!
//! let group = DuplicateGroup::new(0xabcd, 1024, files);
//! assert_eq!(group.redundant_bytes(), 2048);
//! assert_eq!(group.preserved().path, PathBuf::from("/keep.txt"));
//! assert_eq!(group.duplicates().len(), 2);
//! ```

use std::path::PathBuf;

use crate::scanner::{hash_to_hex, Digest, FileEntry};

/// Files proven byte-identical by size and content digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    /// Content digest shared by every member
    pub hash: Digest,
    /// File size in bytes shared by every member
    pub size: u64,
    /// Members in discovery order; the first is preserved
    pub files: Vec<FileEntry>,
    /// Discovery position of the preserved member
    pub position: usize,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    ///
    /// # Arguments
    ///
    /// * `hash` - Content digest shared by all files
    /// * `size` - File size in bytes
    /// * `files` - Members in discovery order
    #[must_use]
    pub fn new(hash: Digest, size: u64, files: Vec<FileEntry>) -> Self {
        Self {
            hash,
            size,
            files,
            position: 0,
        }
    }

    /// Set the discovery position used to order groups with equal savings.
    #[must_use]
    pub fn with_position(mut self, position: usize) -> Self {
        self.position = position;
        self
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The copy that remediation keeps: the first in discovery order.
    ///
    /// # Panics
    ///
    /// Panics if the group is empty. Groups built by the pipeline always
    /// hold at least two members.
    #[must_use]
    pub fn preserved(&self) -> &FileEntry {
        &self.files[0]
    }

    /// Every member except the preserved one.
    #[must_use]
    pub fn duplicates(&self) -> &[FileEntry] {
        self.files.get(1..).unwrap_or(&[])
    }

    /// Number of duplicate copies (excluding the preserved one).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Space recoverable by keeping exactly one copy: `size × (count − 1)`.
    #[must_use]
    pub fn redundant_bytes(&self) -> u64 {
        self.size.saturating_mul(self.duplicate_count() as u64)
    }

    /// Total bytes occupied by all members.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.size.saturating_mul(self.files.len() as u64)
    }

    /// Digest as 16 lower-case hex digits.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hash_to_hex(self.hash)
    }

    /// Paths of all members in discovery order.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }
}
