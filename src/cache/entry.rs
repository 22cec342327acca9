//! Cache entry definitions.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::scanner::{Digest, FileDescriptor};

/// A single row of the metadata store.
///
/// `size` and `mtime_ns` are the validation key: a stored digest is only
/// trusted while both still match the file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Absolute path (primary key)
    pub path: PathBuf,
    /// File size in bytes when hashed
    pub size: u64,
    /// Modification time in nanoseconds since the Unix epoch
    pub mtime_ns: i64,
    /// Full-content digest
    pub content_hash: Digest,
}

impl CacheEntry {
    /// Build an entry for a descriptor whose digest has been computed.
    #[must_use]
    pub fn new(descriptor: &FileDescriptor, content_hash: Digest) -> Self {
        Self {
            path: descriptor.path().to_path_buf(),
            size: descriptor.size(),
            mtime_ns: mtime_to_nanos(descriptor.modified()),
            content_hash,
        }
    }

    /// Whether this entry still describes a file with the given size and mtime.
    #[must_use]
    pub fn is_valid_for(&self, size: u64, modified: SystemTime) -> bool {
        self.size == size && self.mtime_ns == mtime_to_nanos(modified)
    }
}

/// Convert a modification time to signed nanoseconds since the epoch.
///
/// Times before the epoch map to negative values; out-of-range values saturate.
#[must_use]
pub fn mtime_to_nanos(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_nanos()).unwrap_or(i64::MAX),
        Err(before) => i64::try_from(before.duration().as_nanos()).map_or(i64::MIN, |n| -n),
    }
}
