//! Prefix reader and streaming XXH64 file hasher.
//!
//! # Overview
//!
//! The [`Hasher`] provides the two content signals the pipeline needs:
//! the leading bytes of a file ([`Hasher::read_prefix`]) and a digest
//! of its whole content ([`Hasher::full_hash`]). Full hashing streams
//! the file in [`BLOCK_SIZE`] blocks so memory stays bounded.
//!
//! Every read is counted in [`HasherStats`] so callers can observe how
//! much I/O a run actually performed.

use std::fs::File;
use std::hash::Hasher as _;
use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use twox_hash::XxHash64;

use super::ReadError;

/// Full-content digest (XXH64, seed 0).
pub type Digest = u64;

/// Block size used when streaming file content through the hasher.
pub const BLOCK_SIZE: usize = 4096;

/// Default prefix length compared by the prefix stage.
pub const DEFAULT_PREFIX_BYTES: usize = 512;

/// Seed for XXH64.
const SEED: u64 = 0;

/// Render a digest as 16 lower-case hex digits.
#[must_use]
pub fn hash_to_hex(hash: Digest) -> String {
    format!("{hash:016x}")
}

/// Counters for the I/O performed by a [`Hasher`].
#[derive(Debug, Default)]
pub struct HasherStats {
    prefix_reads: AtomicU64,
    full_hashes: AtomicU64,
    bytes_hashed: AtomicU64,
}

impl HasherStats {
    /// Number of prefix reads started.
    #[must_use]
    pub fn prefix_reads(&self) -> u64 {
        self.prefix_reads.load(Ordering::Relaxed)
    }

    /// Number of full-content hashes started.
    #[must_use]
    pub fn full_hashes(&self) -> u64 {
        self.full_hashes.load(Ordering::Relaxed)
    }

    /// Total bytes streamed through the full-content hasher.
    #[must_use]
    pub fn bytes_hashed(&self) -> u64 {
        self.bytes_hashed.load(Ordering::Relaxed)
    }
}

/// Reads file prefixes and computes full-content digests.
///
/// A single `Hasher` is shared by all workers of a stage; it carries no
/// per-file state, only atomic counters.
#[derive(Debug, Default)]
pub struct Hasher {
    stats: HasherStats,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Hasher {
    /// Create a new hasher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Abort in-progress hashes between blocks once the flag is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// I/O counters for this hasher.
    #[must_use]
    pub fn stats(&self) -> &HasherStats {
        &self.stats
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Read up to `len` bytes from the start of the file.
    ///
    /// Returns fewer bytes only when the file is shorter than `len`.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError`] if the file cannot be opened or read.
    pub fn read_prefix(&self, path: &Path, len: usize) -> Result<Vec<u8>, ReadError> {
        self.stats.prefix_reads.fetch_add(1, Ordering::Relaxed);

        let file = File::open(path).map_err(|e| ReadError::from_io(path, e))?;
        let mut buffer = Vec::with_capacity(len);
        file.take(len as u64)
            .read_to_end(&mut buffer)
            .map_err(|e| ReadError::from_io(path, e))?;

        log::trace!("Read {} prefix bytes from {}", buffer.len(), path.display());
        Ok(buffer)
    }

    /// Hash the whole file content in [`BLOCK_SIZE`] blocks.
    ///
    /// An empty file yields the digest of the empty input.
    ///
    /// # Errors
    ///
    /// Returns [`ReadError`] if the file cannot be opened or read, or
    /// [`ReadError::Interrupted`] if shutdown was requested mid-file.
    pub fn full_hash(&self, path: &Path) -> Result<Digest, ReadError> {
        self.stats.full_hashes.fetch_add(1, Ordering::Relaxed);

        let mut file = File::open(path).map_err(|e| ReadError::from_io(path, e))?;
        let mut hasher = XxHash64::with_seed(SEED);
        let mut buffer = [0u8; BLOCK_SIZE];
        let mut total: u64 = 0;

        loop {
            if self.is_shutdown_requested() {
                return Err(ReadError::Interrupted(path.to_path_buf()));
            }

            let n = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ReadError::from_io(path, e)),
            };
            hasher.write(&buffer[..n]);
            total += n as u64;
        }

        self.stats.bytes_hashed.fetch_add(total, Ordering::Relaxed);
        let digest = hasher.finish();
        log::trace!(
            "Hashed {} ({} bytes): {}",
            path.display(),
            total,
            hash_to_hex(digest)
        );
        Ok(digest)
    }
}

/// Digest of an in-memory buffer, identical to [`Hasher::full_hash`] of
/// a file holding the same bytes.
#[must_use]
pub fn hash_bytes(data: &[u8]) -> Digest {
    let mut hasher = XxHash64::with_seed(SEED);
    hasher.write(data);
    hasher.finish()
}
