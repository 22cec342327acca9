//! Key functions for the three pipeline stages.
//!
//! Ordered from cheapest to most expensive:
//!
//! 1. [`size_key`] - metadata only, no I/O
//! 2. [`prefix_key`] - reads the first *k* bytes
//! 3. [`hash_key`] - streams the whole file
//!
//! Compound keys always lead with the size, so buckets of different
//! sizes can never merge even if a prefix or digest coincides.

use crate::scanner::{Digest, FileDescriptor, Hasher, ReadError};

/// Key for the size stage.
pub type SizeKey = u64;

/// Key for the prefix stage: size plus leading bytes.
pub type PrefixKey = (u64, Vec<u8>);

/// Key for the full-hash stage: size plus content digest.
pub type HashKey = (u64, Digest);

/// Size captured at discovery.
#[must_use]
pub fn size_key(descriptor: &FileDescriptor) -> SizeKey {
    descriptor.size()
}

/// Size plus the first `prefix_bytes` bytes.
///
/// # Errors
///
/// Returns [`ReadError`] if the prefix cannot be read.
pub fn prefix_key(
    descriptor: &FileDescriptor,
    hasher: &Hasher,
    prefix_bytes: usize,
) -> Result<PrefixKey, ReadError> {
    let prefix = descriptor.prefix(hasher, prefix_bytes)?;
    Ok((descriptor.size(), prefix.to_vec()))
}

/// Size plus the full-content digest.
///
/// # Errors
///
/// Returns [`ReadError`] if the content cannot be read.
pub fn hash_key(descriptor: &FileDescriptor, hasher: &Hasher) -> Result<HashKey, ReadError> {
    Ok((descriptor.size(), descriptor.content_hash(hasher)?))
}
