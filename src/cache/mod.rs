//! Metadata store for dedupe.
//!
//! This module provides persistent storage for full-content digests so
//! that later runs can skip re-hashing unchanged files.
//!
//! # Architecture
//!
//! * [`database`]: SQLite persistence, schema versioning and maintenance.
//! * [`entry`]: The stored row and its validation logic.
//!
//! # Invalidation
//!
//! Rows are keyed by absolute path and validated by file size and
//! modification time. If either changed, the row is treated as a miss and
//! overwritten after the file is hashed again.
//!
//! The store is strictly an optimisation. The pipeline only consults it
//! in the full-hash stage, and any store failure degrades to a miss.

pub mod database;
pub mod entry;

pub use database::{CacheError, CacheResult, HashCache};
pub use entry::CacheEntry;
