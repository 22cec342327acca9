//! JSON report for scripting and automation.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "groups": [
//!     {
//!       "redundant_bytes": 2048,
//!       "size": 1024,
//!       "hash": "5e8f2a1c03b7d94e",
//!       "preserved": "/photos/a.jpg",
//!       "duplicates": ["/photos/copy of a.jpg", "/backup/a.jpg"],
//!       "files": ["/photos/a.jpg", "/photos/copy of a.jpg", "/backup/a.jpg"]
//!     }
//!   ],
//!   "total_potential_savings": 2048,
//!   "summary": {
//!     "roots": ["/photos", "/backup"],
//!     "files_discovered": 120,
//!     "duplicate_groups": 1,
//!     "duplicate_files": 2,
//!     "reclaimable_space": 2048,
//!     "scan_duration_ms": 35,
//!     "stages": { "size": { ... }, "prefix": { ... }, "hash": { ... } },
//!     "failures": { "count": 0, "not_found": 0, "io": 0, "samples": [] }
//!   }
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::duplicates::{FailureSummary, RankedEntry, SavingsReport, ScanSummary, StageStats};

/// One ranked group.
#[derive(Debug, Clone, Serialize)]
pub struct JsonGroup {
    /// Bytes recovered by removing every duplicate
    pub redundant_bytes: u64,
    /// Size of each member in bytes
    pub size: u64,
    /// XXH64 digest as 16 hex digits
    pub hash: String,
    /// Copy that remediation keeps
    pub preserved: String,
    /// Copies that remediation removes or links
    pub duplicates: Vec<String>,
    /// Every member, preserved copy first
    pub files: Vec<String>,
}

impl From<&RankedEntry> for JsonGroup {
    fn from(entry: &RankedEntry) -> Self {
        let files: Vec<String> = entry
            .group
            .files
            .iter()
            .map(|f| f.path.to_string_lossy().into_owned())
            .collect();
        Self {
            redundant_bytes: entry.redundant_bytes,
            size: entry.group.size,
            hash: entry.group.hash_hex(),
            preserved: files.first().cloned().unwrap_or_default(),
            duplicates: files.iter().skip(1).cloned().collect(),
            files,
        }
    }
}

/// Per-stage statistics.
#[derive(Debug, Clone, Serialize)]
pub struct JsonStages {
    /// Size stage
    pub size: StageStats,
    /// Prefix stage
    pub prefix: StageStats,
    /// Full-hash stage
    pub hash: StageStats,
}

/// Run statistics.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Canonical roots that were scanned
    pub roots: Vec<String>,
    /// Regular files found by the walk
    pub files_discovered: usize,
    /// Files below the minimum size
    pub skipped_by_min_size: usize,
    /// Files proven unique by any stage
    pub unique_files: usize,
    /// Files dropped because of I/O failures
    pub failed_files: usize,
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Number of removable copies
    pub duplicate_files: usize,
    /// Bytes recoverable across all groups
    pub reclaimable_space: u64,
    /// Full hashes served from the metadata store
    pub store_hits: usize,
    /// Full hashes computed from file content
    pub store_misses: usize,
    /// Bytes read by full hashing
    pub bytes_hashed: u64,
    /// Wall-clock scan time
    pub scan_duration_ms: u64,
    /// Per-stage statistics
    pub stages: JsonStages,
    /// Per-file failures
    pub failures: FailureSummary,
}

impl From<&ScanSummary> for JsonSummary {
    fn from(summary: &ScanSummary) -> Self {
        Self {
            roots: summary
                .roots
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect(),
            files_discovered: summary.files_discovered,
            skipped_by_min_size: summary.skipped_by_min_size,
            unique_files: summary.unique_files(),
            failed_files: summary.failed_files(),
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            store_hits: summary.store_hits,
            store_misses: summary.store_misses,
            bytes_hashed: summary.bytes_hashed,
            scan_duration_ms: u64::try_from(summary.scan_duration.as_millis())
                .unwrap_or(u64::MAX),
            stages: JsonStages {
                size: summary.size_stage.clone(),
                prefix: summary.prefix_stage.clone(),
                hash: summary.hash_stage.clone(),
            },
            failures: summary.failure_summary(),
        }
    }
}

/// Complete JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Groups in rank order
    pub groups: Vec<JsonGroup>,
    /// Sum of `redundant_bytes`
    pub total_potential_savings: u64,
    /// Run statistics
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the document from a ranked report and its scan summary.
    #[must_use]
    pub fn new(report: &SavingsReport, summary: &ScanSummary) -> Self {
        Self {
            groups: report.iter().map(JsonGroup::from).collect(),
            total_potential_savings: report.total_potential_savings,
            summary: JsonSummary::from(summary),
        }
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty-printed JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writeln!(writer)
    }
}
