//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Partition maps and singleton pruning ([`partition`])
//! - Size, prefix and full-hash key functions ([`signals`])
//! - The progressive pipeline driver ([`finder`])
//! - Confirmed duplicate groups ([`groups`])
//! - Savings ranking ([`savings`]) and remediation actions ([`remediation`])

pub mod finder;
pub mod groups;
pub mod partition;
pub mod remediation;
pub mod savings;
pub mod signals;

pub use finder::{
    DuplicateFinder, FailureKind, FailureSummary, FileFailure, FinderConfig, FinderError,
    ScanSummary, Stage, StageStats,
};
pub use groups::DuplicateGroup;
pub use partition::{partition_by, PartitionMap};
pub use remediation::{
    generate_hardlink_actions, generate_removal_actions, HardlinkAction, RemovalAction,
};
pub use savings::{analyze, RankedEntry, SavingsReport};
