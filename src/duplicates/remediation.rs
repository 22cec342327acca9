//! Remediation action generation.
//!
//! Both generators are pure transformations of a [`SavingsReport`]: they
//! read the preserved copy and duplicates of each ranked group and never
//! re-read file content or touch the filesystem. Actions follow rank order
//! and carry a running cumulative-savings total.
//!
//! Executing an action is always left to a human or an external script;
//! see [`crate::output::script`].

use std::path::PathBuf;

use super::SavingsReport;

/// Remove every duplicate of one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalAction {
    /// Copy that is kept
    pub preserved: PathBuf,
    /// Copies to delete, in discovery order
    pub removed: Vec<PathBuf>,
    /// Bytes recovered by this action
    pub redundant_bytes: u64,
    /// Bytes recovered by this and every earlier action
    pub cumulative_savings: u64,
}

/// Replace every duplicate of one group with a hard link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardlinkAction {
    /// Copy that is kept and becomes the link target
    pub preserved: PathBuf,
    /// `(removed_path, link_target)` pairs, in discovery order
    pub links: Vec<(PathBuf, PathBuf)>,
    /// Bytes recovered by this action
    pub redundant_bytes: u64,
    /// Bytes recovered by this and every earlier action
    pub cumulative_savings: u64,
}

/// Removal actions in rank order.
#[must_use]
pub fn generate_removal_actions(report: &SavingsReport) -> Vec<RemovalAction> {
    let mut cumulative = 0u64;
    report
        .iter()
        .filter(|entry| !entry.group.is_empty())
        .map(|entry| {
            cumulative = cumulative.saturating_add(entry.redundant_bytes);
            RemovalAction {
                preserved: entry.group.preserved().path.clone(),
                removed: entry
                    .group
                    .duplicates()
                    .iter()
                    .map(|f| f.path.clone())
                    .collect(),
                redundant_bytes: entry.redundant_bytes,
                cumulative_savings: cumulative,
            }
        })
        .collect()
}

/// Hard-link actions in rank order.
#[must_use]
pub fn generate_hardlink_actions(report: &SavingsReport) -> Vec<HardlinkAction> {
    let mut cumulative = 0u64;
    report
        .iter()
        .filter(|entry| !entry.group.is_empty())
        .map(|entry| {
            cumulative = cumulative.saturating_add(entry.redundant_bytes);
            let target = entry.group.preserved().path.clone();
            HardlinkAction {
                links: entry
                    .group
                    .duplicates()
                    .iter()
                    .map(|f| (f.path.clone(), target.clone()))
                    .collect(),
                preserved: target,
                redundant_bytes: entry.redundant_bytes,
                cumulative_savings: cumulative,
            }
        })
        .collect()
}
