//! Savings analysis: rank duplicate groups by recoverable space.
//!
//! [`analyze`] is a pure function over already-verified groups. It never
//! touches the filesystem and cannot fail.

use super::DuplicateGroup;

/// A duplicate group with the bytes recoverable from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    /// `size × (count − 1)` for the group
    pub redundant_bytes: u64,
    /// The group itself
    pub group: DuplicateGroup,
}

/// Groups ranked largest-savings-first, with the overall total.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SavingsReport {
    /// Entries in descending `redundant_bytes` order
    pub entries: Vec<RankedEntry>,
    /// Sum of `redundant_bytes` across all entries
    pub total_potential_savings: u64,
}

impl SavingsReport {
    /// Number of ranked groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no duplicates were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in rank order.
    pub fn iter(&self) -> std::slice::Iter<'_, RankedEntry> {
        self.entries.iter()
    }

    /// Total number of files across all groups.
    #[must_use]
    pub fn total_files(&self) -> usize {
        self.entries.iter().map(|e| e.group.len()).sum()
    }

    /// Total number of removable copies across all groups.
    #[must_use]
    pub fn total_duplicates(&self) -> usize {
        self.entries.iter().map(|e| e.group.duplicate_count()).sum()
    }
}

impl<'a> IntoIterator for &'a SavingsReport {
    type Item = &'a RankedEntry;
    type IntoIter = std::slice::Iter<'a, RankedEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Rank groups by recoverable bytes, largest first.
///
/// Groups with equal savings keep the discovery order of their preserved
/// member, so the ranking is reproducible for an unchanged tree.
#[must_use]
pub fn analyze(groups: Vec<DuplicateGroup>) -> SavingsReport {
    let mut entries: Vec<RankedEntry> = groups
        .into_iter()
        .map(|group| RankedEntry {
            redundant_bytes: group.redundant_bytes(),
            group,
        })
        .collect();

    entries.sort_by(|a, b| {
        b.redundant_bytes
            .cmp(&a.redundant_bytes)
            .then(a.group.position.cmp(&b.group.position))
    });

    let total_potential_savings = entries
        .iter()
        .fold(0u64, |acc, e| acc.saturating_add(e.redundant_bytes));

    log::debug!(
        "Ranked {} groups, {} bytes recoverable",
        entries.len(),
        total_potential_savings
    );

    SavingsReport {
        entries,
        total_potential_savings,
    }
}
