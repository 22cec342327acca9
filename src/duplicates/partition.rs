//! Partition maps: descriptors grouped by an equivalence key.
//!
//! # Overview
//!
//! A [`PartitionMap`] maps a stage-specific key to the ordered list of
//! descriptors sharing it. Each pipeline stage consumes one map and
//! produces a new one keyed by a richer signal; [`PartitionMap::filter_singletons`]
//! drops buckets that carry no duplicate evidence in between.
//!
//! Buckets keep first-seen order and members keep insertion order, so a
//! map built from a population in discovery order is fully deterministic.
//!
//! # Example
//!
//! ```
//! use dedupe::duplicates::partition::{partition_by, PartitionMap};
//! use dedupe::scanner::{FileDescriptor, FileEntry};
//! use std::convert::Infallible;
//! use std::path::PathBuf;
//! use std::time::SystemTime;
//!
//! let population: Vec<FileDescriptor> = [("/a", 1), ("/b", 1), ("/c", 2)]
//!     .iter()
//!     .map(|(p, s)| FileEntry::new(PathBuf::from(p), *s, SystemTime::now()).into())
//!     .collect();
//!
//! let (map, failures) = partition_by(population, |d| Ok::<_, Infallible>(d.size()));
//! assert!(failures.is_empty());
//! assert_eq!(map.len(), 2);
//!
//! let map = map.filter_singletons();
//! assert_eq!(map.len(), 1);
//! assert_eq!(map.member_count(), 2);
//! ```

use std::collections::HashMap;
use std::hash::Hash;

use crate::scanner::FileDescriptor;

/// Ordered mapping from equivalence key to the descriptors sharing it.
#[derive(Debug, Clone)]
pub struct PartitionMap<K> {
    buckets: Vec<(K, Vec<FileDescriptor>)>,
    index: HashMap<K, usize>,
}

impl<K> Default for PartitionMap<K> {
    fn default() -> Self {
        Self {
            buckets: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> PartitionMap<K> {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor to the bucket for `key`, creating it if needed.
    pub fn insert(&mut self, key: K, descriptor: FileDescriptor) {
        match self.index.get(&key) {
            Some(&slot) => self.buckets[slot].1.push(descriptor),
            None => {
                self.index.insert(key.clone(), self.buckets.len());
                self.buckets.push((key, vec![descriptor]));
            }
        }
    }

    /// Members of the bucket for `key`.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<&[FileDescriptor]> {
        self.index
            .get(key)
            .map(|&slot| self.buckets[slot].1.as_slice())
    }

    /// Drop every bucket with fewer than two members.
    ///
    /// Applying this twice yields the same map as applying it once.
    #[must_use]
    pub fn filter_singletons(self) -> Self {
        self.split_singletons().0
    }

    /// Like [`filter_singletons`](Self::filter_singletons), but also
    /// returns the pruned descriptors in bucket order.
    #[must_use]
    pub fn split_singletons(self) -> (Self, Vec<FileDescriptor>) {
        let mut kept = Self::new();
        let mut pruned = Vec::new();

        for (key, members) in self.buckets {
            if members.len() > 1 {
                kept.index.insert(key.clone(), kept.buckets.len());
                kept.buckets.push((key, members));
            } else {
                pruned.extend(members);
            }
        }

        (kept, pruned)
    }
}

impl<K> PartitionMap<K> {
    /// Number of buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether the map has no buckets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Total number of descriptors across all buckets.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.buckets.iter().map(|(_, members)| members.len()).sum()
    }

    /// Iterate buckets in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[FileDescriptor])> {
        self.buckets
            .iter()
            .map(|(key, members)| (key, members.as_slice()))
    }

    /// Consume the map, yielding buckets in first-seen order.
    #[must_use]
    pub fn into_buckets(self) -> Vec<(K, Vec<FileDescriptor>)> {
        self.buckets
    }

    /// Consume the map, yielding every descriptor bucket by bucket.
    #[must_use]
    pub fn into_descriptors(self) -> Vec<FileDescriptor> {
        self.buckets
            .into_iter()
            .flat_map(|(_, members)| members)
            .collect()
    }
}

impl<K: PartialEq> PartialEq for PartitionMap<K> {
    /// Maps are equal when they hold the same keys in the same order with
    /// the same member paths.
    fn eq(&self, other: &Self) -> bool {
        self.buckets.len() == other.buckets.len()
            && self
                .buckets
                .iter()
                .zip(&other.buckets)
                .all(|((ka, ma), (kb, mb))| {
                    ka == kb
                        && ma.len() == mb.len()
                        && ma.iter().zip(mb).all(|(a, b)| a.path() == b.path())
                })
    }
}

impl<K: Eq + Hash + Clone> FromIterator<(K, FileDescriptor)> for PartitionMap<K> {
    fn from_iter<I: IntoIterator<Item = (K, FileDescriptor)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, descriptor) in iter {
            map.insert(key, descriptor);
        }
        map
    }
}

impl<K: Eq + Hash + Clone> PartitionMap<K> {
    /// Build a map from descriptors whose keys were computed beforehand.
    ///
    /// Descriptors whose key is an error go to the returned failure list.
    pub fn from_keyed<E, I>(keyed: I) -> (Self, Vec<(FileDescriptor, E)>)
    where
        I: IntoIterator<Item = (FileDescriptor, Result<K, E>)>,
    {
        let mut map = Self::new();
        let mut failures = Vec::new();

        for (descriptor, key) in keyed {
            match key {
                Ok(key) => map.insert(key, descriptor),
                Err(e) => failures.push((descriptor, e)),
            }
        }

        (map, failures)
    }
}

/// Group a population by `key_fn`.
///
/// Every descriptor ends up in exactly one bucket, or in the returned
/// failure list when its key could not be computed.
pub fn partition_by<K, E, I, F>(
    population: I,
    mut key_fn: F,
) -> (PartitionMap<K>, Vec<(FileDescriptor, E)>)
where
    K: Eq + Hash + Clone,
    I: IntoIterator<Item = FileDescriptor>,
    F: FnMut(&FileDescriptor) -> Result<K, E>,
{
    PartitionMap::from_keyed(population.into_iter().map(|descriptor| {
        let key = key_fn(&descriptor);
        (descriptor, key)
    }))
}
