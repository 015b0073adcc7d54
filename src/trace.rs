//! The indexed arrangement: a per-key, per-version delta store.
//!
//! Logically `K -> { hash(Version) -> (Version, list of (V, multiplicity)) }`.
//! Borrows `differential_dataflow::trace`'s vocabulary — "logical
//! compaction", `cursor_through`-style restriction by a frontier — collapsed
//! to a single `HashMap` since this engine has no persistent, logarithmic-
//! batch merge structure to maintain: one process, one thread, no crash
//! recovery.

use std::collections::HashMap;
use std::hash::Hash;

use crate::antichain::Antichain;
use crate::error::Error;
use crate::multiset::MultiSet;
use crate::order::{PartialOrder, Version};

/// Per-key, per-version delta store supporting reconstruction, append,
/// key-wise join, and frontier-directed compaction.
#[derive(Clone, Debug)]
pub struct Index<K, V> {
    data: HashMap<K, HashMap<Version, Vec<(V, i64)>>>,
    compaction_frontier: Antichain,
    compacted: bool,
}

impl<K, V> Index<K, V>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
{
    /// An empty arrangement with no installed compaction frontier.
    pub fn new() -> Self {
        Index { data: HashMap::new(), compaction_frontier: Antichain::new(), compacted: false }
    }

    /// Appends `(value, multiplicity)` for `key` at `version`, without coalescing.
    pub fn add_value(&mut self, key: K, version: Version, entry: (V, i64)) {
        self.data.entry(key).or_default().entry(version).or_default().push(entry);
    }

    /// The versions currently recorded for `key`, in unspecified order.
    pub fn versions(&self, key: &K) -> Vec<Version> {
        match self.data.get(key) {
            Some(by_version) => by_version.keys().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Concatenates every `(value, multiplicity)` list for versions `<= req`.
    ///
    /// Fails with [`Error::HistoricalVersionCompacted`] if `req` has already
    /// been compacted away (i.e. the installed compaction frontier is `<= req`).
    pub fn reconstruct_at(&self, key: &K, req: &Version) -> Result<MultiSet<V>, Error> {
        if self.compacted && !self.compaction_frontier.less_equal_version(req) {
            return Err(Error::HistoricalVersionCompacted);
        }
        let mut entries = Vec::new();
        if let Some(by_version) = self.data.get(key) {
            for (version, values) in by_version {
                if version.less_equal(req) {
                    entries.extend(values.iter().cloned());
                }
            }
        }
        Ok(MultiSet::from_entries(entries))
    }

    /// Merges every `(key, version, (value, multiplicity))` of `other` into `self`.
    pub fn append(&mut self, other: &Index<K, V>) {
        for (key, by_version) in &other.data {
            let dst = self.data.entry(key.clone()).or_default();
            for (version, values) in by_version {
                dst.entry(version.clone()).or_default().extend(values.iter().cloned());
            }
        }
    }

    /// Partitions stored versions into in-flight and frontier-dominated, advances
    /// the dominated ones by `frontier`, and coalesces `(key, new_version, value)`
    /// triples by summing multiplicities (dropping zero sums).
    ///
    /// A compaction frontier regression is a programmer error (§7): this
    /// panics rather than returning a `Result` if `frontier` does not
    /// dominate the previously installed compaction frontier.
    pub fn compact(&mut self, frontier: &Antichain, name: &str) {
        assert!(
            !self.compacted || self.compaction_frontier.less_equal(frontier),
            "{}",
            Error::InvalidCompactionFrontier { arrangement: name.to_string() }
        );
        for by_version in self.data.values_mut() {
            let mut advanced: HashMap<Version, HashMap<V, i64>> = HashMap::new();
            let mut retained = HashMap::new();
            for (version, values) in by_version.drain() {
                if frontier.less_equal_version(&version) {
                    retained.insert(version, values);
                } else {
                    let new_version = version.advance_by(frontier);
                    let bucket = advanced.entry(new_version).or_default();
                    for (value, mult) in values {
                        *bucket.entry(value).or_insert(0) += mult;
                    }
                }
            }
            *by_version = retained;
            for (version, values) in advanced {
                let coalesced: Vec<(V, i64)> = values.into_iter().filter(|(_, m)| *m != 0).collect();
                if !coalesced.is_empty() {
                    by_version.entry(version).or_default().extend(coalesced);
                }
            }
        }
        self.data.retain(|_, by_version| !by_version.is_empty());
        self.compaction_frontier = frontier.clone();
        self.compacted = true;
    }

    /// For each key present in both arrangements, joins every pair of
    /// versions `(va, vb)` and entries, grouping the results by the joined
    /// result-version. Empty result buckets are omitted.
    pub fn join<V2>(&self, other: &Index<K, V2>) -> HashMap<Version, MultiSet<(K, (V, V2))>>
    where
        V2: Eq + Hash + Clone,
    {
        let mut raw: HashMap<Version, Vec<((K, (V, V2)), i64)>> = HashMap::new();
        for (key, by_version_a) in &self.data {
            if let Some(by_version_b) = other.data.get(key) {
                for (va, values_a) in by_version_a {
                    for (vb, values_b) in by_version_b {
                        let result_version = va.join(vb);
                        for (v1, m1) in values_a {
                            for (v2, m2) in values_b {
                                raw.entry(result_version.clone()).or_default().push((
                                    (key.clone(), (v1.clone(), v2.clone())),
                                    m1 * m2,
                                ));
                            }
                        }
                    }
                }
            }
        }
        raw.into_iter()
            .map(|(version, entries)| (version, MultiSet::from_entries(entries).consolidate()))
            .filter(|(_, ms)| !ms.is_empty())
            .collect()
    }
}

impl<K, V> Default for Index<K, V>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(coords: &[u64]) -> Version {
        Version::new(coords.to_vec())
    }

    #[test]
    fn reconstruct_at_concatenates_dominated_versions() {
        let mut idx: Index<&str, i32> = Index::new();
        idx.add_value("a", v(&[1]), (10, 1));
        idx.add_value("a", v(&[2]), (20, 1));
        idx.add_value("a", v(&[3]), (30, 1));
        let got = idx.reconstruct_at(&"a", &v(&[2])).unwrap().consolidate();
        assert_eq!(got, MultiSet::from_entries(vec![(10, 1), (20, 1)]));
    }

    #[test]
    fn compact_advances_and_coalesces() {
        let mut idx: Index<&str, i32> = Index::new();
        idx.add_value("a", v(&[1]), (10, 1));
        idx.add_value("a", v(&[1]), (10, 1));
        idx.add_value("a", v(&[2]), (10, -2));
        let mut frontier = Antichain::new();
        frontier.insert(v(&[3]));
        idx.compact(&frontier, "a");
        // both versions are dominated by [3], advance to [3] and cancel out.
        let got = idx.reconstruct_at(&"a", &v(&[5])).unwrap().consolidate();
        assert!(got.is_empty());
    }

    #[test]
    #[should_panic]
    fn compact_rejects_frontier_regression() {
        let mut idx: Index<&str, i32> = Index::new();
        let mut f1 = Antichain::new();
        f1.insert(v(&[3]));
        idx.compact(&f1, "a");
        let mut f0 = Antichain::new();
        f0.insert(v(&[1]));
        idx.compact(&f0, "a");
    }

    #[test]
    fn reconstruct_at_fails_when_compacted_away() {
        let mut idx: Index<&str, i32> = Index::new();
        idx.add_value("a", v(&[1]), (10, 1));
        let mut frontier = Antichain::new();
        frontier.insert(v(&[5]));
        idx.compact(&frontier, "a");
        assert!(idx.reconstruct_at(&"a", &v(&[2])).is_err());
    }

    #[test]
    fn join_multiplies_and_groups_by_joined_version() {
        let mut a: Index<i32, char> = Index::new();
        a.add_value(1, v(&[1]), ('a', 1));
        let mut b: Index<i32, char> = Index::new();
        b.add_value(1, v(&[1]), ('x', 1));
        let result = a.join(&b);
        let at_v1 = result.get(&v(&[1])).unwrap();
        assert_eq!(at_v1, &MultiSet::from_entries(vec![((1, ('a', 'x')), 1)]));
    }
}
