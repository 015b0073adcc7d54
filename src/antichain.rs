//! Frontiers: minimal sets of mutually incomparable [`Version`]s.
//!
//! Grounded on `timely::progress::frontier::Antichain` — same minimality
//! invariant on `insert`, same "every element of other is `>=` some element
//! of self" definition of `less_equal` between two antichains — simplified
//! to the one concrete `Version` type this crate needs, since there is no
//! generic `Timestamp`/exchange machinery to support here.

use crate::order::{PartialOrder, Version};

/// A minimal set of pairwise-incomparable [`Version`]s.
///
/// Two antichains are equal if they contain the same set of elements,
/// irrespective of order.
#[derive(Clone, Debug, Default)]
pub struct Antichain {
    elements: Vec<Version>,
}

impl Antichain {
    /// The empty antichain (the bottom frontier of an as-yet-unstarted edge).
    pub fn new() -> Self {
        Antichain { elements: Vec::new() }
    }

    /// A singleton antichain.
    pub fn from_elem(version: Version) -> Self {
        Antichain { elements: vec![version] }
    }

    /// Inserts `version`, maintaining minimality.
    ///
    /// A no-op if some existing element is already `<= version`; otherwise
    /// evicts every existing element that `version` dominates. Returns
    /// `true` iff the antichain's element set changed.
    pub fn insert(&mut self, version: Version) -> bool {
        if self.elements.iter().any(|e| e.less_equal(&version)) {
            return false;
        }
        self.elements.retain(|e| !version.less_equal(e));
        self.elements.push(version);
        true
    }

    /// Inserts every element of `other`, maintaining minimality.
    pub fn extend_with(&mut self, other: impl IntoIterator<Item = Version>) -> bool {
        let mut changed = false;
        for v in other {
            changed |= self.insert(v);
        }
        changed
    }

    /// The antichain of the union of `self` and `other`, minimized.
    pub fn meet(&self, other: &Antichain) -> Antichain {
        let mut out = self.clone();
        out.extend_with(other.elements.iter().cloned());
        out
    }

    /// True iff some element of this antichain is `<= version`.
    pub fn less_equal_version(&self, version: &Version) -> bool {
        self.elements.iter().any(|e| e.less_equal(version))
    }

    /// True iff some element of this antichain is `< version`.
    pub fn less_than_version(&self, version: &Version) -> bool {
        self.elements.iter().any(|e| e.less_than(version))
    }

    /// The antichain's elements, in unspecified order.
    pub fn elements(&self) -> &[Version] {
        &self.elements
    }

    /// True iff the antichain has no elements (nothing may ever be emitted again).
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Extends every element by one dimension (entering a nested scope).
    pub fn extend_dimension(&self) -> Antichain {
        Antichain {
            elements: self.elements.iter().map(Version::extend).collect(),
        }
    }

    /// Truncates every element by one dimension (leaving a nested scope).
    pub fn truncate_dimension(&self) -> Antichain {
        let mut out = Antichain::new();
        for v in &self.elements {
            out.insert(v.truncate());
        }
        out
    }

    /// Applies `applyStep(step)` to every element, re-minimizing.
    pub fn apply_step(&self, step: u64) -> Antichain {
        let mut out = Antichain::new();
        for v in &self.elements {
            out.insert(v.apply_step(step));
        }
        out
    }
}

impl PartialEq for Antichain {
    fn eq(&self, other: &Self) -> bool {
        self.elements.len() == other.elements.len()
            && self.elements.iter().all(|a| other.elements.iter().any(|b| a == b))
    }
}

impl PartialOrder for Antichain {
    /// `self <= other` iff every element of `other` is `>=` some element of `self`.
    fn less_equal(&self, other: &Self) -> bool {
        other
            .elements
            .iter()
            .all(|o| self.elements.iter().any(|s| s.less_equal(o)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_maintains_minimality() {
        let mut a = Antichain::new();
        assert!(a.insert(Version::new(vec![2])));
        assert!(!a.insert(Version::new(vec![3]))); // dominated by 2
        assert!(a.insert(Version::new(vec![1]))); // evicts 2
        assert_eq!(a.elements(), &[Version::new(vec![1])]);
    }

    #[test]
    fn less_equal_version_checks_domination() {
        let mut a = Antichain::new();
        a.insert(Version::new(vec![2, 0]));
        assert!(a.less_equal_version(&Version::new(vec![3, 0])));
        assert!(!a.less_equal_version(&Version::new(vec![1, 0])));
    }

    #[test]
    fn monotonic_advance_is_partial_order() {
        let mut a = Antichain::new();
        a.insert(Version::new(vec![1]));
        let mut b = Antichain::new();
        b.insert(Version::new(vec![2]));
        assert!(a.less_equal(&b));
        assert!(!b.less_equal(&a));
    }
}
