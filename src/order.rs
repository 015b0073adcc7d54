//! Versions and the partial order that drives progress tracking.
//!
//! A [`Version`] is a finite tuple of non-negative integers ordered
//! component-wise (the product order). All versions flowing through one
//! scope share the same dimension; the root scope is 1- or 2-dimensional
//! per [`crate::config::GraphConfig`] and each nested `iterate` adds one
//! coordinate.

use crate::error::Error;

/// A type equipped with a partial order distinct from Rust's `Ord`.
///
/// Mirrors `timely::order::PartialOrder`: kept separate from `Ord` because
/// several implementors want a total `Ord` for sorting/dedup purposes that
/// disagrees with the partial order used for progress tracking.
pub trait PartialOrder: PartialEq {
    /// True iff `self` is less than or equal to `other` under the partial order.
    fn less_equal(&self, other: &Self) -> bool;
    /// True iff `self` is strictly less than `other`.
    fn less_than(&self, other: &Self) -> bool {
        self.less_equal(other) && self != other
    }
}

/// A finite tuple of non-negative integers under the product partial order.
///
/// `a <= b` iff `a[i] <= b[i]` for every coordinate `i`. All operations
/// require both operands to share a dimension; implementations of this
/// engine treat a mismatch as a programmer error (`panic!`), per the
/// invariant-violation tier of the error taxonomy.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct Version(Vec<u64>);

impl Version {
    /// Builds a version from already-validated non-negative coordinates.
    pub fn new(coordinates: impl Into<Vec<u64>>) -> Self {
        Version(coordinates.into())
    }

    /// Builds a version from a sequence of signed integers, validating
    /// non-negativity (the external, boundary-facing constructor of §6).
    pub fn try_from_signed(coordinates: &[i64]) -> Result<Self, Error> {
        let mut out = Vec::with_capacity(coordinates.len());
        for &c in coordinates {
            if c < 0 {
                return Err(Error::InvalidVersion {
                    reason: format!("coordinate {c} is negative"),
                });
            }
            out.push(c as u64);
        }
        Ok(Version(out))
    }

    /// The dimension (number of coordinates) of this version.
    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    /// The raw coordinates.
    pub fn coordinates(&self) -> &[u64] {
        &self.0
    }

    fn assert_same_dimension(&self, other: &Version) {
        if self.dimension() != other.dimension() {
            panic!(
                "{}",
                Error::dimension_mismatch(self.dimension(), other.dimension())
            );
        }
    }

    /// Component-wise least upper bound.
    pub fn join(&self, other: &Version) -> Version {
        self.assert_same_dimension(other);
        Version(
            self.0
                .iter()
                .zip(other.0.iter())
                .map(|(a, b)| (*a).max(*b))
                .collect(),
        )
    }

    /// Component-wise greatest lower bound.
    pub fn meet(&self, other: &Version) -> Version {
        self.assert_same_dimension(other);
        Version(
            self.0
                .iter()
                .zip(other.0.iter())
                .map(|(a, b)| (*a).min(*b))
                .collect(),
        )
    }

    /// Appends a trailing `0` coordinate, entering a nested scope.
    pub fn extend(&self) -> Version {
        let mut coords = self.0.clone();
        coords.push(0);
        Version(coords)
    }

    /// Drops the trailing coordinate, leaving a nested scope.
    pub fn truncate(&self) -> Version {
        assert!(self.dimension() > 0, "cannot truncate a 0-dimensional version");
        let mut coords = self.0.clone();
        coords.pop();
        Version(coords)
    }

    /// Adds `step` (which must be positive) to the trailing coordinate.
    pub fn apply_step(&self, step: u64) -> Version {
        assert!(step > 0, "applyStep requires a positive step");
        assert!(self.dimension() > 0, "cannot step a 0-dimensional version");
        let mut coords = self.0.clone();
        let last = coords.len() - 1;
        coords[last] += step;
        Version(coords)
    }

    /// The earliest version `>= self` that lies at or above `frontier`.
    ///
    /// Returns `self` unchanged when `frontier` is empty.
    pub fn advance_by(&self, frontier: &crate::antichain::Antichain) -> Version {
        let elements = frontier.elements();
        if elements.is_empty() {
            return self.clone();
        }
        let mut iter = elements.iter().map(|f| self.join(f));
        let first = iter.next().expect("checked non-empty above");
        iter.fold(first, |acc, v| acc.meet(&v))
    }
}

impl PartialOrder for Version {
    fn less_equal(&self, other: &Self) -> bool {
        self.assert_same_dimension(other);
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a <= b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_is_componentwise_max() {
        let a = Version::new(vec![1, 5]);
        let b = Version::new(vec![3, 2]);
        assert_eq!(a.join(&b), Version::new(vec![3, 5]));
        assert_eq!(a.meet(&b), Version::new(vec![1, 2]));
    }

    #[test]
    fn less_equal_is_product_order() {
        let a = Version::new(vec![1, 0]);
        let b = Version::new(vec![1, 1]);
        assert!(a.less_equal(&b));
        assert!(!b.less_equal(&a));
        assert!(a.less_equal(&a));
    }

    #[test]
    #[should_panic]
    fn dimension_mismatch_panics() {
        let a = Version::new(vec![1]);
        let b = Version::new(vec![1, 2]);
        let _ = a.join(&b);
    }

    #[test]
    fn extend_truncate_roundtrip() {
        let v = Version::new(vec![3, 4]);
        assert_eq!(v.extend().truncate(), v);
        assert_eq!(v.extend(), Version::new(vec![3, 4, 0]));
    }

    #[test]
    fn apply_step_increments_last_coordinate() {
        let v = Version::new(vec![0, 0]);
        assert_eq!(v.apply_step(1), Version::new(vec![0, 1]));
    }

    #[test]
    fn try_from_signed_rejects_negative() {
        assert!(Version::try_from_signed(&[1, -1]).is_err());
        assert!(Version::try_from_signed(&[1, 2]).is_ok());
    }
}
