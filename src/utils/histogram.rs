//! Histogram used as the basis for counting duplicate set sizes.
//!
//! # Overview
//!
//! [Histograms] are a common way to make sense of a distribution of data.
//! Briefly, data is partitioned into bins and each bin keeps a count of how
//! many observations fell into it.
//!
//! In this module, we implement a very simple histogram that represents the
//! minimum viable histogram needed for duplicate marking. The histogram
//! follows these rules:
//!
//! 1. Only discrete, non-negative numbers are considered as bins.
//! 2. The histogram is sparse: only bins that have been incremented are
//!    stored, and there is no upper bound on the bins. Duplicate sets can be
//!    arbitrarily large, so a preallocated range would not work here.
//! 3. Every histogram carries a label describing what its bins count.
//!
//! # Usage
//!
//! Create a histogram with [`Histogram::new`] and increment bins with
//! [`increment`][Histogram::increment] (a `+= 1`) or
//! [`increment_by`][Histogram::increment_by].
//!
//! ```
//! use markdup::utils::histogram::Histogram;
//! let mut hist = Histogram::new("all_sets");
//!
//! // Increments the four bin by one.
//! hist.increment(4);
//!
//! // Increments the one bin by fourty-two.
//! hist.increment_by(1, 42);
//!
//! // Ensure that we actually recorded these values.
//! assert_eq!(hist.get(4), 1);
//! assert_eq!(hist.get(1), 42);
//! assert_eq!(hist.get(2), 0);
//! assert_eq!(hist.label(), "all_sets");
//! ```
//!
//! Histograms with the same label can be merged, which adds the counts of
//! every bin. Merging is associative and commutative, so partial histograms
//! built on separate threads can be combined in any order.
//!
//! ```
//! use markdup::utils::histogram::Histogram;
//! let mut a = Histogram::new("all_sets");
//! let mut b = Histogram::new("all_sets");
//!
//! a.increment(1);
//! b.increment(1);
//! b.increment(3);
//!
//! a.merge(&b);
//! assert_eq!(a.bins().collect::<Vec<_>>(), [(1, 2), (3, 1)]);
//! assert_eq!(a.sum(), 3);
//! assert_eq!(a.weighted_sum(), 5);
//! ```
//!
//! [Histograms]: https://en.wikipedia.org/wiki/Histogram

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Sparse histogram of non-negative integer bins. For more in depth
/// information, please see the [module-level documentation].
///
/// [module-level documentation]: self
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Histogram {
    // What the bins of the histogram count.
    label: String,
    // Count per bin, ordered by bin.
    bins: BTreeMap<u64, u64>,
}

impl Histogram {
    //=================//
    // Initializations //
    //=================//

    /// Creates an empty histogram with the given label.
    pub fn new<S: Into<String>>(label: S) -> Self {
        Self {
            label: label.into(),
            bins: BTreeMap::new(),
        }
    }

    //=================================//
    // Getting and incrementing values //
    //=================================//

    /// Increments a particular bin in the histogram by one.
    pub fn increment(&mut self, bin: u64) {
        self.increment_by(bin, 1)
    }

    /// Increments a particular bin in the histogram by the specified value.
    pub fn increment_by(&mut self, bin: u64, value: u64) {
        *self.bins.entry(bin).or_insert(0) += value;
    }

    /// Gets the count for a bin, which is zero if the bin was never
    /// incremented.
    pub fn get(&self, bin: u64) -> u64 {
        self.bins.get(&bin).copied().unwrap_or(0)
    }

    /// The label of the histogram.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Iterates over the `(bin, count)` pairs in ascending bin order.
    pub fn bins(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.bins.iter().map(|(bin, count)| (*bin, *count))
    }

    /// Whether no bin has been incremented.
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    //========================//
    // Numerical computations //
    //========================//

    /// Computes the sum of the counts within the distribution.
    pub fn sum(&self) -> u64 {
        self.bins.values().sum()
    }

    /// Computes the sum of `bin * count` across the distribution.
    pub fn weighted_sum(&self) -> u64 {
        self.bins.iter().map(|(bin, count)| bin * count).sum()
    }

    //=========//
    // Merging //
    //=========//

    /// Adds the counts of another histogram to this one.
    pub fn merge(&mut self, other: &Histogram) {
        for (bin, count) in other.bins() {
            self.increment_by(bin, count);
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    pub fn test_initialization() {
        let s = Histogram::new("non_optical_sets");
        assert!(s.is_empty());
        assert_eq!(s.sum(), 0);
        assert_eq!(s.label(), "non_optical_sets");
    }

    #[test]
    pub fn test_valid_incremements() {
        let mut s = Histogram::new("all_sets");
        s.increment(1);
        s.increment(2);
        s.increment_by(3, 3);
        s.increment_by(10, 5);

        assert_eq!(s.get(1), 1);
        assert_eq!(s.get(2), 1);
        assert_eq!(s.get(3), 3);
        assert_eq!(s.get(10), 5);
        assert_eq!(s.get(4), 0);

        assert_eq!(s.sum(), 10);
        assert_eq!(s.weighted_sum(), 62);
    }

    #[test]
    pub fn test_merge_is_order_independent() {
        let mut a = Histogram::new("all_sets");
        a.increment(1);
        a.increment_by(4, 2);

        let mut b = Histogram::new("all_sets");
        b.increment(4);
        b.increment(7);

        let mut ab = a.clone();
        ab.merge(&b);
        let mut ba = b.clone();
        ba.merge(&a);

        assert_eq!(ab.bins().collect::<Vec<_>>(), ba.bins().collect::<Vec<_>>());
        assert_eq!(ab.get(4), 3);
    }

    #[test]
    pub fn test_serializes_bins_by_value() {
        let mut s = Histogram::new("all_sets");
        s.increment(4);
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, r#"{"label":"all_sets","bins":{"4":1}}"#);

        let back: Histogram = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
