//! Accumulates the sizes of duplicate sets into histograms.

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::utils::histogram::Histogram;

/// Label of the histogram counting every set by its size.
pub const ALL_SETS: &str = "all_sets";

/// Label of the histogram counting sets by their size once optical duplicates
/// are removed.
pub const NON_OPTICAL_SETS: &str = "non_optical_sets";

/// Label of the histogram counting sets with optical duplicates by the number
/// of optical duplicates plus one.
pub const OPTICAL_SETS: &str = "optical_sets";

/// The set size histograms of a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetSizeHistograms {
    /// Every set, by size.
    pub all_sets: Histogram,

    /// Every set, by size after removing its optical duplicates.
    pub non_optical_sets: Histogram,

    /// Sets that had optical duplicates, by optical duplicate count plus one.
    pub optical_sets: Histogram,
}

impl Default for SetSizeHistograms {
    fn default() -> Self {
        Self {
            all_sets: Histogram::new(ALL_SETS),
            non_optical_sets: Histogram::new(NON_OPTICAL_SETS),
            optical_sets: Histogram::new(OPTICAL_SETS),
        }
    }
}

impl SetSizeHistograms {
    /// Records one duplicate set of `size` candidates of which `optical` were
    /// optical duplicates.
    pub fn record(&mut self, size: u64, optical: u64) {
        if size == 0 {
            return;
        }

        self.all_sets.increment(size);

        let non_optical = size.saturating_sub(optical);
        if non_optical > 0 {
            self.non_optical_sets.increment(non_optical);
        }

        if optical > 0 {
            self.optical_sets.increment(optical + 1);
        }
    }

    /// The histograms, in the order they are reported.
    pub fn iter(&self) -> impl Iterator<Item = &Histogram> {
        [&self.all_sets, &self.non_optical_sets, &self.optical_sets].into_iter()
    }
}

impl AddAssign<&SetSizeHistograms> for SetSizeHistograms {
    fn add_assign(&mut self, other: &SetSizeHistograms) {
        self.all_sets.merge(&other.all_sets);
        self.non_optical_sets.merge(&other.non_optical_sets);
        self.optical_sets.merge(&other.optical_sets);
    }
}
