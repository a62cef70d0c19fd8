//! Metrics describing the duplication observed in a run.

use std::ops::AddAssign;

use serde::Deserialize;
use serde::Serialize;

use crate::duplicates::library_size::estimate_library_size;

/// Label of the aggregate over every library in a run.
pub const ALL_LIBRARIES: &str = "All Libraries";

/// Duplication metrics for one library (or for all of them).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicationMetrics {
    /// The library these metrics describe.
    pub library: String,

    /// Number of mapped records keyed on their own end: unpaired reads and
    /// paired reads whose mate did not map or never appeared.
    pub unpaired_reads_examined: u64,

    /// Number of pairs with both ends mapped. Each pair is counted once.
    pub read_pairs_examined: u64,

    /// Number of secondary or supplementary records, which are never marked.
    pub secondary_or_supplementary_reads: u64,

    /// Number of unmapped records, which are never marked.
    pub unmapped_reads: u64,

    /// Number of unpaired reads marked as duplicate.
    pub unpaired_read_duplicates: u64,

    /// Number of pairs marked as duplicate. Each pair is counted once.
    pub read_pair_duplicates: u64,

    /// Number of duplicate pairs attributed to sequencer optics. These are a
    /// subset of `read_pair_duplicates`.
    pub read_pair_optical_duplicates: u64,

    /// Fraction of examined reads marked as duplicate, where every pair counts
    /// as two reads. Absent when nothing was examined.
    pub percent_duplication: Option<f64>,

    /// Estimated number of distinct molecules in the library. Absent when no
    /// pair duplication was observed.
    pub estimated_library_size: Option<u64>,
}

impl DuplicationMetrics {
    /// Creates zeroed metrics for a library.
    pub fn new<S: Into<String>>(library: S) -> Self {
        Self {
            library: library.into(),
            ..Default::default()
        }
    }

    /// Recomputes `percent_duplication` and `estimated_library_size` from the
    /// counts.
    pub fn calculate_derived_fields(&mut self) {
        let duplicates = self.unpaired_read_duplicates + self.read_pair_duplicates * 2;
        let examined = self.unpaired_reads_examined + self.read_pairs_examined * 2;

        self.percent_duplication = if examined == 0 {
            None
        } else {
            Some(duplicates as f64 / examined as f64)
        };

        self.estimated_library_size = estimate_library_size(
            self.read_pairs_examined
                .saturating_sub(self.read_pair_optical_duplicates),
            self.unique_read_pairs(),
        );
    }

    /// Pairs that were examined and not marked as duplicate.
    pub fn unique_read_pairs(&self) -> u64 {
        self.read_pairs_examined
            .saturating_sub(self.read_pair_duplicates)
    }

    /// Total records marked as duplicate.
    pub fn duplicate_reads(&self) -> u64 {
        self.unpaired_read_duplicates + self.read_pair_duplicates * 2
    }
}

impl AddAssign<&DuplicationMetrics> for DuplicationMetrics {
    /// Adds the counts of `other`. Derived fields are left stale until
    /// [`DuplicationMetrics::calculate_derived_fields`] is called again.
    fn add_assign(&mut self, other: &DuplicationMetrics) {
        self.unpaired_reads_examined += other.unpaired_reads_examined;
        self.read_pairs_examined += other.read_pairs_examined;
        self.secondary_or_supplementary_reads += other.secondary_or_supplementary_reads;
        self.unmapped_reads += other.unmapped_reads;
        self.unpaired_read_duplicates += other.unpaired_read_duplicates;
        self.read_pair_duplicates += other.read_pair_duplicates;
        self.read_pair_optical_duplicates += other.read_pair_optical_duplicates;
    }
}
