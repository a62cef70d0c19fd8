//! Drives a duplicate marking run from observed records to flags and metrics.
//!
//! Records are handed to a [`DuplicateMarker`] one at a time with
//! [`observe`](DuplicateMarker::observe). The marker keeps a compact keyed
//! form of each record rather than the record itself, so callers holding
//! large inputs can observe everything in a first pass and apply the flags
//! returned by [`finish`](DuplicateMarker::finish) in a second one.
//!
//! ```
//! use markdup::duplicates::engine::DuplicateMarker;
//! use markdup::duplicates::record::{Alignment, AlignmentRecord, Strand};
//!
//! let mut marker = DuplicateMarker::default();
//! for name in ["q1", "q2"] {
//!     let record = AlignmentRecord::fragment(name, Alignment::new(0, 100, 149), Strand::Forward);
//!     marker.observe(&record);
//! }
//!
//! let outcome = marker.finish();
//! assert!(!outcome.flags[0].duplicate);
//! assert!(outcome.flags[1].duplicate);
//! assert_eq!(outcome.report.metrics.unpaired_read_duplicates, 1);
//! ```

use std::borrow::Borrow;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;
use tracing::info;

use crate::duplicates::grouper::DuplicateSet;
use crate::duplicates::grouper::PairGrouper;
use crate::duplicates::keys::classify;
use crate::duplicates::keys::Candidate;
use crate::duplicates::keys::Keying;
use crate::duplicates::keys::LibraryId;
use crate::duplicates::keys::Unkeyable;
use crate::duplicates::library_size::roi_histogram;
use crate::duplicates::metrics::DuplicationMetrics;
use crate::duplicates::metrics::ALL_LIBRARIES;
use crate::duplicates::optical::OpticalDuplicateFinder;
use crate::duplicates::optical::DEFAULT_MAX_OPTICAL_SET_SIZE;
use crate::duplicates::optical::DEFAULT_OPTICAL_PIXEL_DISTANCE;
use crate::duplicates::physical::IlluminaLocationParser;
use crate::duplicates::physical::PhysicalLocationParser;
use crate::duplicates::record::AlignmentRecord;
use crate::duplicates::record::DuplicateFlags;
use crate::duplicates::results::DuplicationReport;
use crate::duplicates::selection::select_representative;
use crate::duplicates::selection::RepresentativeOrdering;
use crate::duplicates::selection::ScoreThenName;
use crate::duplicates::selection::ScoringStrategy;
use crate::duplicates::set_sizes::SetSizeHistograms;

//===============//
// Configuration //
//===============//

/// Options for a duplicate marking run.
#[derive(Clone, Debug)]
pub struct MarkDuplicatesConfig {
    /// How candidates are scored when choosing a representative.
    pub scoring: ScoringStrategy,

    /// Maximum distance, in pixels, between optical duplicates.
    pub optical_pixel_distance: f64,

    /// Largest duplicate set checked for optical duplicates.
    pub max_optical_set_size: usize,

    /// Extracts flowcell locations from read names.
    pub parser: Arc<dyn PhysicalLocationParser>,

    /// Orders the members of a duplicate set. The first one is kept.
    pub ordering: Arc<dyn RepresentativeOrdering>,
}

impl Default for MarkDuplicatesConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringStrategy::default(),
            optical_pixel_distance: DEFAULT_OPTICAL_PIXEL_DISTANCE,
            max_optical_set_size: DEFAULT_MAX_OPTICAL_SET_SIZE,
            parser: Arc::new(IlluminaLocationParser),
            ordering: Arc::new(ScoreThenName),
        }
    }
}

//=========//
// Outcome //
//=========//

/// The result of a run.
#[derive(Clone, Debug)]
pub struct MarkingOutcome {
    /// One entry per observed record, in the order they were observed.
    pub flags: Vec<DuplicateFlags>,

    /// Metrics and histograms for the run.
    pub report: DuplicationReport,
}

/// Records that were passed through without a key, per library.
#[derive(Clone, Copy, Debug, Default)]
struct UnkeyedCounts {
    unmapped: u64,
    secondary_or_supplementary: u64,
}

//========//
// Marker //
//========//

/// Collects records and marks duplicates among them once all have been seen.
#[derive(Debug)]
pub struct DuplicateMarker {
    ordering: Arc<dyn RepresentativeOrdering>,
    finder: OpticalDuplicateFinder,
    grouper: PairGrouper,
    unkeyed: Vec<UnkeyedCounts>,
    observed: usize,
}

impl Default for DuplicateMarker {
    fn default() -> Self {
        Self::new(MarkDuplicatesConfig::default())
    }
}

impl DuplicateMarker {
    /// Creates a marker for a new run.
    pub fn new(config: MarkDuplicatesConfig) -> Self {
        Self {
            finder: OpticalDuplicateFinder::new(
                config.optical_pixel_distance,
                config.max_optical_set_size,
            ),
            grouper: PairGrouper::new(config.scoring, config.parser),
            ordering: config.ordering,
            unkeyed: Vec::new(),
            observed: 0,
        }
    }

    /// Number of records observed so far.
    pub fn observed(&self) -> usize {
        self.observed
    }

    /// Observes the next record and returns its index in the run.
    pub fn observe(&mut self, record: &AlignmentRecord) -> usize {
        let index = self.observed;
        self.observed += 1;

        match classify(record) {
            Keying::Fragment(end) => self.grouper.add_fragment(index, record, end),
            Keying::Mate(end) => self.grouper.add_mate(index, record, end),
            Keying::Unkeyable(reason) => {
                let library = self.grouper.library_id(record.library_name());
                if self.unkeyed.len() <= library {
                    self.unkeyed.resize(library + 1, UnkeyedCounts::default());
                }

                match reason {
                    Unkeyable::Unmapped => self.unkeyed[library].unmapped += 1,
                    Unkeyable::SecondaryOrSupplementary => {
                        self.unkeyed[library].secondary_or_supplementary += 1
                    }
                }
            }
        }

        index
    }

    /// Marks duplicates among everything observed.
    pub fn finish(self) -> MarkingOutcome {
        let grouping = self.grouper.finish();
        let libraries = grouping.libraries.len();

        info!(
            "Marking duplicates within {} duplicate sets.",
            grouping.sets.len()
        );

        // (1) Examine every set in parallel. Each set only ever touches the
        // records of its own candidates.
        let finder = &self.finder;
        let ordering = self.ordering.as_ref();
        let candidates = &grouping.candidates;

        let tally = grouping
            .sets
            .par_iter()
            .fold(
                || SetTally::new(libraries),
                |mut tally, set| {
                    tally.examine(set, candidates, ordering, finder);
                    tally
                },
            )
            .reduce(|| SetTally::new(libraries), SetTally::merge);

        // (2) Apply the flags.
        let mut flags = vec![DuplicateFlags::default(); self.observed];
        for (index, flag) in tally.assignments {
            flags[index] = flag;
        }

        // (3) Assemble the metrics.
        let mut per_library = tally.metrics;
        for (id, name) in grouping.libraries.iter().enumerate() {
            per_library[id].library = name.clone();

            if let Some(unkeyed) = self.unkeyed.get(id) {
                per_library[id].unmapped_reads += unkeyed.unmapped;
                per_library[id].secondary_or_supplementary_reads +=
                    unkeyed.secondary_or_supplementary;
            }
        }

        let mut metrics = DuplicationMetrics::new(ALL_LIBRARIES);
        for library in per_library.iter_mut() {
            library.calculate_derived_fields();
            metrics += &*library;
        }
        metrics.calculate_derived_fields();

        let roi = roi_histogram(
            metrics.estimated_library_size,
            metrics.read_pairs_examined,
            metrics.unique_read_pairs(),
        );

        grouping.anomalies.summarize();
        debug!(
            "Marked {} of {} records as duplicate.",
            metrics.duplicate_reads(),
            self.observed
        );

        MarkingOutcome {
            flags,
            report: DuplicationReport {
                metrics,
                libraries: per_library,
                histograms: tally.histograms,
                roi,
                anomalies: grouping.anomalies,
            },
        }
    }
}

/// Marks duplicates among `records` with the given configuration.
pub fn mark_duplicates<I>(records: I, config: MarkDuplicatesConfig) -> MarkingOutcome
where
    I: IntoIterator,
    I::Item: Borrow<AlignmentRecord>,
{
    let mut marker = DuplicateMarker::new(config);

    for record in records {
        marker.observe(record.borrow());
    }

    marker.finish()
}

//===========//
// Set tally //
//===========//

/// What a worker learned from the sets it examined.
struct SetTally {
    assignments: Vec<(usize, DuplicateFlags)>,
    metrics: Vec<DuplicationMetrics>,
    histograms: SetSizeHistograms,
}

impl SetTally {
    fn new(libraries: usize) -> Self {
        Self {
            assignments: Vec::new(),
            metrics: vec![DuplicationMetrics::default(); libraries],
            histograms: SetSizeHistograms::default(),
        }
    }

    fn library(&mut self, library: LibraryId) -> &mut DuplicationMetrics {
        &mut self.metrics[library]
    }

    fn examine(
        &mut self,
        set: &DuplicateSet,
        candidates: &[Candidate],
        ordering: &dyn RepresentativeOrdering,
        finder: &OpticalDuplicateFinder,
    ) {
        let is_pair = set.key.is_pair();
        let metrics = self.library(set.key.library());

        if is_pair {
            metrics.read_pairs_examined += set.len() as u64;
        } else {
            metrics.unpaired_reads_examined += set.len() as u64;
        }

        if set.len() < 2 {
            self.histograms.record(set.len() as u64, 0);
            return;
        }

        let keeper = select_representative(candidates, &set.members, ordering);
        let optical = if is_pair {
            finder.find(candidates, &set.members, keeper)
        } else {
            vec![false; set.len()]
        };

        let mut optical_duplicates = 0;
        for (position, member) in set.members.iter().enumerate() {
            if position == keeper {
                continue;
            }

            let flag = if optical[position] {
                optical_duplicates += 1;
                DuplicateFlags::optical()
            } else {
                DuplicateFlags::duplicate()
            };

            for record in &candidates[*member].records {
                self.assignments.push((*record, flag));
            }
        }

        let metrics = self.library(set.key.library());
        let duplicates = set.len() as u64 - 1;
        if is_pair {
            metrics.read_pair_duplicates += duplicates;
            metrics.read_pair_optical_duplicates += optical_duplicates;
        } else {
            metrics.unpaired_read_duplicates += duplicates;
        }

        self.histograms
            .record(set.len() as u64, optical_duplicates);
    }

    fn merge(mut self, other: SetTally) -> SetTally {
        self.assignments.extend(other.assignments);
        for (ours, theirs) in self.metrics.iter_mut().zip(other.metrics.iter()) {
            *ours += theirs;
        }
        self.histograms += &other.histograms;
        self
    }
}
