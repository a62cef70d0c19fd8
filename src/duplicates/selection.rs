//! Selection of the representative read or pair within a duplicate set.
//!
//! Every candidate in a set is scored when it is keyed (see
//! [`ScoringStrategy`]). The set is then ordered with a
//! [`RepresentativeOrdering`] and the first candidate wins: it stays
//! non-duplicate while everything else in the set is marked.

use std::cmp::Ordering;
use std::fmt;

use crate::duplicates::keys::Candidate;
use crate::duplicates::record::AlignmentRecord;

/// Base qualities below this value do not contribute to a read's score.
pub const MIN_SCORING_BASE_QUALITY: u8 = 15;

//==================//
// Scoring strategy //
//==================//

/// How a read is scored when choosing the representative of a duplicate set.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScoringStrategy {
    /// Sum of the base qualities of at least Q15.
    #[default]
    SumOfBaseQualities,

    /// Number of reference bases covered by the alignment.
    TotalMappedReferenceLength,
}

impl ScoringStrategy {
    /// Scores a single record. Pairs add the scores of both mates.
    pub fn score(&self, record: &AlignmentRecord) -> u64 {
        match self {
            ScoringStrategy::SumOfBaseQualities => record
                .quality_scores
                .iter()
                .filter(|q| **q >= MIN_SCORING_BASE_QUALITY)
                .map(|q| u64::from(*q))
                .sum(),
            ScoringStrategy::TotalMappedReferenceLength => record
                .alignment
                .as_ref()
                .map(|a| a.reference_length())
                .unwrap_or(0),
        }
    }
}

impl fmt::Display for ScoringStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SumOfBaseQualities => write!(f, "sum-of-base-qualities"),
            Self::TotalMappedReferenceLength => write!(f, "total-mapped-reference-length"),
        }
    }
}

//=========================//
// Representative ordering //
//=========================//

/// Orders the candidates of a duplicate set; the smallest is kept.
pub trait RepresentativeOrdering: fmt::Debug + Send + Sync {
    /// Compares two candidates. [`Ordering::Less`] means `a` is preferred.
    fn compare(&self, a: &Candidate, b: &Candidate) -> Ordering;
}

/// Highest score first, then lexically smallest query name, then earliest in
/// the input.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScoreThenName;

impl RepresentativeOrdering for ScoreThenName {
    fn compare(&self, a: &Candidate, b: &Candidate) -> Ordering {
        b.score
            .cmp(&a.score)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.order.cmp(&b.order))
    }
}

/// Returns the position (within `members`) of the representative.
///
/// `members` indexes into `candidates` and must not be empty.
pub fn select_representative(
    candidates: &[Candidate],
    members: &[usize],
    ordering: &dyn RepresentativeOrdering,
) -> usize {
    let mut best = 0;

    for (i, member) in members.iter().enumerate().skip(1) {
        let current = &candidates[*member];
        let winner = &candidates[members[best]];

        if ordering.compare(current, winner) == Ordering::Less {
            best = i;
        }
    }

    best
}
