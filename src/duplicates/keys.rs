//! Keys that decide which reads and pairs are duplicates of one another.
//!
//! A read is reduced to a [`ReadEnd`]: its reference, its unclipped 5'
//! position and its strand. Unpaired reads (and reads whose mate did not map)
//! are keyed on their own end. Pairs are keyed on both ends, ordered
//! canonically so that a pair and its mate-swapped copy produce the same key.

use crate::duplicates::physical::PhysicalLocation;
use crate::duplicates::record::AlignmentRecord;
use crate::duplicates::record::Strand;

/// Dense index of a library within a run.
pub type LibraryId = usize;

/// The 5' end of a mapped read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReadEnd {
    /// Index of the reference sequence.
    pub reference_sequence_id: usize,

    /// The unclipped 5' position.
    pub position: i64,

    /// The strand the read aligned to.
    pub strand: Strand,
}

impl ReadEnd {
    /// Builds the end of a mapped record, or `None` if it is unmapped.
    pub fn from_record(record: &AlignmentRecord) -> Option<Self> {
        if record.flags.unmapped {
            return None;
        }

        let alignment = record.alignment.as_ref()?;
        let strand = record.flags.strand();

        Some(ReadEnd {
            reference_sequence_id: alignment.reference_sequence_id,
            position: alignment.five_prime(strand),
            strand,
        })
    }
}

/// The grouping key of a fragment or a pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKey {
    /// An unpaired read, or a paired read whose mate is not available.
    Fragment {
        /// The library of the read.
        library: LibraryId,

        /// The 5' end of the read.
        end: ReadEnd,
    },

    /// A pair with both ends mapped.
    Pair {
        /// The library of the pair.
        library: LibraryId,

        /// The canonically lower end.
        first: ReadEnd,

        /// The canonically higher end.
        second: ReadEnd,
    },
}

impl RecordKey {
    /// Creates a pair key, ordering the ends by reference, position and strand.
    pub fn pair(library: LibraryId, a: ReadEnd, b: ReadEnd) -> Self {
        let (first, second) = if b < a { (b, a) } else { (a, b) };
        RecordKey::Pair {
            library,
            first,
            second,
        }
    }

    /// The library the key belongs to.
    pub fn library(&self) -> LibraryId {
        match self {
            RecordKey::Fragment { library, .. } => *library,
            RecordKey::Pair { library, .. } => *library,
        }
    }

    /// Whether the key was built from a pair.
    pub fn is_pair(&self) -> bool {
        matches!(self, RecordKey::Pair { .. })
    }
}

/// Why a record produced no key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unkeyable {
    /// The record did not map.
    Unmapped,

    /// The record is not the primary alignment.
    SecondaryOrSupplementary,
}

/// How a record takes part in duplicate marking.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keying {
    /// The record is passed through untouched.
    Unkeyable(Unkeyable),

    /// The record is keyed on its own end.
    Fragment(ReadEnd),

    /// The record is keyed together with its mate once the mate is seen.
    Mate(ReadEnd),
}

/// Decides how a record takes part in duplicate marking.
pub fn classify(record: &AlignmentRecord) -> Keying {
    if record.is_unmapped() {
        return Keying::Unkeyable(Unkeyable::Unmapped);
    }

    if record.flags.is_secondary_or_supplementary() {
        return Keying::Unkeyable(Unkeyable::SecondaryOrSupplementary);
    }

    // A mapped record always has an end.
    let end = match ReadEnd::from_record(record) {
        Some(end) => end,
        None => return Keying::Unkeyable(Unkeyable::Unmapped),
    };

    if record.flags.paired && !record.flags.mate_unmapped {
        Keying::Mate(end)
    } else {
        Keying::Fragment(end)
    }
}

//===========//
// Candidate //
//===========//

/// A keyed fragment or pair waiting to be grouped.
#[derive(Clone, Debug)]
pub struct Candidate {
    /// The grouping key.
    pub key: RecordKey,

    /// Input indices of the records behind this candidate (one or two).
    pub records: Vec<usize>,

    /// The query name.
    pub name: String,

    /// Score used to choose the representative of a set.
    pub score: u64,

    /// Read group, which scopes optical duplicate detection.
    pub read_group: Option<String>,

    /// Flowcell location parsed from the query name.
    pub location: Option<PhysicalLocation>,

    /// For pairs, whether the first-of-pair read is the canonical first end.
    /// Pairs with different orientations are never optical duplicates of
    /// each other.
    pub read_one_first: bool,

    /// Input index of the first record, used as the final tie-break.
    pub order: usize,
}

impl Candidate {
    /// Whether the candidate is a pair.
    pub fn is_pair(&self) -> bool {
        self.key.is_pair()
    }
}
