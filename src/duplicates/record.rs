//! The alignment records consumed by the duplicate marking engine and the
//! flags handed back for each of them.
//!
//! Records are decoded by whoever owns the alignment file (see
//! [`crate::duplicates::command`] for the BAM adapter). The engine only ever
//! reads these fields: marking results come back as [`DuplicateFlags`], one
//! per record and in input order, rather than being written into the records.

use std::fmt;

use serde::Serialize;

/// Library name used when a record's read group does not declare one.
pub const UNKNOWN_LIBRARY: &str = "Unknown Library";

//========//
// Strand //
//========//

/// The strand a read aligned to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Strand {
    /// Aligned as given.
    Forward,

    /// Aligned as the reverse complement.
    Reverse,
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Forward => write!(f, "+"),
            Strand::Reverse => write!(f, "-"),
        }
    }
}

//=======//
// Flags //
//=======//

/// The subset of alignment flags that matter for duplicate marking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RecordFlags {
    /// The template has multiple segments (0x1).
    pub paired: bool,

    /// The record itself is unmapped (0x4).
    pub unmapped: bool,

    /// The mate of the record is unmapped (0x8).
    pub mate_unmapped: bool,

    /// The record aligned to the reverse strand (0x10).
    pub reverse_complemented: bool,

    /// The record is the first segment in the template (0x40).
    pub first_segment: bool,

    /// The record is the last segment in the template (0x80).
    pub last_segment: bool,

    /// The record is a secondary alignment (0x100).
    pub secondary: bool,

    /// The record is a supplementary alignment (0x800).
    pub supplementary: bool,
}

impl RecordFlags {
    /// Whether the record is a secondary or a supplementary alignment.
    pub fn is_secondary_or_supplementary(&self) -> bool {
        self.secondary || self.supplementary
    }

    /// The strand implied by the reverse complemented flag.
    pub fn strand(&self) -> Strand {
        if self.reverse_complemented {
            Strand::Reverse
        } else {
            Strand::Forward
        }
    }
}

//===========//
// Alignment //
//===========//

/// Where a record aligned on the reference. Positions are 1-based and
/// inclusive. Clip lengths count soft and hard clipped bases at either end so
/// that unclipped coordinates can be recovered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alignment {
    /// Index of the reference sequence in the header.
    pub reference_sequence_id: usize,

    /// First aligned reference position.
    pub start: i64,

    /// Last aligned reference position.
    pub end: i64,

    /// Number of clipped bases before the first aligned base.
    pub leading_clip: i64,

    /// Number of clipped bases after the last aligned base.
    pub trailing_clip: i64,
}

impl Alignment {
    /// Creates an unclipped alignment spanning `start..=end`.
    pub fn new(reference_sequence_id: usize, start: i64, end: i64) -> Self {
        Self {
            reference_sequence_id,
            start,
            end,
            leading_clip: 0,
            trailing_clip: 0,
        }
    }

    /// Sets the clipping at both ends of the alignment.
    pub fn with_clipping(mut self, leading_clip: i64, trailing_clip: i64) -> Self {
        self.leading_clip = leading_clip;
        self.trailing_clip = trailing_clip;
        self
    }

    /// The start position had no bases been clipped.
    pub fn unclipped_start(&self) -> i64 {
        self.start - self.leading_clip
    }

    /// The end position had no bases been clipped.
    pub fn unclipped_end(&self) -> i64 {
        self.end + self.trailing_clip
    }

    /// The unclipped 5' position of a read aligned on `strand`.
    pub fn five_prime(&self, strand: Strand) -> i64 {
        match strand {
            Strand::Forward => self.unclipped_start(),
            Strand::Reverse => self.unclipped_end(),
        }
    }

    /// Number of reference bases covered by the alignment.
    pub fn reference_length(&self) -> u64 {
        (self.end - self.start + 1).max(0) as u64
    }
}

//==================//
// Alignment record //
//==================//

/// A decoded alignment record.
#[derive(Clone, Debug, Default)]
pub struct AlignmentRecord {
    /// The query name.
    pub name: String,

    /// Flags relevant to duplicate marking.
    pub flags: RecordFlags,

    /// The alignment, if the record is mapped.
    pub alignment: Option<Alignment>,

    /// The read group the record belongs to.
    pub read_group: Option<String>,

    /// The library the record belongs to (derived from its read group).
    pub library: Option<String>,

    /// Phred scaled base qualities.
    pub quality_scores: Vec<u8>,
}

impl AlignmentRecord {
    /// Creates a mapped, unpaired record.
    pub fn fragment<S: Into<String>>(name: S, alignment: Alignment, strand: Strand) -> Self {
        Self {
            name: name.into(),
            flags: RecordFlags {
                reverse_complemented: strand == Strand::Reverse,
                ..Default::default()
            },
            alignment: Some(alignment),
            ..Default::default()
        }
    }

    /// Creates one mate of a pair where both mates are mapped.
    pub fn mate<S: Into<String>>(
        name: S,
        alignment: Alignment,
        strand: Strand,
        first_segment: bool,
    ) -> Self {
        Self {
            name: name.into(),
            flags: RecordFlags {
                paired: true,
                reverse_complemented: strand == Strand::Reverse,
                first_segment,
                last_segment: !first_segment,
                ..Default::default()
            },
            alignment: Some(alignment),
            ..Default::default()
        }
    }

    /// Creates an unmapped, unpaired record.
    pub fn unmapped<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            flags: RecordFlags {
                unmapped: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Sets the base qualities.
    pub fn with_quality_scores(mut self, quality_scores: Vec<u8>) -> Self {
        self.quality_scores = quality_scores;
        self
    }

    /// Sets the read group.
    pub fn with_read_group<S: Into<String>>(mut self, read_group: S) -> Self {
        self.read_group = Some(read_group.into());
        self
    }

    /// Sets the library.
    pub fn with_library<S: Into<String>>(mut self, library: S) -> Self {
        self.library = Some(library.into());
        self
    }

    /// Whether the record should be treated as unmapped.
    pub fn is_unmapped(&self) -> bool {
        self.flags.unmapped || self.alignment.is_none()
    }

    /// The library name, falling back to [`UNKNOWN_LIBRARY`].
    pub fn library_name(&self) -> &str {
        self.library.as_deref().unwrap_or(UNKNOWN_LIBRARY)
    }
}

//=================//
// Duplicate flags //
//=================//

/// The marking result for a single input record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateFlags {
    /// The record is a duplicate of another record or pair.
    pub duplicate: bool,

    /// The record is a duplicate attributed to sequencer optics.
    pub optical_duplicate: bool,
}

impl DuplicateFlags {
    /// Flags for a non-optical duplicate.
    pub fn duplicate() -> Self {
        Self {
            duplicate: true,
            optical_duplicate: false,
        }
    }

    /// Flags for an optical duplicate.
    pub fn optical() -> Self {
        Self {
            duplicate: true,
            optical_duplicate: true,
        }
    }

    /// The kind of duplicate, if any.
    pub fn duplicate_type(&self) -> Option<DuplicateType> {
        match (self.duplicate, self.optical_duplicate) {
            (true, true) => Some(DuplicateType::Sequencing),
            (true, false) => Some(DuplicateType::Library),
            _ => None,
        }
    }
}

/// The origin attributed to a duplicate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DuplicateType {
    /// A PCR duplicate made during library construction.
    Library,

    /// An optical duplicate made by the sequencer.
    Sequencing,
}

impl DuplicateType {
    /// The two letter code written to the `DT` tag.
    pub fn code(&self) -> &'static str {
        match self {
            DuplicateType::Library => "LB",
            DuplicateType::Sequencing => "SQ",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_five_prime_uses_unclipped_coordinates() {
        let alignment = Alignment::new(0, 100, 149).with_clipping(5, 10);
        assert_eq!(alignment.unclipped_start(), 95);
        assert_eq!(alignment.unclipped_end(), 159);
        assert_eq!(alignment.five_prime(Strand::Forward), 95);
        assert_eq!(alignment.five_prime(Strand::Reverse), 159);
        assert_eq!(alignment.reference_length(), 50);
    }

    #[test]
    pub fn test_record_constructors() {
        let mate = AlignmentRecord::mate("q1", Alignment::new(0, 1, 10), Strand::Reverse, false);
        assert!(mate.flags.paired);
        assert!(mate.flags.last_segment);
        assert_eq!(mate.flags.strand(), Strand::Reverse);
        assert!(!mate.is_unmapped());
        assert_eq!(mate.library_name(), UNKNOWN_LIBRARY);

        let unmapped = AlignmentRecord::unmapped("q2").with_library("lib1");
        assert!(unmapped.is_unmapped());
        assert_eq!(unmapped.library_name(), "lib1");
    }

    #[test]
    pub fn test_duplicate_type() {
        assert_eq!(DuplicateFlags::default().duplicate_type(), None);
        assert_eq!(
            DuplicateFlags::duplicate().duplicate_type(),
            Some(DuplicateType::Library)
        );
        assert_eq!(DuplicateFlags::optical().duplicate_type().unwrap().code(), "SQ");
    }
}
