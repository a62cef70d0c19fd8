//! Utilities related to CIGAR string processing.

use noodles::sam::record::cigar::op::Kind;
use noodles::sam::record::Cigar;

/// Reports whether a CIGAR operation consumes a reference base.
pub fn consumes_reference(kind: Kind) -> bool {
    matches!(
        kind,
        Kind::Match | Kind::Deletion | Kind::Skip | Kind::SequenceMatch | Kind::SequenceMismatch
    )
}

/// Reports whether a CIGAR operation clips bases (soft or hard).
pub fn is_clip(kind: Kind) -> bool {
    matches!(kind, Kind::SoftClip | Kind::HardClip)
}

/// Number of reference bases covered by `ops`.
pub fn reference_span<I>(ops: I) -> usize
where
    I: IntoIterator<Item = (Kind, usize)>,
{
    ops.into_iter()
        .filter(|(kind, _)| consumes_reference(*kind))
        .map(|(_, len)| len)
        .sum()
}

/// Number of clipped bases at the start and at the end of the alignment.
pub fn clipped_lengths<I>(ops: I) -> (usize, usize)
where
    I: IntoIterator<Item = (Kind, usize)>,
{
    let ops: Vec<(Kind, usize)> = ops.into_iter().collect();

    let leading = ops
        .iter()
        .take_while(|(kind, _)| is_clip(*kind))
        .map(|(_, len)| len)
        .sum();

    // A fully clipped CIGAR has no trailing clip of its own.
    let trailing = if ops.iter().all(|(kind, _)| is_clip(*kind)) {
        0
    } else {
        ops.iter()
            .rev()
            .take_while(|(kind, _)| is_clip(*kind))
            .map(|(_, len)| len)
            .sum()
    };

    (leading, trailing)
}

/// The `(kind, length)` pairs of a noodles CIGAR.
pub fn operations(cigar: &Cigar) -> impl Iterator<Item = (Kind, usize)> + '_ {
    cigar.iter().map(|op| (op.kind(), op.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_clipped_lengths() {
        let ops = vec![
            (Kind::HardClip, 2),
            (Kind::SoftClip, 3),
            (Kind::Match, 50),
            (Kind::Deletion, 2),
            (Kind::Match, 10),
            (Kind::SoftClip, 4),
        ];

        assert_eq!(clipped_lengths(ops.clone()), (5, 4));
        assert_eq!(reference_span(ops), 62);
    }

    #[test]
    pub fn test_unclipped() {
        let ops = vec![(Kind::Match, 20), (Kind::Insertion, 1), (Kind::Match, 5)];
        assert_eq!(clipped_lengths(ops.clone()), (0, 0));
        assert_eq!(reference_span(ops), 25);
    }

    #[test]
    pub fn test_noodles_cigar() {
        let cigar: Cigar = "5S20M3D10M".parse().unwrap();
        let ops: Vec<_> = operations(&cigar).collect();
        assert_eq!(clipped_lengths(ops.clone()), (5, 0));
        assert_eq!(reference_span(ops), 33);
    }
}
