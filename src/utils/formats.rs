//! Utilities related to bioinformatics file formats.

use std::path::Path;

pub mod bam;
pub mod sam;

/// Reports whether a path names a Binary Alignment Map file, judged by its
/// extension (case insensitive).
pub fn is_bam<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.eq_ignore_ascii_case("bam"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_detection() {
        assert!(is_bam("sample.bam"));
        assert!(is_bam("/data/sample.BAM"));
        assert!(!is_bam("sample.sam"));
        assert!(!is_bam("sample.cram"));
        assert!(!is_bam("sample"));
    }
}
