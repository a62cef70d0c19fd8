//! Estimation of library complexity from observed duplication.
//!
//! Under the Lander-Waterman model, sequencing `n` read pairs from a library
//! of `N` distinct molecules is expected to observe
//!
//! `c = N * (1 - exp(-n / N))`
//!
//! unique pairs. The equation has no closed form for `N`, so it is solved by
//! bisection on `f(N) = c / N - 1 + exp(-n / N)`, which is positive for small
//! `N` and negative once `N` exceeds the solution.

use serde::{Deserialize, Serialize};

/// Maximum number of bisection steps once the solution is bracketed.
const BISECTION_ITERATIONS: usize = 40;

/// Largest coverage multiple reported by [`roi_histogram`].
pub const MAX_COVERAGE_MULTIPLE: u32 = 100;

fn lander_waterman(x: f64, c: f64, n: f64) -> f64 {
    c / x - 1.0 + (-n / x).exp()
}

/// Estimates the number of distinct molecules in a library from `read_pairs`
/// sequenced pairs of which `unique_read_pairs` were not duplicates.
///
/// Returns `None` when no duplication was observed or when the inputs cannot
/// describe a library.
///
/// ```
/// use markdup::duplicates::library_size::estimate_library_size;
///
/// assert_eq!(estimate_library_size(10, 10), None);
/// assert_eq!(estimate_library_size(0, 0), None);
///
/// let size = estimate_library_size(1_000, 900).unwrap();
/// assert!(size > 4_000 && size < 5_000);
/// ```
pub fn estimate_library_size(read_pairs: u64, unique_read_pairs: u64) -> Option<u64> {
    if read_pairs == 0 || unique_read_pairs == 0 || unique_read_pairs >= read_pairs {
        return None;
    }

    let n = read_pairs as f64;
    let c = unique_read_pairs as f64;

    // (1) Bracket the solution between `c` and `upper * c`.
    let mut lower = 1.0;
    let mut upper = 100.0;

    if lander_waterman(lower * c, c, n) < 0.0 {
        return None;
    }

    while lander_waterman(upper * c, c, n) > 0.0 {
        upper *= 10.0;

        if !upper.is_finite() {
            return None;
        }
    }

    // (2) Bisect.
    for _ in 0..BISECTION_ITERATIONS {
        let middle = (lower + upper) / 2.0;
        let value = lander_waterman(middle * c, c, n);

        if value == 0.0 {
            break;
        } else if value > 0.0 {
            lower = middle;
        } else {
            upper = middle;
        }
    }

    Some((c * (lower + upper) / 2.0) as u64)
}

/// The expected gain in unique pairs from sequencing `coverage_multiple`
/// times as many pairs, relative to what was observed.
pub fn estimate_roi(
    estimated_library_size: u64,
    coverage_multiple: f64,
    read_pairs: u64,
    unique_read_pairs: u64,
) -> f64 {
    let library = estimated_library_size as f64;
    library * (1.0 - (-(coverage_multiple * read_pairs as f64) / library).exp())
        / unique_read_pairs as f64
}

/// One bin of the return-on-investment histogram.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoiBin {
    /// How many times the observed sequencing effort.
    pub coverage_multiple: u32,

    /// Unique pairs expected at that effort, relative to those observed.
    pub roi: f64,
}

/// Computes the expected return on investment for 1x to 100x the observed
/// sequencing effort. Empty when no library size is available.
pub fn roi_histogram(
    estimated_library_size: Option<u64>,
    read_pairs: u64,
    unique_read_pairs: u64,
) -> Vec<RoiBin> {
    let library = match estimated_library_size {
        Some(size) if size > 0 && unique_read_pairs > 0 => size,
        _ => return Vec::new(),
    };

    (1..=MAX_COVERAGE_MULTIPLE)
        .map(|x| RoiBin {
            coverage_multiple: x,
            roi: estimate_roi(library, f64::from(x), read_pairs, unique_read_pairs),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_estimate_satisfies_the_model() {
        let (n, c) = (10_000u64, 8_000u64);
        let size = estimate_library_size(n, c).unwrap() as f64;

        let expected_unique = size * (1.0 - (-(n as f64) / size).exp());
        assert!((expected_unique - c as f64).abs() / (c as f64) < 1e-3);
    }

    #[test]
    pub fn test_no_duplication_has_no_estimate() {
        assert_eq!(estimate_library_size(100, 100), None);
        assert_eq!(estimate_library_size(100, 0), None);
        assert_eq!(estimate_library_size(0, 0), None);
        assert_eq!(estimate_library_size(5, 6), None);
    }

    #[test]
    pub fn test_more_duplication_means_a_smaller_library() {
        let low = estimate_library_size(1_000, 950).unwrap();
        let high = estimate_library_size(1_000, 500).unwrap();
        assert!(high < low);
    }

    #[test]
    pub fn test_roi_histogram() {
        let size = estimate_library_size(1_000, 900);
        let histogram = roi_histogram(size, 1_000, 900);

        assert_eq!(histogram.len(), 100);
        assert_eq!(histogram[0].coverage_multiple, 1);
        // At 1x the model reproduces the observed unique pairs.
        assert!((histogram[0].roi - 1.0).abs() < 1e-2);
        assert!(histogram[99].roi > histogram[0].roi);

        assert!(roi_histogram(None, 1_000, 1_000).is_empty());
    }
}
