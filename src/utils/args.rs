//! Utilities related to the parsing of arguments.

use std::fmt::Display;

use noodles::bgzf::writer::CompressionLevel;

//======================//
// Compression Strategy //
//======================//

/// An enum representing the compression strategy to follow.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum CompressionStrategy {
    /// Compress the file as much as possible (maximum gzip compression).
    Best,

    /// Balance the compression level and the speed of the compression process.
    Balanced,

    /// Compress the file as quickly as possible (minimum gzip compression without
    /// turning off compression altogether).
    Fastest,
}

impl Display for CompressionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Balanced => write!(f, "balanced"),
            Self::Best => write!(f, "best"),
            Self::Fastest => write!(f, "fastest"),
        }
    }
}

impl From<CompressionStrategy> for CompressionLevel {
    fn from(strategy: CompressionStrategy) -> Self {
        match strategy {
            CompressionStrategy::Balanced => CompressionLevel::default(),
            CompressionStrategy::Best => CompressionLevel::best(),
            CompressionStrategy::Fastest => CompressionLevel::fast(),
        }
    }
}

//===============//
// Value parsers //
//===============//

/// Parses a pixel distance, which must be a finite, non-negative number.
pub fn parse_pixel_distance(s: &str) -> Result<f64, String> {
    let distance: f64 = s
        .parse()
        .map_err(|_| format!("`{}` is not a number", s))?;

    if !distance.is_finite() || distance < 0.0 {
        return Err(format!(
            "pixel distance must be a finite, non-negative number, found {}",
            s
        ));
    }

    Ok(distance)
}

/// Parses a thread count, which must be a positive integer.
pub fn parse_threads(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err(String::from("the number of threads must be at least one")),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("`{}` is not a positive integer", s)),
    }
}
