//! Local data quality problems that degrade marking for a single record but
//! never stop a run.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Number of warnings logged per kind of anomaly before going quiet.
const MAX_WARNINGS: usize = 100;

/// A recoverable problem with a single record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anomaly {
    /// The physical location could not be parsed from the read name, so the
    /// record is left out of optical duplicate detection.
    MalformedRecord,

    /// The record claims a mapped mate that never appeared, so it is keyed as
    /// an unpaired read.
    InconsistentMateInfo,
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anomaly::MalformedRecord => write!(f, "physical location unavailable"),
            Anomaly::InconsistentMateInfo => write!(f, "mate could not be resolved"),
        }
    }
}

/// Running tally of anomalies.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyCounts {
    /// Paired records whose read name carried no physical location.
    pub malformed_records: usize,

    /// Records demoted to unpaired keying.
    pub inconsistent_mate_info: usize,
}

impl AnomalyCounts {
    /// Records an anomaly for the named record, logging the first few of
    /// each kind.
    pub fn record(&mut self, anomaly: Anomaly, read_name: &str) {
        let count = match anomaly {
            Anomaly::MalformedRecord => &mut self.malformed_records,
            Anomaly::InconsistentMateInfo => &mut self.inconsistent_mate_info,
        };

        *count += 1;

        match *count {
            1..=MAX_WARNINGS => warn!("{}: {}", anomaly, read_name),
            n if n == MAX_WARNINGS + 1 => warn!(
                "Too many warnings about records with {}. Stopping warnings.",
                anomaly
            ),
            _ => (),
        }
    }

    /// Logs a summary line for each kind that went past the warning limit.
    pub fn summarize(&self) {
        if self.malformed_records > MAX_WARNINGS {
            warn!(
                "{} records had no usable physical location.",
                self.malformed_records
            );
        }

        if self.inconsistent_mate_info > MAX_WARNINGS {
            warn!(
                "{} records were keyed as unpaired because their mate was missing.",
                self.inconsistent_mate_info
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_counts_every_anomaly() {
        let mut counts = AnomalyCounts::default();

        for _ in 0..150 {
            counts.record(Anomaly::MalformedRecord, "read");
        }
        counts.record(Anomaly::InconsistentMateInfo, "read");

        assert_eq!(counts.malformed_records, 150);
        assert_eq!(counts.inconsistent_mate_info, 1);
    }
}
