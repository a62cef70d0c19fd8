//! The report produced at the end of a duplicate marking run.

use std::fs;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::Context;
use num_format::Locale;
use num_format::ToFormattedString;
use prettytable::row;
use prettytable::Table;
use serde::Deserialize;
use serde::Serialize;

use crate::duplicates::anomalies::AnomalyCounts;
use crate::duplicates::library_size::RoiBin;
use crate::duplicates::metrics::DuplicationMetrics;
use crate::duplicates::set_sizes::SetSizeHistograms;
use crate::utils::display::PercentageFormat;

/// Everything reported about a run.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DuplicationReport {
    /// Metrics aggregated over every library.
    pub metrics: DuplicationMetrics,

    /// Metrics for each library, in the order the libraries were first seen.
    pub libraries: Vec<DuplicationMetrics>,

    /// Set size histograms over every library.
    pub histograms: SetSizeHistograms,

    /// Expected return on investment of further sequencing, computed from
    /// the aggregate library size estimate.
    pub roi: Vec<RoiBin>,

    /// Recoverable problems encountered along the way.
    pub anomalies: AnomalyCounts,
}

impl DuplicationReport {
    /// Attempts to write the report as pretty printed JSON.
    pub fn write(&self, filepath: impl AsRef<Path>) -> anyhow::Result<()> {
        let path = filepath.as_ref();

        let mut file = File::create(path)
            .with_context(|| format!("Could not create metrics file: {}", path.display()))?;
        let output = serde_json::to_string_pretty(&self)?;
        file.write_all(output.as_bytes())
            .with_context(|| format!("Could not write metrics file: {}", path.display()))?;

        Ok(())
    }

    /// Attempts to read a report from a file.
    pub fn read(filepath: impl AsRef<Path>) -> anyhow::Result<DuplicationReport> {
        let path = filepath.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Could not read metrics file: {}", path.display()))?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Builds a table with one row per library followed by the aggregate.
    pub fn summary_table(&self) -> Table {
        let mut table = Table::new();

        table.add_row(row![
            "Library",
            "Unpaired",
            "Pairs",
            "Unpaired Dups",
            "Pair Dups",
            "Optical Dups",
            "Duplication",
            "Library Size"
        ]);

        for metrics in self.libraries.iter().chain(std::iter::once(&self.metrics)) {
            let examined = metrics.unpaired_reads_examined + metrics.read_pairs_examined * 2;

            table.add_row(row![
                metrics.library,
                r->metrics.unpaired_reads_examined.to_formatted_string(&Locale::en),
                r->metrics.read_pairs_examined.to_formatted_string(&Locale::en),
                r->metrics.unpaired_read_duplicates.to_formatted_string(&Locale::en),
                r->metrics.read_pair_duplicates.to_formatted_string(&Locale::en),
                r->metrics.read_pair_optical_duplicates.to_formatted_string(&Locale::en),
                r->PercentageFormat(metrics.duplicate_reads(), examined),
                r->metrics
                    .estimated_library_size
                    .map(|size| size.to_formatted_string(&Locale::en))
                    .unwrap_or_else(|| String::from("N/A"))
            ]);
        }

        table
    }

    /// Prints [`DuplicationReport::summary_table`] to stdout.
    pub fn print_summary(&self) {
        self.summary_table().printstd();
    }
}
