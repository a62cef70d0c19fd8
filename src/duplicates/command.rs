//! Functionality related to the `markdup mark` command itself.
//!
//! The BAM file is read twice. The first pass decodes each record into the
//! compact form the engine needs; the second pass re-reads the file and writes
//! every record with its duplicate flag set (or cleared) from the engine's
//! result for the record at the same position.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use anyhow::Context;
use clap::Args;
use noodles::sam;
use noodles::sam::AlignmentWriter;
use noodles::sam::record::data::field::Tag;
use noodles::sam::record::data::field::Value;
use noodles::sam::record::Flags;
use num_format::Locale;
use num_format::ToFormattedString;
use tracing::debug;
use tracing::info;

use crate::duplicates::engine::DuplicateMarker;
use crate::duplicates::engine::MarkDuplicatesConfig;
use crate::duplicates::optical::DEFAULT_MAX_OPTICAL_SET_SIZE;
use crate::duplicates::physical::IlluminaLocationParser;
use crate::duplicates::physical::NoLocationParser;
use crate::duplicates::physical::PhysicalLocationParser;
use crate::duplicates::physical::RegexLocationParser;
use crate::duplicates::record::Alignment;
use crate::duplicates::record::AlignmentRecord;
use crate::duplicates::record::DuplicateFlags;
use crate::duplicates::record::RecordFlags;
use crate::duplicates::selection::ScoreThenName;
use crate::duplicates::selection::ScoringStrategy;
use crate::utils::args::parse_pixel_distance;
use crate::utils::args::parse_threads;
use crate::utils::args::CompressionStrategy;
use crate::utils::cigar;
use crate::utils::display::RecordCounter;
use crate::utils::formats;
use crate::utils::formats::bam::ParsedBAMFile;
use crate::utils::read_groups::get_read_group;
use crate::utils::read_groups::libraries_by_read_group;

//========================//
// Command-line arguments //
//========================//

/// Command line arguments for `markdup mark`.
#[derive(Args)]
pub struct MarkArgs {
    /// Source BAM.
    #[arg(value_name = "BAM")]
    src: PathBuf,

    /// Destination BAM with duplicates marked.
    #[arg(short, long, value_name = "BAM")]
    output: PathBuf,

    /// Destination for the duplication metrics (JSON).
    #[arg(short, long, value_name = "JSON")]
    metrics: PathBuf,

    /// Maximum distance, in pixels, between two clusters for them to be
    /// considered optical duplicates.
    #[arg(long, default_value = "100", value_parser = parse_pixel_distance)]
    optical_pixel_distance: f64,

    /// Largest duplicate set that is checked for optical duplicates.
    #[arg(long, default_value_t = DEFAULT_MAX_OPTICAL_SET_SIZE)]
    max_optical_set_size: usize,

    /// Regular expression with three capture groups (tile, x and y) used to
    /// read the flowcell location from read names. By default, Illumina read
    /// names are expected.
    #[arg(long, value_name = "REGEX", conflicts_with = "skip_optical_duplicates")]
    read_name_regex: Option<String>,

    /// Do not look for optical duplicates.
    #[arg(long)]
    skip_optical_duplicates: bool,

    /// How reads are scored when choosing which member of a duplicate set to
    /// keep.
    #[arg(long, value_enum, default_value_t = ScoringStrategy::default())]
    scoring_strategy: ScoringStrategy,

    /// Which duplicates get a `DT` tag describing their origin.
    #[arg(long, value_enum, default_value_t = TaggingPolicy::DontTag)]
    tagging_policy: TaggingPolicy,

    /// Compression strategy for the output BAM.
    #[arg(long, value_enum, default_value_t = CompressionStrategy::Balanced)]
    compression: CompressionStrategy,

    /// Number of threads used to examine duplicate sets. Defaults to the
    /// number of available cores.
    #[arg(short, long, value_parser = parse_threads)]
    threads: Option<usize>,
}

/// Which duplicates receive a `DT` tag.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaggingPolicy {
    /// Never write `DT` tags.
    DontTag,

    /// Tag optical duplicates with `DT:Z:SQ`.
    OpticalOnly,

    /// Tag optical duplicates with `DT:Z:SQ` and all others with `DT:Z:LB`.
    All,
}

impl std::fmt::Display for TaggingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DontTag => write!(f, "dont-tag"),
            Self::OpticalOnly => write!(f, "optical-only"),
            Self::All => write!(f, "all"),
        }
    }
}

impl MarkArgs {
    fn location_parser(&self) -> anyhow::Result<Arc<dyn PhysicalLocationParser>> {
        if self.skip_optical_duplicates {
            return Ok(Arc::new(NoLocationParser));
        }

        match &self.read_name_regex {
            Some(pattern) => Ok(Arc::new(RegexLocationParser::new(pattern)?)),
            None => Ok(Arc::new(IlluminaLocationParser)),
        }
    }

    fn config(&self) -> anyhow::Result<MarkDuplicatesConfig> {
        Ok(MarkDuplicatesConfig {
            scoring: self.scoring_strategy,
            optical_pixel_distance: self.optical_pixel_distance,
            max_optical_set_size: self.max_optical_set_size,
            parser: self.location_parser()?,
            ordering: Arc::new(ScoreThenName),
        })
    }
}

//====================//
// Record conversions //
//====================//

/// Decodes the fields the engine needs from a BAM record.
pub fn to_alignment_record(
    record: &sam::alignment::Record,
    libraries: &HashMap<String, String>,
) -> AlignmentRecord {
    let flags = record.flags();

    let alignment = match (
        flags.is_unmapped(),
        record.reference_sequence_id(),
        record.alignment_start(),
    ) {
        (false, Some(id), Some(start)) => {
            let ops: Vec<_> = cigar::operations(record.cigar()).collect();
            let (leading, trailing) = cigar::clipped_lengths(ops.iter().copied());
            let span = cigar::reference_span(ops).max(1);
            let start = usize::from(start) as i64;

            Some(
                Alignment::new(id, start, start + span as i64 - 1)
                    .with_clipping(leading as i64, trailing as i64),
            )
        }
        _ => None,
    };

    let read_group = get_read_group(record);
    let library = read_group
        .as_ref()
        .and_then(|rg| libraries.get(rg))
        .cloned();

    AlignmentRecord {
        name: record
            .read_name()
            .map(|name| {
                let name: &str = name.as_ref();
                name.to_string()
            })
            .unwrap_or_default(),
        flags: RecordFlags {
            paired: flags.is_segmented(),
            unmapped: flags.is_unmapped(),
            mate_unmapped: flags.is_mate_unmapped(),
            reverse_complemented: flags.is_reverse_complemented(),
            first_segment: flags.is_first_segment(),
            last_segment: flags.is_last_segment(),
            secondary: flags.is_secondary(),
            supplementary: flags.is_supplementary(),
        },
        alignment,
        read_group,
        library,
        quality_scores: record
            .quality_scores()
            .as_ref()
            .iter()
            .map(|score| u8::from(*score))
            .collect(),
    }
}

/// Applies the marking result to a BAM record. The duplicate flag is always
/// rewritten; any existing `DT` tag is replaced unless tagging is disabled.
pub fn apply_flags(
    record: &mut sam::alignment::Record,
    flags: DuplicateFlags,
    policy: TaggingPolicy,
    tag: Tag,
) {
    record.flags_mut().set(Flags::DUPLICATE, flags.duplicate);

    if policy == TaggingPolicy::DontTag {
        return;
    }

    record.data_mut().remove(tag);

    let code = match (flags.duplicate_type(), policy) {
        (Some(kind), TaggingPolicy::All) => Some(kind.code()),
        (Some(kind), TaggingPolicy::OpticalOnly) if flags.optical_duplicate => Some(kind.code()),
        _ => None,
    };

    if let Some(code) = code {
        record
            .data_mut()
            .insert(tag, Value::String(code.to_string()));
    }
}

//==============//
// Main command //
//==============//

/// Main method for the `markdup mark` subcommand.
pub fn mark(args: MarkArgs) -> anyhow::Result<()> {
    info!("Starting mark subcommand.");

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .with_context(|| "configuring the thread pool")?;
    }

    let config = args.config()?;
    debug!("scoring strategy: {}", args.scoring_strategy);
    debug!("optical pixel distance: {}", args.optical_pixel_distance);
    debug!("tagging policy: {}", args.tagging_policy);

    // (1) Observe every record.
    let ParsedBAMFile {
        mut reader, header, ..
    } = formats::bam::open_and_parse(&args.src)?;
    let libraries = libraries_by_read_group(&header);

    let mut marker = DuplicateMarker::new(config);
    let mut counter = RecordCounter::new("Observed", None);

    for result in reader.records(&header) {
        let record = result.with_context(|| "reading BAM record")?;
        marker.observe(&to_alignment_record(&record, &libraries));
        counter.inc();
    }

    info!(
        "Observed {} records.",
        counter.get().to_formatted_string(&Locale::en)
    );

    // (2) Mark duplicates.
    let outcome = marker.finish();

    // (3) Write every record with its flags.
    let ParsedBAMFile {
        mut reader, header, ..
    } = formats::bam::open_and_parse(&args.src)?;
    let mut writer = formats::bam::create_with_header(
        &args.output,
        &header,
        args.compression.clone().into(),
    )?;

    let tag: Tag = "DT".parse()?;
    let mut counter = RecordCounter::new("Wrote", None);

    for (index, result) in reader.records(&header).enumerate() {
        let mut record = result.with_context(|| "reading BAM record")?;

        let flags = match outcome.flags.get(index) {
            Some(flags) => *flags,
            None => bail!(
                "{} changed between passes: more records than first observed",
                args.src.display()
            ),
        };

        apply_flags(&mut record, flags, args.tagging_policy, tag);
        writer
            .write_alignment_record(&header, &record)
            .with_context(|| "writing BAM record")?;
        counter.inc();
    }

    if counter.get() != outcome.flags.len() {
        bail!(
            "{} changed between passes: {} records observed but {} written",
            args.src.display(),
            outcome.flags.len(),
            counter.get()
        );
    }

    writer.try_finish().with_context(|| "finishing output BAM")?;

    // (4) Report.
    outcome.report.write(&args.metrics)?;
    info!("Wrote metrics to {}.", args.metrics.display());
    outcome.report.print_summary();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use noodles::core::Position;
    use noodles::sam::record::Cigar;
    use noodles::sam::record::QualityScores;
    use noodles::sam::record::ReadName;

    fn dt() -> Tag {
        "DT".parse().unwrap()
    }

    #[test]
    pub fn test_to_alignment_record() {
        let mut record = sam::alignment::Record::default();
        *record.read_name_mut() = Some("M:1:1101:10:20".parse::<ReadName>().unwrap());
        *record.flags_mut() = Flags::SEGMENTED | Flags::REVERSE_COMPLEMENTED | Flags::LAST_SEGMENT;
        *record.reference_sequence_id_mut() = Some(2);
        *record.alignment_start_mut() = Position::new(100);
        *record.cigar_mut() = "3S10M2D5M4H".parse::<Cigar>().unwrap();
        *record.quality_scores_mut() = "IIII".parse::<QualityScores>().unwrap();
        record
            .data_mut()
            .insert(Tag::ReadGroup, Value::String(String::from("rg0")));

        let mut libraries = HashMap::new();
        libraries.insert(String::from("rg0"), String::from("lib1"));

        let converted = to_alignment_record(&record, &libraries);
        assert_eq!(converted.name, "M:1:1101:10:20");
        assert!(converted.flags.paired);
        assert!(converted.flags.reverse_complemented);
        assert!(converted.flags.last_segment);
        assert_eq!(converted.read_group.as_deref(), Some("rg0"));
        assert_eq!(converted.library_name(), "lib1");
        assert_eq!(converted.quality_scores, vec![40; 4]);

        let alignment = converted.alignment.unwrap();
        assert_eq!(alignment.reference_sequence_id, 2);
        assert_eq!(alignment.start, 100);
        assert_eq!(alignment.end, 116);
        assert_eq!(alignment.unclipped_start(), 97);
        assert_eq!(alignment.unclipped_end(), 120);
    }

    #[test]
    pub fn test_unmapped_records_have_no_alignment() {
        let mut record = sam::alignment::Record::default();
        *record.flags_mut() = Flags::UNMAPPED;
        *record.reference_sequence_id_mut() = Some(0);
        *record.alignment_start_mut() = Position::new(100);

        let converted = to_alignment_record(&record, &HashMap::new());
        assert!(converted.is_unmapped());
        assert!(converted.alignment.is_none());
    }

    #[test]
    pub fn test_apply_flags_sets_and_clears_the_duplicate_flag() {
        let mut record = sam::alignment::Record::default();
        *record.flags_mut() = Flags::DUPLICATE;

        apply_flags(&mut record, DuplicateFlags::default(), TaggingPolicy::DontTag, dt());
        assert!(!record.flags().is_duplicate());

        apply_flags(&mut record, DuplicateFlags::duplicate(), TaggingPolicy::DontTag, dt());
        assert!(record.flags().is_duplicate());
        assert!(record.data().get(dt()).is_none());
    }

    #[test]
    pub fn test_tagging_policies() {
        let mut record = sam::alignment::Record::default();

        apply_flags(&mut record, DuplicateFlags::duplicate(), TaggingPolicy::All, dt());
        assert_eq!(record.data().get(dt()).and_then(|v| v.as_str()), Some("LB"));

        apply_flags(&mut record, DuplicateFlags::duplicate(), TaggingPolicy::OpticalOnly, dt());
        assert!(record.data().get(dt()).is_none());

        apply_flags(&mut record, DuplicateFlags::optical(), TaggingPolicy::OpticalOnly, dt());
        assert_eq!(record.data().get(dt()).and_then(|v| v.as_str()), Some("SQ"));

        apply_flags(&mut record, DuplicateFlags::default(), TaggingPolicy::All, dt());
        assert!(record.data().get(dt()).is_none());
    }

    #[test]
    pub fn test_marked_records_survive_a_bam_round_trip() {
        use noodles::bam;

        let header = sam::Header::default();
        let mut record = sam::alignment::Record::default();
        apply_flags(&mut record, DuplicateFlags::optical(), TaggingPolicy::All, dt());

        let mut writer = bam::Writer::new(Vec::new());
        writer.write_header(&header).unwrap();
        writer
            .write_reference_sequences(header.reference_sequences())
            .unwrap();
        writer.write_alignment_record(&header, &record).unwrap();
        let data = writer.into_inner().finish().unwrap();

        let mut reader = bam::Reader::new(&data[..]);
        reader.read_header().unwrap();
        reader.read_reference_sequences().unwrap();

        let records: Vec<_> = reader
            .records(&header)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].flags().is_duplicate());
        assert_eq!(
            records[0].data().get(dt()).and_then(|v| v.as_str()),
            Some("SQ")
        );
    }
}
