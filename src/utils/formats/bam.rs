//! Utilities related to opening and manipulating Binary Alignment Map (BAM) files.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::bail;
use anyhow::Context;
use noodles::bam;
use noodles::bgzf;
use noodles::bgzf::writer::CompressionLevel;
use tracing::debug;

use super::is_bam;

//==================================//
// Binary Alignment Map (BAM) files //
//==================================//

/// Attempts to open a BAM file from a given source. Note that this file is private
/// because it should never be called by an external module (use [`open_and_parse`]
/// instead).
fn open<P>(src: P) -> anyhow::Result<bam::Reader<bgzf::Reader<BufReader<File>>>>
where
    P: AsRef<Path>,
{
    let path = src.as_ref();

    if !is_bam(path) {
        bail!("input must be a BAM file: {}", path.display());
    }

    let reader = File::open(path)
        .map(BufReader::new)
        .with_context(|| format!("opening src BAM file: {}", path.display()))?;
    Ok(bam::Reader::new(reader))
}

/// Contains the BAM file reader and the parsed header from the BAM file. The
/// binary reference sequences have already been consumed from the reader.
pub struct ParsedBAMFile {
    /// A reader for the BAM file, positioned at the first record.
    pub reader: bam::Reader<bgzf::Reader<BufReader<File>>>,

    /// The header, after common mistakes have been corrected.
    pub header: noodles::sam::Header,
}

/// Opens and subsequently parses a BAM file's header. This is useful when opening BAM
/// files when you want the corrections applied by
/// [`super::sam::correct_common_header_mistakes`] to apply.
pub fn open_and_parse<P>(src: P) -> anyhow::Result<ParsedBAMFile>
where
    P: AsRef<Path>,
{
    // (1) Construct the reader.
    debug!("reading BAM file from disk");
    let mut reader = open(&src)?;

    // (2) Parse the header and reference sequences.
    debug!("parsing the header and reference sequences");
    let raw_header = reader.read_header().with_context(|| "reading header")?;
    let header = super::sam::parse_header(raw_header).with_context(|| "parsing header")?;
    reader
        .read_reference_sequences()
        .with_context(|| "reading reference sequences")?;

    // (3) Return the result.
    Ok(ParsedBAMFile { reader, header })
}

/// Creates a BAM writer at the given destination and writes the header to it.
pub fn create_with_header<P>(
    dst: P,
    header: &noodles::sam::Header,
    compression_level: CompressionLevel,
) -> anyhow::Result<bam::Writer<bgzf::Writer<File>>>
where
    P: AsRef<Path>,
{
    let path = dst.as_ref();

    if !is_bam(path) {
        bail!("output must be a BAM file: {}", path.display());
    }

    let mut writer = File::create(path)
        .map(|f| {
            bgzf::writer::Builder::default()
                .set_compression_level(compression_level)
                .build_with_writer(f)
        })
        .map(bam::Writer::from)
        .with_context(|| format!("opening output filestream: {}", path.display()))?;

    writer.write_header(header)?;
    writer.write_reference_sequences(header.reference_sequences())?;

    Ok(writer)
}
