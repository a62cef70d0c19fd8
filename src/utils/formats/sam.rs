//! Utilities related to Sequence Alignment Map (SAM) headers.

use anyhow::Context;
use noodles::sam;
use regex::Captures;
use regex::Regex;

/// Corrects common header mistakes. See the inline comments for the things that
/// are automatically corrected.
pub fn correct_common_header_mistakes(header: String) -> anyhow::Result<String> {
    // (1) Corrects any lowercase platform units in the read group to be all
    // uppercase. This is especially important for data that contains 'illumina'
    // instead of the correct 'ILLUMINA'.
    let pattern = Regex::new("(\tPL:)([^\t\n]+)")?;
    let replaced = pattern.replace_all(&header, |c: &Captures<'_>| {
        format!("{}{}", &c[1], c[2].to_uppercase())
    });

    Ok(replaced.to_string())
}

/// Parses a SAM/BAM header from a string while also correcting common header
/// mistakes.
pub fn parse_header(header: String) -> anyhow::Result<sam::Header> {
    correct_common_header_mistakes(header)?
        .parse::<sam::Header>()
        .with_context(|| "Could not parse SAM/BAM header.")
}
