//! Utilities related to read groups.

use std::collections::HashMap;

use noodles::sam::alignment::Record;
use noodles::sam::header;
use noodles::sam::record::data::field::Tag;
use tracing::debug;
use tracing::warn;

/// Maps each read group declared in the header to its library (`LB`). Read
/// groups that do not declare a library are left out.
pub fn libraries_by_read_group(header: &header::Header) -> HashMap<String, String> {
    let mut libraries = HashMap::new();

    for (id, read_group) in header.read_groups() {
        match read_group.library() {
            Some(library) => {
                debug!("read group {} belongs to library {}", id, library);
                libraries.insert(id.to_string(), library.to_string());
            }
            None => warn!("read group {} does not declare a library", id),
        }
    }

    libraries
}

/// Gets the read group of a record, if it has one.
pub fn get_read_group(record: &Record) -> Option<String> {
    record
        .data()
        .get(Tag::ReadGroup)
        .and_then(|value| value.as_str())
        .map(String::from)
}
