//! Marking of duplicate reads and pairs in aligned sequencing data.
//!
//! Reads (or pairs) that start at the same unclipped 5' positions on the same
//! strands, within the same library, are presumed to derive from one original
//! molecule. Within each such duplicate set the best scoring member is kept
//! and every other member is marked as a duplicate. Duplicate pairs whose
//! clusters sit close together on the flowcell are further classified as
//! optical duplicates.
//!
//! [`engine::DuplicateMarker`] is the entry point for library users, and
//! [`command::mark`] adapts BAM files to it.

pub mod anomalies;
pub mod command;
pub mod engine;
pub mod grouper;
pub mod keys;
pub mod library_size;
pub mod metrics;
pub mod optical;
pub mod physical;
pub mod record;
pub mod results;
pub mod selection;
pub mod set_sizes;
