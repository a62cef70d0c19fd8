//! Utilities that are used across the `markdup` subcommands.

pub mod args;
pub mod cigar;
pub mod display;
pub mod formats;
pub mod histogram;
pub mod read_groups;
