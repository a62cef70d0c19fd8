//! `markdup` is a command line tool written to mark duplicate reads in
//! next-generation sequencing data. This package is composed of both a
//! library crate, as well as a binary crate.
//!
//! This documentation generally refers to the library crate documentation for
//! use by developers embedding the duplicate marking engine. The engine lives
//! in [`duplicates`]; the `markdup mark` command reads and writes BAM files
//! around it.
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]

pub mod duplicates;
pub mod utils;
