//! `readprep` is a command line tool that runs short-read sequencing data
//! through a chain of preprocessing stages (decompression, trimming, error
//! correction, normalization, contaminant filtering, alignment and
//! quantification), each performed by an external tool. This package is
//! composed of both a library crate, as well as a binary crate.
//!
//! Every stage skips work whose output already exists, so an interrupted
//! run can be restarted with the same arguments and picks up where it
//! stopped. After each stage, the state of every sample is written to a
//! provenance log in the output directory.
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![warn(rust_2021_compatibility)]

pub mod encoding;
pub mod errors;
pub mod interleave;
pub mod invoker;
pub mod provenance;
pub mod samples;
pub mod stages;
pub mod stats;
pub mod utils;

pub use errors::Error;
pub use errors::Result;
