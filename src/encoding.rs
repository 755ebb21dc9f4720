//! Detection of the Phred offset used by a FASTQ file's quality lines.

pub mod command;
pub mod compute;

pub use compute::detect;
pub use compute::PhredOffset;
