//! Interleaving and de-interleaving of paired FASTQ files.

pub mod codec;
pub mod command;

pub use codec::deinterleave;
pub use codec::interleave;
