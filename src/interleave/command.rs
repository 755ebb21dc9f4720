//! Functionality relating to the `readprep interleave` and
//! `readprep deinterleave` subcommands.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use super::codec;

/// Clap arguments for the `readprep interleave` subcommand.
#[derive(Args)]
pub struct InterleaveArgs {
    /// FASTQ file holding the first read of each pair.
    #[arg(value_name = "LEFT")]
    left: PathBuf,

    /// FASTQ file holding the second read of each pair.
    #[arg(value_name = "RIGHT")]
    right: PathBuf,

    /// Destination for the interleaved FASTQ.
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,
}

/// Clap arguments for the `readprep deinterleave` subcommand.
#[derive(Args)]
pub struct DeinterleaveArgs {
    /// Interleaved FASTQ file.
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Destination for the first read of each pair.
    #[arg(value_name = "LEFT")]
    left: PathBuf,

    /// Destination for the second read of each pair.
    #[arg(value_name = "RIGHT")]
    right: PathBuf,
}

/// Main function for the `readprep interleave` subcommand.
pub fn interleave(args: InterleaveArgs) -> anyhow::Result<()> {
    codec::interleave(&args.left, &args.right, &args.output).with_context(|| {
        format!(
            "interleaving {} and {}",
            args.left.display(),
            args.right.display()
        )
    })?;

    Ok(())
}

/// Main function for the `readprep deinterleave` subcommand.
pub fn deinterleave(args: DeinterleaveArgs) -> anyhow::Result<()> {
    codec::deinterleave(&args.input, &args.left, &args.right)
        .with_context(|| format!("de-interleaving {}", args.input.display()))?;

    Ok(())
}
