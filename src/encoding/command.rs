//! Functionality relating to the `readprep encoding` subcommand itself.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use tracing::info;

use super::compute;
use super::compute::DEFAULT_SAMPLE_RECORDS;
use crate::utils::args::NumberOfRecords;

/// Clap arguments for the `readprep encoding` subcommand.
#[derive(Args)]
pub struct EncodingArgs {
    /// Source FASTQ file (optionally gzipped).
    #[arg(value_name = "FASTQ")]
    src: PathBuf,

    /// Only examine the first n records in the file ("all" for every record).
    #[arg(short = 'n', long, value_name = "USIZE", default_value_t = NumberOfRecords::Some(DEFAULT_SAMPLE_RECORDS))]
    num_records: NumberOfRecords,
}

/// Main function for the `readprep encoding` subcommand.
pub fn encoding(args: EncodingArgs) -> anyhow::Result<()> {
    info!("Starting encoding subcommand.");

    // (1) Sample the head of the file and classify the quality characters.
    let result = compute::predict(&args.src, args.num_records)
        .with_context(|| format!("detecting the encoding of {}", args.src.display()))?;

    // (2) Print the output to stdout as JSON.
    let output = serde_json::to_string_pretty(&result)?;
    println!("{}", output);

    Ok(())
}
