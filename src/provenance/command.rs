//! Functionality relating to the `readprep inspect` subcommand itself.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use itertools::Itertools;
use prettytable::row;
use prettytable::Table;

use super::log;
use super::log::LOG_FILE_NAME;

/// Clap arguments for the `readprep inspect` subcommand.
#[derive(Args)]
pub struct InspectArgs {
    /// Provenance log to display (defaults to the log in the current
    /// directory).
    #[arg(value_name = "LOG", default_value = LOG_FILE_NAME)]
    log: PathBuf,
}

/// Main function for the `readprep inspect` subcommand.
pub fn inspect(args: InspectArgs) -> anyhow::Result<()> {
    let store = log::read(&args.log)
        .with_context(|| format!("reading provenance log: {}", args.log.display()))?;

    let mut table = Table::new();
    table.add_row(row![
        "Name",
        "Type",
        "Replicate",
        "Mate",
        "Current",
        "Unpaired",
        "Processed"
    ]);

    for record in &store {
        let unpaired = record
            .unpaired
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let processed = record
            .processed
            .iter()
            .map(|(stage, tool)| format!("{}:{}", stage, tool))
            .join(", ");

        table.add_row(row![
            record.name,
            record.condition,
            record.replicate,
            record.mate,
            record.current.display(),
            unpaired,
            processed
        ]);
    }

    table.printstd();
    Ok(())
}
