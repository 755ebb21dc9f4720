//! Transcript quantification from alignments with eXpress.

use std::path::PathBuf;

use tracing::info;

use super::Tool;
use crate::errors::Error;
use crate::errors::Result;
use crate::invoker::CommandLine;
use crate::samples::RecordUpdate;
use crate::samples::SampleStore;
use crate::samples::StageKind;
use crate::stages::descriptor::DataKind;
use crate::stages::naming::unit_stem;
use crate::stages::orchestrator::RunContext;
use crate::stages::step::Step;
use crate::utils::atomic;
use crate::utils::pathbuf::basename_of;

const EXPRESS: &str = "express";

/// The file listing every unit's results once the stage is done.
pub const RESULTS_FILE_NAME: &str = "express_results";

/// Quantifies each unit's alignment into
/// `<output_dir>/express_<original file name>/results.xprs`.
#[derive(Debug)]
pub struct Express {
    reference: PathBuf,
}

impl Express {
    /// Creates a new `Express` quantifying against `reference`.
    pub fn new(reference: PathBuf) -> Self {
        Self { reference }
    }
}

impl Tool for Express {
    fn kind(&self) -> StageKind {
        StageKind::Quantify
    }

    fn name(&self) -> &'static str {
        "express"
    }

    fn programs(&self) -> Vec<&'static str> {
        vec![EXPRESS]
    }

    fn consumes(&self) -> DataKind {
        DataKind::Alignment
    }

    fn steps(&self, store: &SampleStore, context: &RunContext) -> Result<Vec<Step>> {
        let records = store.records();
        let mut steps = Vec::new();

        for unit in store.units()? {
            let first = &records[unit.first()];
            let sam = first.alignment.as_ref().ok_or_else(|| {
                Error::InvalidStageOrder(format!(
                    "express needs an alignment, but {} has not been aligned",
                    unit_stem(first)
                ))
            })?;

            let out = context.output(format!("express_{}", basename_of(&first.original_file)));
            let results = out.join("results.xprs");

            let mut step = Step::new(format!("quantify {}", unit_stem(first)))
                .output(&results)
                .run(
                    CommandLine::new(context.program(EXPRESS))
                        .arg("--output-dir")
                        .arg(&out)
                        .arg("--no-update-check")
                        .args(["--additional-batch", "2"])
                        .arg("--output-align-prob")
                        .arg(&self.reference)
                        .arg(sam),
                )
                .update(unit.first(), RecordUpdate::quantification(&results));

            for i in unit.indices() {
                step = step.touch(i);
            }

            steps.push(step);
        }

        Ok(steps)
    }

    /// Writes `<output_dir>/express_results` with one
    /// `name,type,replicate,results` row per unit.
    fn finish(&self, store: &SampleStore, context: &RunContext) -> Result<()> {
        let records = store.records();
        let mut csv = String::new();

        for unit in store.units()? {
            let first = &records[unit.first()];

            if let Some(results) = &first.quantification {
                csv.push_str(&format!(
                    "{},{},{},{}\n",
                    first.name,
                    first.condition,
                    first.replicate,
                    results.display()
                ));
            }
        }

        let path = context.output(RESULTS_FILE_NAME);
        atomic::write(&path, csv)?;
        info!("  [*] Listed expression results in {}.", path.display());

        Ok(())
    }
}
