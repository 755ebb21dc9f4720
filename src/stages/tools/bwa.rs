//! Alignment with `bwa mem`.

use std::path::PathBuf;

use super::bowtie2::sam_path;
use super::Tool;
use crate::errors::Result;
use crate::invoker::CommandLine;
use crate::samples::RecordUpdate;
use crate::samples::SampleStore;
use crate::samples::StageKind;
use crate::stages::naming::unit_stem;
use crate::stages::orchestrator::RunContext;
use crate::stages::step::Step;
use crate::utils::pathbuf::basename_of;

const BWA: &str = "bwa";

/// Aligns reads with `bwa mem`, which writes its SAM records to standard
/// output. The index is built with `bwa index -p` directly into the output
/// directory.
#[derive(Debug)]
pub struct Bwa {
    reference: PathBuf,
}

impl Bwa {
    /// Creates a new `Bwa` aligning to `reference`.
    pub fn new(reference: PathBuf) -> Self {
        Self { reference }
    }
}

impl Tool for Bwa {
    fn kind(&self) -> StageKind {
        StageKind::Align
    }

    fn name(&self) -> &'static str {
        "bwa"
    }

    fn programs(&self) -> Vec<&'static str> {
        vec![BWA]
    }

    fn steps(&self, store: &SampleStore, context: &RunContext) -> Result<Vec<Step>> {
        let dir = &context.output_dir;
        let records = store.records();
        let index = context.output(basename_of(&self.reference));

        let mut steps = vec![Step::new(format!("index {}", self.reference.display()))
            .output(format!("{}.bwt", index.display()))
            .run(
                CommandLine::new(context.program(BWA))
                    .arg("index")
                    .arg("-p")
                    .arg(&index)
                    .arg(&self.reference),
            )];

        for unit in store.units()? {
            let sam = sam_path(store, &unit, &index, dir);
            let mut command = CommandLine::new(context.program(BWA))
                .arg("mem")
                .arg("-t")
                .arg(context.threads.to_string())
                .arg(&index);

            for i in unit.indices() {
                command = command.arg(&records[i].current);
            }

            let mut step = Step::new(format!("align {}", unit_stem(&records[unit.first()])))
                .output(&sam)
                .run(command.stdout_to(&sam))
                .update(unit.first(), RecordUpdate::alignment(&sam));

            for i in unit.indices() {
                step = step.touch(i);
            }

            steps.push(step);
        }

        Ok(steps)
    }
}
