//! Alignment with SNAP.

use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use super::bowtie2::sam_path;
use super::Tool;
use crate::errors::Result;
use crate::invoker::CommandLine;
use crate::samples::RecordUpdate;
use crate::samples::SampleStore;
use crate::samples::StageKind;
use crate::samples::Unit;
use crate::stages::naming::unit_stem;
use crate::stages::orchestrator::RunContext;
use crate::stages::step::Step;
use crate::utils::pathbuf::stem_of;

const SNAP: &str = "snap";

/// SNAP alignment parameters.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SnapParams {
    /// Report up to 20 alignments per read within 5 extra edits, for
    /// downstream expression quantification.
    pub expression: bool,
}

/// Aligns each unit with `snap paired` or `snap single`.
///
/// The index is a directory, `<output>/<reference stem>`, built once with
/// `snap index`.
#[derive(Debug)]
pub struct Snap {
    reference: PathBuf,
    params: SnapParams,
}

impl Snap {
    /// Creates a new `Snap` aligning to `reference`.
    pub fn new(reference: PathBuf, params: SnapParams) -> Self {
        Self { reference, params }
    }

    fn alignment_options(&self, command: CommandLine, context: &RunContext) -> CommandLine {
        let mut command = command
            .args(["-H", "300000", "-h", "2000", "-d", "30"])
            .arg("-t")
            .arg(context.threads.to_string())
            .args(["-b", "-M"]);

        if self.params.expression {
            command = command.args(["-om", "5", "-omax", "20"]);
        }

        command
    }
}

impl Tool for Snap {
    fn kind(&self) -> StageKind {
        StageKind::Align
    }

    fn name(&self) -> &'static str {
        "snap"
    }

    fn programs(&self) -> Vec<&'static str> {
        vec![SNAP]
    }

    fn steps(&self, store: &SampleStore, context: &RunContext) -> Result<Vec<Step>> {
        let dir = &context.output_dir;
        let records = store.records();
        let index = context.output(stem_of(&self.reference));

        let mut steps = vec![Step::new(format!("index {}", self.reference.display()))
            .output(index.join("GenomeIndex"))
            .run(
                CommandLine::new(context.program(SNAP))
                    .arg("index")
                    .arg(&self.reference)
                    .arg(&index)
                    .args(["-s", "20"])
                    .opt("-t", context.threads.to_string())
                    .arg("-bSpace"),
            )];

        for unit in store.units()? {
            let sam = sam_path(store, &unit, &index, dir);
            let mut command = CommandLine::new(context.program(SNAP));

            command = match unit {
                Unit::Paired { left, right } => command
                    .arg("paired")
                    .arg(&index)
                    .arg(&records[left].current)
                    .arg(&records[right].current)
                    .arg("-o")
                    .arg(&sam)
                    .args(["-s", "0", "1000"]),
                Unit::Single(i) => command
                    .arg("single")
                    .arg(&index)
                    .arg(&records[i].current)
                    .arg("-o")
                    .arg(&sam),
            };

            let mut step = Step::new(format!("align {}", unit_stem(&records[unit.first()])))
                .output(&sam)
                .run(self.alignment_options(command, context))
                .update(unit.first(), RecordUpdate::alignment(&sam));

            for i in unit.indices() {
                step = step.touch(i);
            }

            steps.push(step);
        }

        Ok(steps)
    }
}
