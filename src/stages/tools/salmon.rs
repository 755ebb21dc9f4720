//! Transcript quantification with Salmon.

use std::path::PathBuf;

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
use crate::utils::pathbuf::basename_of;
use crate::utils::pathbuf::stem_of;

const SALMON: &str = "salmon";

/// Quantifies each unit into `<output_dir>/salmon_<original file name>`.
///
/// A unit whose first record carries an alignment is quantified from that
/// alignment. Otherwise its reads are quantified against an index of the
/// reference, built once into `<output_dir>/<reference stem>_index`.
#[derive(Debug)]
pub struct Salmon {
    reference: PathBuf,
}

impl Salmon {
    /// Creates a new `Salmon` quantifying against `reference`.
    pub fn new(reference: PathBuf) -> Self {
        Self { reference }
    }

    fn index_step(&self, context: &RunContext) -> (Step, PathBuf) {
        let index = context.output(format!("{}_index", stem_of(&self.reference)));
        let step = Step::new(format!("index {}", self.reference.display()))
            .output(index.join("versionInfo.json"))
            .run(
                CommandLine::new(context.program(SALMON))
                    .arg("index")
                    .arg("--index")
                    .arg(&index)
                    .arg("--transcripts")
                    .arg(&self.reference)
                    .arg("--threads")
                    .arg(context.threads.to_string()),
            );

        (step, index)
    }
}

impl Tool for Salmon {
    fn kind(&self) -> StageKind {
        StageKind::Quantify
    }

    fn name(&self) -> &'static str {
        "salmon"
    }

    fn programs(&self) -> Vec<&'static str> {
        vec![SALMON]
    }

    fn steps(&self, store: &SampleStore, context: &RunContext) -> Result<Vec<Step>> {
        let records = store.records();
        let units = store.units()?;
        let (index_step, index) = self.index_step(context);

        let mut steps = Vec::new();
        if units.iter().any(|unit| records[unit.first()].alignment.is_none()) {
            steps.push(index_step);
        }

        for unit in units {
            let first = &records[unit.first()];
            let out = context.output(format!("salmon_{}", basename_of(&first.original_file)));
            let quant = out.join("quant.sf");
            let command = CommandLine::new(context.program(SALMON)).arg("quant");

            let command = match &first.alignment {
                Some(sam) => command
                    .args(["--libType", "IU"])
                    .arg("--alignments")
                    .arg(sam)
                    .arg("--targets")
                    .arg(&self.reference)
                    .arg("--threads")
                    .arg(context.threads.to_string())
                    .arg("--useErrorModel"),
                None => {
                    let command = match unit {
                        Unit::Paired { left, right } => command
                            .args(["--libType", "IU"])
                            .arg("-1")
                            .arg(&records[left].current)
                            .arg("-2")
                            .arg(&records[right].current),
                        Unit::Single(i) => command
                            .args(["--libType", "U"])
                            .arg("-r")
                            .arg(&records[i].current),
                    };

                    command
                        .arg("--index")
                        .arg(&index)
                        .arg("--threads")
                        .arg(context.threads.to_string())
                }
            };

            let mut step = Step::new(format!("quantify {}", unit_stem(first)))
                .output(&quant)
                .run(command.arg("--output").arg(&out))
                .update(unit.first(), RecordUpdate::quantification(&quant));

            for i in unit.indices() {
                step = step.touch(i);
            }

            steps.push(step);
        }

        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::Mate;
    use crate::samples::SampleRecord;

    #[test]
    fn test_reads_are_indexed_once() {
        let store: SampleStore = vec![
            SampleRecord::new("s", "s", 1, Mate::Single, "/data/a.fq"),
            SampleRecord::new("s", "s", 2, Mate::Single, "/data/b.fq"),
        ]
        .into_iter()
        .collect();

        let tool = Salmon::new(PathBuf::from("/ref/transcripts.fa"));
        let steps = tool.steps(&store, &RunContext::new("/out")).unwrap();
        assert_eq!(steps.len(), 3);

        assert_eq!(
            steps[0].outputs,
            vec![PathBuf::from("/out/transcripts_index/versionInfo.json")]
        );
        assert_eq!(
            steps[2].tasks[0].to_string(),
            "salmon quant --libType U -r /data/b.fq --index /out/transcripts_index \
            --threads 1 --output /out/salmon_b.fq"
        );
        assert_eq!(
            steps[2].outputs,
            vec![PathBuf::from("/out/salmon_b.fq/quant.sf")]
        );
    }

    #[test]
    fn test_alignments_skip_the_index() {
        let mut left = SampleRecord::new("s", "A", 1, Mate::One, "/data/a_1.fq");
        left.alignment = Some(PathBuf::from("/out/a.sam"));
        let right = SampleRecord::new("s", "A", 1, Mate::Two, "/data/a_2.fq");
        let store: SampleStore = vec![left, right].into_iter().collect();

        let tool = Salmon::new(PathBuf::from("/ref/transcripts.fa"));
        let steps = tool.steps(&store, &RunContext::new("/out")).unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(
            steps[0].tasks[0].to_string(),
            "salmon quant --libType IU --alignments /out/a.sam --targets /ref/transcripts.fa \
            --threads 1 --useErrorModel --output /out/salmon_a_1.fq"
        );
        assert_eq!(steps[0].records, vec![0, 1]);
    }
}
