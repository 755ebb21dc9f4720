//! Quality trimming with Skewer.

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use super::Tool;
use crate::errors::Result;
use crate::invoker::CommandLine;
use crate::samples::RecordUpdate;
use crate::samples::SampleStore;
use crate::samples::StageKind;
use crate::samples::Unit;
use crate::stages::naming::record_stem;
use crate::stages::naming::unit_stem;
use crate::stages::orchestrator::RunContext;
use crate::stages::step::Step;

const SKEWER: &str = "skewer";

/// Skewer's trimming thresholds.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SkewerParams {
    /// Trim 3' bases below this quality.
    pub end_quality: u32,

    /// Drop reads whose mean quality is below this.
    pub mean_quality: u32,

    /// Drop reads shorter than this after trimming.
    pub min_length: u32,

    /// Drop reads that are mostly `N`s.
    pub filter_n: bool,
}

impl Default for SkewerParams {
    fn default() -> Self {
        Self {
            end_quality: 25,
            mean_quality: 0,
            min_length: 40,
            filter_n: true,
        }
    }
}

/// Trims each pair in `pe` mode or each single file in `tail` mode.
///
/// Skewer names its outputs after the `-o` prefix: `<prefix>-trimmed-pair1.fastq`
/// and `<prefix>-trimmed-pair2.fastq` for pairs, `<prefix>-trimmed.fastq`
/// otherwise. Unpaired reads are left as they are.
#[derive(Debug)]
pub struct Skewer {
    params: SkewerParams,
}

impl Skewer {
    /// Creates a new `Skewer`.
    pub fn new(params: SkewerParams) -> Self {
        Self { params }
    }

    fn command(&self, context: &RunContext, mode: &str, prefix: &Path) -> CommandLine {
        let p = &self.params;
        let mut command = CommandLine::new(context.program(SKEWER))
            .arg("-m")
            .arg(mode)
            .arg("-q")
            .arg(p.end_quality.to_string())
            .arg("-Q")
            .arg(p.mean_quality.to_string())
            .arg("-l")
            .arg(p.min_length.to_string());

        if p.filter_n {
            command = command.arg("-n");
        }

        command
            .arg("-t")
            .arg(context.threads.to_string())
            .arg("-o")
            .arg(prefix)
    }
}

fn trimmed(prefix: &Path, suffix: &str) -> PathBuf {
    PathBuf::from(format!("{}-trimmed{}.fastq", prefix.display(), suffix))
}

impl Tool for Skewer {
    fn kind(&self) -> StageKind {
        StageKind::Trim
    }

    fn name(&self) -> &'static str {
        "skewer"
    }

    fn programs(&self) -> Vec<&'static str> {
        vec![SKEWER]
    }

    fn steps(&self, store: &SampleStore, context: &RunContext) -> Result<Vec<Step>> {
        let records = store.records();
        let mut steps = Vec::new();

        for unit in store.units()? {
            let step = match unit {
                Unit::Paired { left: l, right: r } => {
                    let (left, right) = (&records[l], &records[r]);
                    let prefix = context.output(unit_stem(left));
                    let left_out = trimmed(&prefix, "-pair1");
                    let right_out = trimmed(&prefix, "-pair2");

                    Step::new(format!("trim {}", unit_stem(left)))
                        .output(&left_out)
                        .output(&right_out)
                        .run(
                            self.command(context, "pe", &prefix)
                                .arg(&left.current)
                                .arg(&right.current),
                        )
                        .update(l, RecordUpdate::current(&left_out))
                        .update(r, RecordUpdate::current(&right_out))
                }
                Unit::Single(i) => {
                    let record = &records[i];
                    let prefix = context.output(record_stem(record));
                    let out = trimmed(&prefix, "");

                    Step::new(format!("trim {}", record_stem(record)))
                        .output(&out)
                        .run(self.command(context, "tail", &prefix).arg(&record.current))
                        .update(i, RecordUpdate::current(&out))
                }
            };

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
    fn test_paired_and_single_trimming() {
        let store: SampleStore = vec![
            SampleRecord::new("s", "A", 1, Mate::One, "/data/s_1.fq"),
            SampleRecord::new("s", "A", 1, Mate::Two, "/data/s_2.fq"),
            SampleRecord::new("u", "B", 1, Mate::Single, "/data/u.fq"),
        ]
        .into_iter()
        .collect();

        let tool = Skewer::new(SkewerParams::default());
        let steps = tool
            .steps(&store, &RunContext::new("/out").with_threads(4))
            .unwrap();
        assert_eq!(steps.len(), 2);

        assert_eq!(
            steps[0].tasks[0].to_string(),
            "skewer -m pe -q 25 -Q 0 -l 40 -n -t 4 -o /out/s_A_1 /data/s_1.fq /data/s_2.fq"
        );
        assert_eq!(
            steps[0].outputs,
            vec![
                PathBuf::from("/out/s_A_1-trimmed-pair1.fastq"),
                PathBuf::from("/out/s_A_1-trimmed-pair2.fastq"),
            ]
        );
        assert_eq!(
            steps[0].updates[1],
            (1, RecordUpdate::current("/out/s_A_1-trimmed-pair2.fastq"))
        );

        assert_eq!(
            steps[1].tasks[0].to_string(),
            "skewer -m tail -q 25 -Q 0 -l 40 -n -t 4 -o /out/u_B_1 /data/u.fq"
        );
        assert_eq!(steps[1].outputs, vec![PathBuf::from("/out/u_B_1-trimmed.fastq")]);
    }
}
