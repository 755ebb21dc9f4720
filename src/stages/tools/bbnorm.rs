//! Digital normalization with BBNorm.

use serde::Deserialize;
use serde::Serialize;

use super::Tool;
use crate::errors::Result;
use crate::invoker::CommandLine;
use crate::samples::RecordUpdate;
use crate::samples::SampleStore;
use crate::samples::StageKind;
use crate::samples::Unit;
use crate::stages::naming::record_output;
use crate::stages::naming::unit_stem;
use crate::stages::orchestrator::RunContext;
use crate::stages::step::Step;

/// BBNorm's parameters.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct BbnormParams {
    /// k-mer length.
    pub k: u32,

    /// Target depth of coverage.
    pub target: u32,

    /// Bits per count cell.
    pub bits: u32,

    /// Number of hash functions.
    pub hashes: u32,

    /// Reads with depth below this are treated as errors.
    pub lowthresh: u32,

    /// Kmers with depth below this are ignored.
    pub mindepth: u32,

    /// Reads need at least this many kmers over `mindepth` to be kept.
    pub minkmers: u32,
}

impl Default for BbnormParams {
    fn default() -> Self {
        Self {
            k: 31,
            target: 20,
            bits: 8,
            hashes: 3,
            lowthresh: 1,
            mindepth: 1,
            minkmers: 15,
        }
    }
}

/// Normalizes each pair (or single file) to `<stem>.bbnorm.fq`.
#[derive(Debug)]
pub struct Bbnorm {
    params: BbnormParams,
}

impl Bbnorm {
    /// Creates a new `Bbnorm`.
    pub fn new(params: BbnormParams) -> Self {
        Self { params }
    }

    fn settings(&self, context: &RunContext) -> Vec<String> {
        let p = &self.params;
        vec![
            format!("k={}", p.k),
            format!("hashes={}", p.hashes),
            format!("bits={}", p.bits),
            format!("lowthresh={}", p.lowthresh),
            format!("mindepth={}", p.mindepth),
            format!("minkmers={}", p.minkmers),
            format!("target={}", p.target),
            format!("threads={}", context.threads),
            format!("-Xmx{}g", context.memory),
        ]
    }
}

impl Tool for Bbnorm {
    fn kind(&self) -> StageKind {
        StageKind::Normalize
    }

    fn name(&self) -> &'static str {
        "bbnorm"
    }

    fn programs(&self) -> Vec<&'static str> {
        vec!["bbnorm.sh"]
    }

    fn steps(&self, store: &SampleStore, context: &RunContext) -> Result<Vec<Step>> {
        let dir = &context.output_dir;
        let records = store.records();
        let mut steps = Vec::new();

        for unit in store.units()? {
            let first = &records[unit.first()];
            let mut command = CommandLine::new(context.program("bbnorm.sh"));
            let mut step = Step::new(format!("normalize {}", unit_stem(first)));

            match unit {
                Unit::Paired { left: l, right: r } => {
                    let left_out = record_output(dir, &records[l], "bbnorm.fq");
                    let right_out = record_output(dir, &records[r], "bbnorm.fq");
                    command = command
                        .opt("in=", &records[l].current)
                        .opt("in2=", &records[r].current)
                        .opt("out=", &left_out)
                        .opt("out2=", &right_out);
                    step = step
                        .output(&left_out)
                        .output(&right_out)
                        .update(l, RecordUpdate::current(left_out))
                        .update(r, RecordUpdate::current(right_out));
                }
                Unit::Single(i) => {
                    let out = record_output(dir, &records[i], "bbnorm.fq");
                    command = command
                        .opt("in=", &records[i].current)
                        .opt("out=", &out);
                    step = step.output(&out).update(i, RecordUpdate::current(out));
                }
            }

            steps.push(step.run(command.args(self.settings(context))));
        }

        Ok(steps)
    }
}
