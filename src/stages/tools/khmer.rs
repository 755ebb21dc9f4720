//! Digital normalization with khmer's `normalize-by-median.py`.

use std::path::Path;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;

use super::Tool;
use crate::errors::Error;
use crate::errors::Result;
use crate::invoker::CommandLine;
use crate::samples::RecordUpdate;
use crate::samples::SampleStore;
use crate::samples::StageKind;
use crate::samples::Unit;
use crate::stages::naming::unit_stem;
use crate::stages::orchestrator::RunContext;
use crate::stages::step::Step;
use crate::stages::step::Task;

const NORMALIZE_BY_MEDIAN: &str = "normalize-by-median.py";

/// khmer's parameters.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct KhmerParams {
    /// k-mer length.
    pub k: u32,

    /// Median k-mer coverage above which reads are discarded.
    pub cutoff: u32,

    /// Number of count tables.
    pub tables: u32,
}

impl Default for KhmerParams {
    fn default() -> Self {
        Self {
            k: 23,
            cutoff: 20,
            tables: 4,
        }
    }
}

/// Normalizes all of a sample's reads together.
///
/// For paired samples, each pair is interleaved into `<stem>.in.fq`, all of
/// them are normalized together into `<name>.khmered.fq` and the result is
/// split back into `<name>.khmered.fq-left.fq` and
/// `<name>.khmered.fq-right.fq`. Unpaired reads are concatenated and
/// normalized separately into `<name>.unpaired.fq`. Single-end samples are
/// normalized straight into `<name>.khmered.fq`.
#[derive(Debug)]
pub struct Khmer {
    params: KhmerParams,
}

impl Khmer {
    /// Creates a new `Khmer`.
    pub fn new(params: KhmerParams) -> Self {
        Self { params }
    }

    /// Table size such that every table together fits in the memory budget.
    fn min_tablesize(&self, context: &RunContext) -> u64 {
        (context.memory as f64 / self.params.tables.max(1) as f64 * 1e9) as u64
    }

    fn command(&self, context: &RunContext, paired: bool, out: &Path) -> CommandLine {
        let mut command = CommandLine::new(context.program(NORMALIZE_BY_MEDIAN));
        if paired {
            command = command.arg("-p");
        }

        command
            .arg("--quiet")
            .args(["--ksize", &self.params.k.to_string()])
            .args(["--cutoff", &self.params.cutoff.to_string()])
            .args(["--n_tables", &self.params.tables.to_string()])
            .args(["--min-tablesize", &self.min_tablesize(context).to_string()])
            .arg("--fault-tolerant")
            .arg("--out")
            .arg(out)
    }

    fn paired_step(
        &self,
        store: &SampleStore,
        context: &RunContext,
        name: &str,
        pairs: &[(usize, usize)],
    ) -> Step {
        let records = store.records();
        let khmered = context.output(format!("{}.khmered.fq", name));
        let left_out = context.output(format!("{}.khmered.fq-left.fq", name));
        let right_out = context.output(format!("{}.khmered.fq-right.fq", name));

        let mut step = Step::new(format!("normalize {}", name))
            .output(&left_out)
            .output(&right_out);
        let mut command = self.command(context, true, &khmered);

        for (l, r) in pairs {
            let interleaved = context.output(format!("{}.in.fq", unit_stem(&records[*l])));
            step = step.task(Task::Interleave {
                left: records[*l].current.clone(),
                right: records[*r].current.clone(),
                dest: interleaved.clone(),
            });
            command = command.arg(interleaved);
        }
        step = step.run(command);

        let unpaired: Vec<PathBuf> = pairs
            .iter()
            .flat_map(|(l, r)| [*l, *r])
            .filter_map(|i| records[i].unpaired.clone())
            .collect();

        let unpaired_out = if unpaired.is_empty() {
            None
        } else {
            let concatenated = context.output(format!("{}.unpaired.in.fq", name));
            let out = context.output(format!("{}.unpaired.fq", name));
            step = step
                .output(&out)
                .task(Task::Concatenate {
                    sources: unpaired,
                    dest: concatenated.clone(),
                })
                .run(self.command(context, false, &out).arg(concatenated));
            Some(out)
        };

        step = step.task(Task::Deinterleave {
            src: khmered,
            left: left_out.clone(),
            right: right_out.clone(),
        });

        // Every pair now shares the same two files; the unpaired reads hang
        // off the first pair only.
        for (n, (l, r)) in pairs.iter().enumerate() {
            let mut left_update = RecordUpdate::current(&left_out).without_unpaired();
            if let (0, Some(out)) = (n, &unpaired_out) {
                left_update = left_update.with_unpaired(out);
            }

            step = step
                .update(*l, left_update)
                .update(*r, RecordUpdate::current(&right_out).without_unpaired());
        }

        step
    }

    fn single_step(
        &self,
        store: &SampleStore,
        context: &RunContext,
        name: &str,
        singles: &[usize],
    ) -> Step {
        let records = store.records();
        let out = context.output(format!("{}.khmered.fq", name));
        let mut command = self.command(context, false, &out);
        let mut step = Step::new(format!("normalize {}", name)).output(&out);

        for i in singles {
            command = command.arg(&records[*i].current);
            if let Some(unpaired) = &records[*i].unpaired {
                command = command.arg(unpaired);
            }
            step = step.update(*i, RecordUpdate::current(&out).without_unpaired());
        }

        step.run(command)
    }
}

impl Tool for Khmer {
    fn kind(&self) -> StageKind {
        StageKind::Normalize
    }

    fn name(&self) -> &'static str {
        "khmer"
    }

    fn programs(&self) -> Vec<&'static str> {
        vec![NORMALIZE_BY_MEDIAN]
    }

    fn steps(&self, store: &SampleStore, context: &RunContext) -> Result<Vec<Step>> {
        let records = store.records();
        let mut samples: IndexMap<&str, Vec<Unit>> = IndexMap::new();

        for unit in store.units()? {
            samples
                .entry(records[unit.first()].name.as_str())
                .or_default()
                .push(unit);
        }

        let mut steps = Vec::with_capacity(samples.len());

        for (name, units) in samples {
            let pairs: Vec<(usize, usize)> = units
                .iter()
                .filter_map(|unit| match unit {
                    Unit::Paired { left, right } => Some((*left, *right)),
                    Unit::Single(_) => None,
                })
                .collect();
            let singles: Vec<usize> = units
                .iter()
                .filter_map(|unit| match unit {
                    Unit::Single(i) => Some(*i),
                    Unit::Paired { .. } => None,
                })
                .collect();

            let step = match (pairs.is_empty(), singles.is_empty()) {
                (false, true) => self.paired_step(store, context, name, &pairs),
                (true, false) => self.single_step(store, context, name, &singles),
                _ => {
                    return Err(Error::MalformedInput(format!(
                        "khmer needs sample {} to be all paired or all single-end",
                        name
                    )))
                }
            };

            steps.push(step);
        }

        Ok(steps)
    }
}
