//! Quality trimming with Trimmomatic.

use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use super::Tool;
use crate::encoding;
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

/// Trimmomatic's trimming thresholds.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct TrimmomaticParams {
    /// Drop reads shorter than this after trimming.
    pub minlen: u32,

    /// Sliding window size.
    pub window: u32,

    /// Required average quality within the sliding window.
    pub quality: u32,

    /// Trim trailing bases below this quality.
    pub trailing: u32,

    /// Trim leading bases below this quality.
    pub leading: u32,

    /// Adapter FASTA for `ILLUMINACLIP`, if adapters should be clipped.
    pub adapters: Option<PathBuf>,

    /// Seed mismatches allowed by `ILLUMINACLIP`.
    pub mismatches: u32,

    /// Run this jar with `java -jar` instead of a `trimmomatic` wrapper.
    pub jar: Option<PathBuf>,
}

impl Default for TrimmomaticParams {
    fn default() -> Self {
        Self {
            minlen: 40,
            window: 4,
            quality: 15,
            trailing: 15,
            leading: 15,
            adapters: None,
            mismatches: 2,
            jar: None,
        }
    }
}

/// Trims each pair (`PE` mode) or single file (`SE` mode).
///
/// Paired outputs are `<stem>.t.fq` for reads whose mate survived and
/// `<stem>.tU.fq` for reads whose mate was dropped; the latter become the
/// record's `unpaired` file.
#[derive(Debug)]
pub struct Trimmomatic {
    params: TrimmomaticParams,
}

impl Trimmomatic {
    /// Creates a new `Trimmomatic`.
    pub fn new(params: TrimmomaticParams) -> Self {
        Self { params }
    }

    fn command(&self, context: &RunContext, mode: &str) -> CommandLine {
        match &self.params.jar {
            Some(jar) => CommandLine::new(context.program("java"))
                .arg("-jar")
                .arg(jar)
                .arg(mode),
            None => CommandLine::new(context.program("trimmomatic")).arg(mode),
        }
    }

    fn trimming_steps(&self) -> Vec<String> {
        let p = &self.params;
        let mut steps = Vec::new();

        if let Some(adapters) = &p.adapters {
            steps.push(format!(
                "ILLUMINACLIP:{}:{}:30:10",
                adapters.display(),
                p.mismatches
            ));
        }

        steps.push(format!("LEADING:{}", p.leading));
        steps.push(format!("TRAILING:{}", p.trailing));
        steps.push(format!("SLIDINGWINDOW:{}:{}", p.window, p.quality));
        steps.push(format!("MINLEN:{}", p.minlen));
        steps
    }
}

impl Tool for Trimmomatic {
    fn kind(&self) -> StageKind {
        StageKind::Trim
    }

    fn name(&self) -> &'static str {
        "trimmomatic"
    }

    fn programs(&self) -> Vec<&'static str> {
        match self.params.jar {
            Some(_) => vec!["java"],
            None => vec!["trimmomatic"],
        }
    }

    fn steps(&self, store: &SampleStore, context: &RunContext) -> Result<Vec<Step>> {
        let dir = &context.output_dir;
        let records = store.records();
        let mut steps = Vec::new();

        for unit in store.units()? {
            let step = match unit {
                Unit::Paired { left: l, right: r } => {
                    let (left, right) = (&records[l], &records[r]);
                    let left_out = record_output(dir, left, "t.fq");
                    let left_unpaired = record_output(dir, left, "tU.fq");
                    let right_out = record_output(dir, right, "t.fq");
                    let right_unpaired = record_output(dir, right, "tU.fq");

                    let step = Step::new(format!("trim {}", unit_stem(left)))
                        .output(&left_out)
                        .output(&left_unpaired)
                        .output(&right_out)
                        .output(&right_unpaired)
                        .update(
                            l,
                            RecordUpdate::current(&left_out).with_unpaired(&left_unpaired),
                        )
                        .update(
                            r,
                            RecordUpdate::current(&right_out).with_unpaired(&right_unpaired),
                        );

                    // The encoding is only sampled when the tool will run.
                    if step.is_done() {
                        step
                    } else {
                        let phred = encoding::detect(&left.current)?;
                        step.run(
                            self.command(context, "PE")
                                .arg(format!("-phred{}", phred))
                                .arg("-threads")
                                .arg(context.threads.to_string())
                                .args([&left.current, &right.current])
                                .args([&left_out, &left_unpaired, &right_out, &right_unpaired])
                                .args(self.trimming_steps()),
                        )
                    }
                }
                Unit::Single(i) => {
                    let record = &records[i];
                    let out = record_output(dir, record, "t.fq");
                    let step = Step::new(format!("trim {}", unit_stem(record)))
                        .output(&out)
                        .update(i, RecordUpdate::current(&out));

                    if step.is_done() {
                        step
                    } else {
                        let phred = encoding::detect(&record.current)?;
                        step.run(
                            self.command(context, "SE")
                                .arg(format!("-phred{}", phred))
                                .arg("-threads")
                                .arg(context.threads.to_string())
                                .args([&record.current, &out])
                                .args(self.trimming_steps()),
                        )
                    }
                }
            };

            steps.push(step);
        }

        Ok(steps)
    }
}
