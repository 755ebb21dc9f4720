//! Error correction with BayesHammer, run through `spades.py
//! --only-error-correction`.

use std::path::Path;
use std::path::PathBuf;

use itertools::Itertools;
use tracing::debug;

use super::Tool;
use crate::encoding;
use crate::errors::Result;
use crate::invoker::CommandLine;
use crate::samples::RecordUpdate;
use crate::samples::SampleRecord;
use crate::samples::SampleStore;
use crate::samples::StageKind;
use crate::samples::Unit;
use crate::stages::naming::record_output;
use crate::stages::naming::unit_stem;
use crate::stages::orchestrator::RunContext;
use crate::stages::step::Step;
use crate::stages::step::Task;
use crate::stats;
use crate::stats::StageStats;
use crate::utils::pathbuf::stem_of;

const SPADES: &str = "spades.py";

/// Corrects each unit in its own SPAdes working directory,
/// `<output>/hammer-<name>-[<type>-]<replicate>`.
///
/// SPAdes names corrected files after their inputs with a suffix that
/// varies between releases, so they are gathered by name prefix from the
/// `corrected` directory once it finishes: each mate's file into
/// `<record stem>.hammer.fq`, and every other corrected file (reads whose
/// mate was dropped, plus the corrected unpaired reads) into the left
/// record's `<record stem>.hammer.unpaired.fq`.
#[derive(Debug, Default)]
pub struct Hammer;

/// The directory SPAdes works in for a unit.
fn working_dir(context: &RunContext, record: &SampleRecord) -> PathBuf {
    let mut name = format!("hammer-{}-", record.name);
    if record.name != record.condition {
        name.push_str(&format!("{}-", record.condition));
    }
    name.push_str(&record.replicate.to_string());
    context.output(name)
}

/// The file name prefix of a corrected copy of `input`.
fn corrected_prefix(input: &Path) -> String {
    format!("{}.", stem_of(input))
}

impl Hammer {
    fn command(&self, context: &RunContext, dir: &Path, phred: u8) -> CommandLine {
        CommandLine::new(context.program(SPADES))
            .arg("--only-error-correction")
            .arg("--disable-gzip-output")
            .arg("-t")
            .arg(context.threads.to_string())
            .arg("-m")
            .arg(context.memory.to_string())
            .arg("-o")
            .arg(dir)
            .arg("--phred-offset")
            .arg(phred.to_string())
    }
}

impl Tool for Hammer {
    fn kind(&self) -> StageKind {
        StageKind::Correct
    }

    fn name(&self) -> &'static str {
        "bayeshammer"
    }

    fn programs(&self) -> Vec<&'static str> {
        vec![SPADES]
    }

    fn stats_name(&self) -> &'static str {
        "hammer"
    }

    fn steps(&self, store: &SampleStore, context: &RunContext) -> Result<Vec<Step>> {
        let dir = &context.output_dir;
        let records = store.records();
        let mut steps = Vec::new();

        for unit in store.units()? {
            let first = &records[unit.first()];
            let work = working_dir(context, first);
            let corrected = work.join("corrected");
            let mut step = Step::new(format!("correct {}", unit_stem(first)));

            // (1) Each record's corrected reads get a stable name, and
            // whatever else SPAdes corrected hangs off the left record.
            let mates = unit
                .indices()
                .into_iter()
                .map(|i| (i, corrected_prefix(&records[i].current)))
                .collect::<Vec<_>>();
            let leftover = match unit {
                Unit::Paired { left, .. } => {
                    Some((left, record_output(dir, first, "hammer.unpaired.fq")))
                }
                Unit::Single(_) => None,
            };

            for (i, prefix) in &mates {
                let out = record_output(dir, &records[*i], "hammer.fq");
                let mut update = RecordUpdate::current(&out).without_unpaired();
                if let Some((left, unpaired)) = &leftover {
                    if left == i {
                        update = update.with_unpaired(unpaired);
                    }
                }

                step = step
                    .output(&out)
                    .task(Task::Gather {
                        dir: corrected.clone(),
                        include: vec![prefix.clone()],
                        exclude: Vec::new(),
                        dest: out,
                    })
                    .update(*i, update);
            }

            // (2) Reads whose mate was dropped come back in their own files.
            if let Some((_, unpaired)) = leftover {
                step = step.output(&unpaired).task(Task::Gather {
                    dir: corrected,
                    include: Vec::new(),
                    exclude: mates.into_iter().map(|(_, prefix)| prefix).collect(),
                    dest: unpaired,
                });
            }

            // (3) SPAdes runs first, and wants to be told the quality
            // encoding, which is only sampled when it will run.
            if !step.is_done() {
                let phred = encoding::detect(&first.current)?.value();
                debug!("  [*] {} has Phred+{} qualities.", unit_stem(first), phred);

                let mut command = self.command(context, &work, phred);
                match unit {
                    Unit::Paired { left, right } => {
                        command = command
                            .arg("-1")
                            .arg(&records[left].current)
                            .arg("-2")
                            .arg(&records[right].current);
                        for (flag, i) in [("--pe1-s", left), ("--pe2-s", right)] {
                            if let Some(unpaired) = &records[i].unpaired {
                                command = command.arg(flag).arg(unpaired);
                            }
                        }
                    }
                    Unit::Single(i) => {
                        command = command.arg("-s").arg(&records[i].current);
                    }
                }
                step.tasks.insert(0, Task::Run(command));
            }

            steps.push(step);
        }

        Ok(steps)
    }

    /// Reports how many bases were changed at each read position.
    fn stats(&self, store: &SampleStore) -> Result<Option<StageStats>> {
        let pairs = store
            .records()
            .iter()
            .filter_map(|r| r.previous.as_ref().map(|p| (p, &r.current)))
            .unique()
            .filter(|(previous, _)| previous.is_file());

        stats::corrections(pairs).map(Some)
    }
}
