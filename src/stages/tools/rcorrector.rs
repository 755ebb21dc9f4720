//! k-mer based error correction with Rcorrector.

use std::ffi::OsString;
use std::path::Path;
use std::path::PathBuf;

use indexmap::IndexMap;
use indexmap::IndexSet;
use itertools::Itertools;
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
use crate::stages::orchestrator::RunContext;
use crate::stages::step::Step;
use crate::stages::step::Task;
use crate::stats;
use crate::stats::StageStats;
use crate::utils::pathbuf::stem_of;

/// Rcorrector's parameters.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct RcorrectorParams {
    /// k-mer length.
    pub k: u32,
}

impl Default for RcorrectorParams {
    fn default() -> Self {
        Self { k: 23 }
    }
}

/// Corrects every file in one batch, so k-mer counts are shared across all
/// samples.
///
/// Rcorrector names each output `<input stem>.cor.fq`; these are moved to
/// `<record stem>.cor.fq` (and `<record stem>.cor.unpaired.fq`) so the names
/// depend only on the record, not on whichever stage produced its input.
#[derive(Debug)]
pub struct Rcorrector {
    params: RcorrectorParams,
}

impl Rcorrector {
    /// Creates a new `Rcorrector`.
    pub fn new(params: RcorrectorParams) -> Self {
        Self { params }
    }
}

/// Where Rcorrector writes the corrected version of `input`.
fn corrected_by_tool(dir: &Path, input: &Path) -> PathBuf {
    dir.join(format!("{}.cor.fq", stem_of(input)))
}

fn comma_separated(files: &[PathBuf]) -> OsString {
    let mut joined = OsString::new();

    for (i, file) in files.iter().enumerate() {
        if i > 0 {
            joined.push(",");
        }
        joined.push(file);
    }

    joined
}

impl Tool for Rcorrector {
    fn kind(&self) -> StageKind {
        StageKind::Correct
    }

    fn name(&self) -> &'static str {
        "rcorrector"
    }

    fn programs(&self) -> Vec<&'static str> {
        vec!["run_rcorrector.pl"]
    }

    fn steps(&self, store: &SampleStore, context: &RunContext) -> Result<Vec<Step>> {
        if store.is_empty() {
            return Ok(Vec::new());
        }

        let dir = &context.output_dir;
        let records = store.records();
        let mut pairs: IndexSet<(PathBuf, PathBuf)> = IndexSet::new();
        let mut singles: IndexSet<PathBuf> = IndexSet::new();
        let mut step = Step::new("correct all reads");

        // Records can share input files (after khmer every replicate of a
        // sample does), so each distinct input is corrected once and named
        // after the first record that refers to it.
        let mut corrected: IndexMap<PathBuf, PathBuf> = IndexMap::new();

        for unit in store.units()? {
            match unit {
                Unit::Paired { left, right } => {
                    pairs.insert((records[left].current.clone(), records[right].current.clone()));
                }
                Unit::Single(i) => {
                    singles.insert(records[i].current.clone());
                }
            }

            for i in unit.indices() {
                let record = &records[i];
                let current = corrected
                    .entry(record.current.clone())
                    .or_insert_with(|| record_output(dir, record, "cor.fq"));
                let mut update = RecordUpdate::current(current.as_path());

                if let Some(unpaired) = &record.unpaired {
                    singles.insert(unpaired.clone());
                    let corrected_unpaired = corrected
                        .entry(unpaired.clone())
                        .or_insert_with(|| record_output(dir, record, "cor.unpaired.fq"));
                    update = update.with_unpaired(corrected_unpaired.as_path());
                }

                step = step.update(i, update);
            }
        }

        let (lefts, rights): (Vec<PathBuf>, Vec<PathBuf>) = pairs.into_iter().unzip();
        let singles: Vec<PathBuf> = singles.into_iter().collect();

        let mut command = CommandLine::new(context.program("run_rcorrector.pl"));
        if !lefts.is_empty() {
            command = command
                .arg("-1")
                .arg(comma_separated(&lefts))
                .arg("-2")
                .arg(comma_separated(&rights));
        }
        if !singles.is_empty() {
            command = command.arg("-s").arg(comma_separated(&singles));
        }
        command = command
            .arg("-k")
            .arg(self.params.k.to_string())
            .arg("-t")
            .arg(context.threads.to_string())
            .arg("-od")
            .arg(dir);

        step = step.run(command);
        for (input, output) in corrected {
            step = step.output(&output).task(Task::Rename {
                from: corrected_by_tool(dir, &input),
                to: output,
            });
        }

        Ok(vec![step])
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::Mate;
    use crate::samples::SampleRecord;

    #[test]
    fn test_one_batch_command() {
        let mut left = SampleRecord::new("s", "A", 1, Mate::One, "/data/s_1.fq");
        left.current = PathBuf::from("/out/s_A_1-1.t.fq");
        left.unpaired = Some(PathBuf::from("/out/s_A_1-1.tU.fq"));
        let mut right = SampleRecord::new("s", "A", 1, Mate::Two, "/data/s_2.fq");
        right.current = PathBuf::from("/out/s_A_1-2.t.fq");
        let store: SampleStore = vec![left, right].into_iter().collect();

        let tool = Rcorrector::new(RcorrectorParams::default());
        let steps = tool
            .steps(&store, &RunContext::new("/out").with_threads(8))
            .unwrap();
        assert_eq!(steps.len(), 1);

        let step = &steps[0];
        assert_eq!(
            step.tasks[0].to_string(),
            "run_rcorrector.pl -1 /out/s_A_1-1.t.fq -2 /out/s_A_1-2.t.fq \
            -s /out/s_A_1-1.tU.fq -k 23 -t 8 -od /out"
        );
        assert_eq!(
            step.tasks[1],
            Task::Rename {
                from: PathBuf::from("/out/s_A_1-1.t.cor.fq"),
                to: PathBuf::from("/out/s_A_1-1.cor.fq"),
            }
        );
        assert!(step
            .outputs
            .contains(&PathBuf::from("/out/s_A_1-1.cor.unpaired.fq")));
        assert_eq!(step.records, vec![0, 1]);
    }

    #[test]
    fn test_shared_inputs_are_corrected_once() {
        let mut records = Vec::new();
        for replicate in 1..=2 {
            for (mate, file) in [(Mate::One, "left"), (Mate::Two, "right")] {
                let mut record = SampleRecord::new("s", "A", replicate, mate, "/data/r.fq");
                record.current = PathBuf::from(format!("/out/s.khmered.fq-{}.fq", file));
                records.push(record);
            }
        }
        records[0].unpaired = Some(PathBuf::from("/out/s.unpaired.fq"));
        let store: SampleStore = records.into_iter().collect();

        let tool = Rcorrector::new(RcorrectorParams::default());
        let step = tool
            .steps(&store, &RunContext::new("/out"))
            .unwrap()
            .remove(0);

        assert_eq!(
            step.tasks[0].to_string(),
            "run_rcorrector.pl -1 /out/s.khmered.fq-left.fq -2 /out/s.khmered.fq-right.fq \
            -s /out/s.unpaired.fq -k 23 -t 1 -od /out"
        );
        assert_eq!(
            step.tasks[1..].iter().map(|t| t.to_string()).collect::<Vec<_>>(),
            vec![
                "mv /out/s.khmered.fq-left.cor.fq /out/s_A_1-1.cor.fq",
                "mv /out/s.unpaired.cor.fq /out/s_A_1-1.cor.unpaired.fq",
                "mv /out/s.khmered.fq-right.cor.fq /out/s_A_1-2.cor.fq",
            ]
        );
        assert_eq!(step.outputs.len(), 3);

        let currents: Vec<_> = step
            .updates
            .iter()
            .map(|(_, u)| u.current.clone().unwrap())
            .collect();
        assert_eq!(currents[0], currents[2]);
        assert_eq!(currents[1], currents[3]);
        assert_eq!(step.records, vec![0, 1, 2, 3]);
    }
}
