//! Contaminant filtering with FACS bloom filters.

use std::path::Path;
use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;

use super::Tool;
use crate::errors::Result;
use crate::invoker::CommandLine;
use crate::samples::RecordUpdate;
use crate::samples::SampleStore;
use crate::samples::StageKind;
use crate::stages::naming::record_output;
use crate::stages::naming::record_stem;
use crate::stages::orchestrator::RunContext;
use crate::stages::step::Step;
use crate::stages::step::Task;
use crate::utils::pathbuf::basename_of;

const FACS: &str = "facs";

/// FACS filtering parameters.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct FacsParams {
    /// k-mer length used when querying the filter.
    pub k: Option<u32>,

    /// False positive rate of the bloom filter.
    pub false_positive: f64,

    /// Fraction of a read's k-mers that must hit the filter for the read to
    /// be removed.
    pub threshold: f64,
}

impl Default for FacsParams {
    fn default() -> Self {
        Self {
            k: None,
            false_positive: 0.005,
            threshold: 0.4,
        }
    }
}

/// Removes reads that match a bloom filter built from the contaminant
/// sequences, one file at a time.
///
/// Mates are filtered independently, so a pair can lose one read and keep
/// the other; unpaired reads are left as they are. FACS names its output
/// `<input name up to the first dot>_<contaminants file name>_clean.fastq`,
/// which is moved to `<record stem>.facs.fq` straight away since two inputs
/// can share the part before the first dot.
#[derive(Debug)]
pub struct Facs {
    contaminants: PathBuf,
    params: FacsParams,
}

impl Facs {
    /// Creates a new `Facs` removing reads matching `contaminants`.
    pub fn new(contaminants: PathBuf, params: FacsParams) -> Self {
        Self {
            contaminants,
            params,
        }
    }

    fn cleaned_by_tool(&self, dir: &Path, input: &Path) -> PathBuf {
        let name = basename_of(input);
        let head = name.split('.').next().unwrap_or_default();
        dir.join(format!(
            "{}_{}_clean.fastq",
            head,
            basename_of(&self.contaminants)
        ))
    }
}

impl Tool for Facs {
    fn kind(&self) -> StageKind {
        StageKind::Filter
    }

    fn name(&self) -> &'static str {
        "facs"
    }

    fn programs(&self) -> Vec<&'static str> {
        vec![FACS]
    }

    fn steps(&self, store: &SampleStore, context: &RunContext) -> Result<Vec<Step>> {
        let dir = &context.output_dir;
        let records = store.records();
        let bloom = context.output(format!("{}.bloom", basename_of(&self.contaminants)));

        let mut steps = vec![Step::new(format!("build filter {}", bloom.display()))
            .output(&bloom)
            .run(
                CommandLine::new(context.program(FACS))
                    .arg("build")
                    .arg("-r")
                    .arg(&self.contaminants)
                    .arg("-o")
                    .arg(&bloom)
                    .arg("-e")
                    .arg(self.params.false_positive.to_string()),
            )];

        // Records sharing an input share its filtered copy.
        let mut inputs: IndexMap<&Path, Vec<usize>> = IndexMap::new();
        for unit in store.units()? {
            for i in unit.indices() {
                inputs.entry(records[i].current.as_path()).or_default().push(i);
            }
        }

        for (input, indices) in inputs {
            let first = &records[indices[0]];
            let out = record_output(dir, first, "facs.fq");

            let mut command = CommandLine::new(context.program(FACS))
                .arg("remove")
                .arg("-r")
                .arg(&bloom)
                .arg("-q")
                .arg(input)
                .arg("-t")
                .arg(self.params.threshold.to_string());
            if let Some(k) = self.params.k {
                command = command.arg("-k").arg(k.to_string());
            }
            command = command.arg("-o").arg(format!("{}/", dir.display()));

            let mut step = Step::new(format!("filter {}", record_stem(first)))
                .output(&out)
                .run(command)
                .task(Task::Rename {
                    from: self.cleaned_by_tool(dir, input),
                    to: out.clone(),
                });

            for i in indices {
                step = step.update(i, RecordUpdate::current(&out));
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
    fn test_each_distinct_file_is_filtered_once() {
        let mut records = Vec::new();
        for replicate in 1..=2 {
            for (mate, file) in [(Mate::One, "left"), (Mate::Two, "right")] {
                let mut record = SampleRecord::new("s", "A", replicate, mate, "/data/r.fq");
                record.current = PathBuf::from(format!("/out/s.khmered.fq-{}.fq", file));
                records.push(record);
            }
        }
        let store: SampleStore = records.into_iter().collect();

        let tool = Facs::new(PathBuf::from("/ref/phix.fa"), FacsParams::default());
        let steps = tool.steps(&store, &RunContext::new("/out")).unwrap();
        assert_eq!(steps.len(), 3);

        assert_eq!(
            steps[0].tasks[0].to_string(),
            "facs build -r /ref/phix.fa -o /out/phix.fa.bloom -e 0.005"
        );
        assert_eq!(
            steps[1].tasks[0].to_string(),
            "facs remove -r /out/phix.fa.bloom -q /out/s.khmered.fq-left.fq -t 0.4 -o /out/"
        );
        assert_eq!(
            steps[1].tasks[1],
            Task::Rename {
                from: PathBuf::from("/out/s_phix.fa_clean.fastq"),
                to: PathBuf::from("/out/s_A_1-1.facs.fq"),
            }
        );
        assert_eq!(steps[1].records, vec![0, 2]);
        assert_eq!(steps[2].outputs, vec![PathBuf::from("/out/s_A_1-2.facs.fq")]);
        assert_eq!(steps[2].records, vec![1, 3]);
    }
}
