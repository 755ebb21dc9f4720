//! Contaminant filtering and alignment with Bowtie2.
//!
//! Both tools share an index built with `bowtie2-build` into
//! `<output_dir>/<reference file name>`. The index is built by its own step,
//! so a later run finds it and skips straight to the alignments.

use std::path::Path;
use std::path::PathBuf;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::Tool;
use crate::errors::Result;
use crate::invoker::CommandLine;
use crate::invoker::ToolOutput;
use crate::samples::RecordUpdate;
use crate::samples::SampleStore;
use crate::samples::StageKind;
use crate::samples::Unit;
use crate::stages::naming::record_output;
use crate::stages::naming::unit_stem;
use crate::stages::orchestrator::RunContext;
use crate::stages::step::Step;
use crate::stats::StageStats;
use crate::utils::pathbuf::basename_of;
use crate::utils::pathbuf::stem_of;

const BOWTIE2: &str = "bowtie2";
const BOWTIE2_BUILD: &str = "bowtie2-build";

lazy_static! {
    /// A count at the start of a line of Bowtie2's alignment summary,
    /// followed by what was counted.
    static ref SUMMARY_LINE: Regex = Regex::new(r"^\s*(\d+) (?:\(\d+\.\d+%\) )?(.+)$").unwrap();
}

/// Bowtie2 alignment parameters.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Bowtie2Params {
    /// Report every alignment with the settings expected by downstream
    /// expression quantification.
    pub expression: bool,
}

/// The step building an index of `fasta` and the index prefix it produces.
fn index_step(fasta: &Path, context: &RunContext) -> (Step, PathBuf) {
    let index = context.output(basename_of(fasta));
    let step = Step::new(format!("index {}", fasta.display()))
        .output(format!("{}.1.bt2", index.display()))
        .run(
            CommandLine::new(context.program(BOWTIE2_BUILD))
                .arg(fasta)
                .arg(&index),
        );

    (step, index)
}

/// The inputs of a Bowtie2 invocation for one unit.
fn reads(command: CommandLine, store: &SampleStore, unit: &Unit) -> CommandLine {
    let records = store.records();

    match unit {
        Unit::Paired { left, right } => command
            .arg("-1")
            .arg(&records[*left].current)
            .arg("-2")
            .arg(&records[*right].current),
        Unit::Single(i) => command.arg("-U").arg(&records[*i].current),
    }
}

//===========//
// Filtering //
//===========//

/// Removes reads that align to a contaminant reference.
///
/// Reads that fail to align are kept in `<stem>.f.fq`. For pairs, only pairs
/// that fail to align concordantly are kept.
#[derive(Debug)]
pub struct Bowtie2Filter {
    contaminants: PathBuf,
}

impl Bowtie2Filter {
    /// Creates a new `Bowtie2Filter` removing reads that align to
    /// `contaminants`.
    pub fn new(contaminants: PathBuf) -> Self {
        Self { contaminants }
    }
}

impl Tool for Bowtie2Filter {
    fn kind(&self) -> StageKind {
        StageKind::Filter
    }

    fn name(&self) -> &'static str {
        "bowtie2"
    }

    fn programs(&self) -> Vec<&'static str> {
        vec![BOWTIE2_BUILD, BOWTIE2]
    }

    fn steps(&self, store: &SampleStore, context: &RunContext) -> Result<Vec<Step>> {
        let dir = &context.output_dir;
        let records = store.records();
        let (index_step, index) = index_step(&self.contaminants, context);
        let mut steps = vec![index_step];

        for unit in store.units()? {
            let command = CommandLine::new(context.program(BOWTIE2))
                .arg("-x")
                .arg(&index);
            let command = reads(command, store, &unit)
                .arg("-p")
                .arg(context.threads.to_string())
                .arg("--very-sensitive");

            let step = match unit {
                Unit::Paired { left: l, right: r } => {
                    let left_out = record_output(dir, &records[l], "f.fq");
                    let right_out = record_output(dir, &records[r], "f.fq");
                    // Bowtie2 replaces the % with the mate number.
                    let pattern = dir.join(format!("{}-%.f.fq", unit_stem(&records[l])));

                    Step::new(format!("filter {}", unit_stem(&records[l])))
                        .output(&left_out)
                        .output(&right_out)
                        .run(command.arg("--un-conc").arg(pattern).args(["-S", "/dev/null"]))
                        .update(l, RecordUpdate::current(&left_out))
                        .update(r, RecordUpdate::current(&right_out))
                }
                Unit::Single(i) => {
                    let out = record_output(dir, &records[i], "f.fq");

                    Step::new(format!("filter {}", unit_stem(&records[i])))
                        .output(&out)
                        .run(command.arg("--un").arg(&out).args(["-S", "/dev/null"]))
                        .update(i, RecordUpdate::current(&out))
                }
            };

            steps.push(step);
        }

        Ok(steps)
    }
}

//===========//
// Alignment //
//===========//

/// Counts from Bowtie2's alignment summaries, summed across invocations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AlignmentSummary {
    /// Reads (or pairs) given to the aligner.
    pub reads: u64,

    /// How many of those were paired.
    pub paired_reads: u64,

    /// Reads (or pairs) that did not align (concordantly).
    pub unaligned: u64,

    /// Reads (or pairs) that aligned exactly once.
    pub unique: u64,

    /// Reads (or pairs) that aligned more than once.
    pub multi: u64,
}

impl AlignmentSummary {
    /// Adds the counts from one summary printed on standard error.
    ///
    /// Only the first line of each kind is counted: for pairs, the
    /// concordant counts come before the per-mate breakdown.
    pub fn add(&mut self, stderr: &str) {
        let mut seen = [false; 5];

        for line in stderr.lines() {
            let captures = match SUMMARY_LINE.captures(line) {
                Some(captures) => captures,
                None => continue,
            };

            let count: u64 = match captures[1].parse() {
                Ok(count) => count,
                Err(_) => continue,
            };

            let (slot, field) = match &captures[2] {
                "reads; of these:" => (0, &mut self.reads),
                "were paired; of these:" => (1, &mut self.paired_reads),
                "aligned concordantly 0 times" | "aligned 0 times" => (2, &mut self.unaligned),
                "aligned concordantly exactly 1 time" | "aligned exactly 1 time" => {
                    (3, &mut self.unique)
                }
                "aligned concordantly >1 times" | "aligned >1 times" => (4, &mut self.multi),
                _ => continue,
            };

            if !seen[slot] {
                seen[slot] = true;
                *field += count;
            }
        }
    }
}

/// Aligns reads to a reference, producing one SAM file per unit.
///
/// The SAM file is named after the unit's current files and the index:
/// `<left stem>-<right stem>-<index name>.sam`. It is recorded as the left
/// (or only) record's alignment.
#[derive(Debug)]
pub struct Bowtie2 {
    reference: PathBuf,
    params: Bowtie2Params,
    summary: AlignmentSummary,
}

impl Bowtie2 {
    /// Creates a new `Bowtie2` aligning to `reference`.
    pub fn new(reference: PathBuf, params: Bowtie2Params) -> Self {
        Self {
            reference,
            params,
            summary: AlignmentSummary::default(),
        }
    }

    /// The counts observed so far.
    pub fn summary(&self) -> &AlignmentSummary {
        &self.summary
    }
}

/// `<left stem>-[<right stem>-]<index name>.sam` in the output directory.
pub(crate) fn sam_path(store: &SampleStore, unit: &Unit, index: &Path, dir: &Path) -> PathBuf {
    let records = store.records();
    let mut name = String::new();

    for i in unit.indices() {
        name.push_str(&stem_of(&records[i].current));
        name.push('-');
    }

    name.push_str(&basename_of(index));
    dir.join(format!("{}.sam", name))
}

impl Tool for Bowtie2 {
    fn kind(&self) -> StageKind {
        StageKind::Align
    }

    fn name(&self) -> &'static str {
        "bowtie2"
    }

    fn programs(&self) -> Vec<&'static str> {
        vec![BOWTIE2_BUILD, BOWTIE2]
    }

    fn steps(&self, store: &SampleStore, context: &RunContext) -> Result<Vec<Step>> {
        let dir = &context.output_dir;
        let (index_step, index) = index_step(&self.reference, context);
        let mut steps = vec![index_step];

        for unit in store.units()? {
            let sam = sam_path(store, &unit, &index, dir);

            let command = CommandLine::new(context.program(BOWTIE2))
                .arg("-x")
                .arg(&index);
            let mut command = reads(command, store, &unit)
                .arg("-p")
                .arg(context.threads.to_string())
                .arg("--very-sensitive")
                .arg("--no-unal");

            if self.params.expression {
                command = command
                    .args(["-a", "-X", "600", "--rdg", "6,5", "--rfg", "6,5"])
                    .args(["--score-min", "L,-.6,-.4", "--no-discordant", "--no-mixed"]);
            }

            let mut step = Step::new(format!("align {}", unit_stem(&store.records()[unit.first()])))
                .output(&sam)
                .run(command.arg("-S").arg(&sam))
                .update(unit.first(), RecordUpdate::alignment(&sam));

            for i in unit.indices() {
                step = step.touch(i);
            }

            steps.push(step);
        }

        Ok(steps)
    }

    fn observe(&mut self, command: &CommandLine, output: &ToolOutput) {
        if command.has_arg("-S") {
            self.summary.add(&output.stderr);
            debug!("  [*] Alignment summary so far: {:?}", self.summary);
        }
    }

    /// Reports the summed alignment summary. Nothing is reported if no
    /// alignment ran in this invocation, which keeps the statistics of an
    /// earlier run in place.
    fn stats(&self, _store: &SampleStore) -> Result<Option<StageStats>> {
        let s = &self.summary;

        if s.reads == 0 {
            return Ok(None);
        }

        let mut stats = StageStats::with_total(s.reads);
        stats.push("reads", s.reads);
        stats.push("paired_reads", s.paired_reads);
        stats.push("unaligned", s.unaligned);
        stats.push("unique", s.unique);
        stats.push("multi", s.multi);

        Ok(Some(stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::Mate;
    use crate::samples::SampleRecord;

    const PAIRED_SUMMARY: &str = "10000 reads; of these:
  10000 (100.00%) were paired; of these:
    650 (6.50%) aligned concordantly 0 times
    8823 (88.23%) aligned concordantly exactly 1 time
    527 (5.27%) aligned concordantly >1 times
    ----
    650 pairs aligned concordantly 0 times; of these:
      34 (5.23%) aligned discordantly 1 time
    ----
    616 pairs aligned 0 times concordantly or discordantly; of these:
      1232 mates make up the pairs; of these:
        660 (53.57%) aligned 0 times
        571 (46.35%) aligned exactly 1 time
        1 (0.08%) aligned >1 times
96.70% overall alignment rate
";

    fn store() -> SampleStore {
        vec![
            SampleRecord::new("test", "A", 1, Mate::One, "/out/test_A_1-1.t.fq"),
            SampleRecord::new("test", "A", 1, Mate::Two, "/out/test_A_1-2.t.fq"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_summary_counts_concordant_lines() {
        let mut summary = AlignmentSummary::default();
        summary.add(PAIRED_SUMMARY);
        summary.add(PAIRED_SUMMARY);

        assert_eq!(
            summary,
            AlignmentSummary {
                reads: 20000,
                paired_reads: 20000,
                unaligned: 1300,
                unique: 17646,
                multi: 1054,
            }
        );
    }

    #[test]
    fn test_align_command() {
        let tool = Bowtie2::new(
            PathBuf::from("/ref/transcripts.fa"),
            Bowtie2Params { expression: true },
        );
        let steps = tool.steps(&store(), &RunContext::new("/out")).unwrap();
        assert_eq!(steps.len(), 2);

        assert_eq!(steps[0].outputs, vec![PathBuf::from("/out/transcripts.fa.1.bt2")]);
        assert_eq!(
            steps[1].outputs,
            vec![PathBuf::from("/out/test_A_1-1.t-test_A_1-2.t-transcripts.fa.sam")]
        );
        assert_eq!(
            steps[1].tasks[0].to_string(),
            "bowtie2 -x /out/transcripts.fa -1 /out/test_A_1-1.t.fq -2 /out/test_A_1-2.t.fq \
            -p 1 --very-sensitive --no-unal -a -X 600 --rdg 6,5 --rfg 6,5 \
            --score-min L,-.6,-.4 --no-discordant --no-mixed \
            -S /out/test_A_1-1.t-test_A_1-2.t-transcripts.fa.sam"
        );
        assert_eq!(steps[1].records, vec![0, 1]);
        assert_eq!(steps[1].updates.len(), 1);
    }

    #[test]
    fn test_filter_names_outputs_per_record() {
        let tool = Bowtie2Filter::new(PathBuf::from("/ref/phix.fa"));
        let steps = tool.steps(&store(), &RunContext::new("/out")).unwrap();

        assert_eq!(
            steps[1].outputs,
            vec![
                PathBuf::from("/out/test_A_1-1.f.fq"),
                PathBuf::from("/out/test_A_1-2.f.fq"),
            ]
        );
        assert!(steps[1].tasks[0]
            .to_string()
            .contains("--un-conc /out/test_A_1-%.f.fq -S /dev/null"));
    }

    #[test]
    fn test_no_stats_without_alignments() {
        let mut tool = Bowtie2::new(PathBuf::from("/ref/t.fa"), Bowtie2Params::default());
        assert_eq!(tool.stats(&store()).unwrap(), None);

        let command = CommandLine::new("bowtie2").arg("-S").arg("/out/a.sam");
        tool.observe(&command, &ToolOutput::success(PAIRED_SUMMARY));

        let stats = tool.stats(&store()).unwrap().unwrap();
        assert_eq!(stats.total(), 10000);
        assert_eq!(stats.rows()[2].count, 650);
    }
}
