//! The unit of memoized work within a stage.

use std::fmt;
use std::path::PathBuf;

use crate::invoker::CommandLine;
use crate::samples::RecordUpdate;

/// One thing a step does, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Task {
    /// Runs an external tool.
    Run(CommandLine),

    /// Interleaves two mate files.
    Interleave {
        /// First read of each pair.
        left: PathBuf,
        /// Second read of each pair.
        right: PathBuf,
        /// Interleaved output.
        dest: PathBuf,
    },

    /// Splits an interleaved file into its mates.
    Deinterleave {
        /// Interleaved input.
        src: PathBuf,
        /// First read of each pair.
        left: PathBuf,
        /// Second read of each pair.
        right: PathBuf,
    },

    /// Concatenates several FASTQ files into one.
    Concatenate {
        /// Files to concatenate, in order.
        sources: Vec<PathBuf>,
        /// Concatenated output.
        dest: PathBuf,
    },

    /// Decompresses a gzipped file.
    Decompress {
        /// Gzipped input.
        src: PathBuf,
        /// Decompressed output.
        dest: PathBuf,
    },

    /// Concatenates the FASTQ files a tool left in a directory under names
    /// that are only known once it has run. A file is taken, in name order,
    /// if its name starts with one of `include` (or `include` is empty) and
    /// with none of `exclude`.
    Gather {
        /// Directory the tool wrote to.
        dir: PathBuf,
        /// Accepted file name prefixes.
        include: Vec<String>,
        /// Rejected file name prefixes.
        exclude: Vec<String>,
        /// Concatenated output.
        dest: PathBuf,
    },

    /// Moves a file a tool named after its input to the stage's own name.
    Rename {
        /// The tool's name for the file.
        from: PathBuf,
        /// The stage's name for the file.
        to: PathBuf,
    },
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Run(command) => write!(f, "{}", command),
            Task::Interleave { left, right, dest } => write!(
                f,
                "interleave {} {} > {}",
                left.display(),
                right.display(),
                dest.display()
            ),
            Task::Deinterleave { src, left, right } => write!(
                f,
                "deinterleave {} > {} {}",
                src.display(),
                left.display(),
                right.display()
            ),
            Task::Concatenate { sources, dest } => {
                write!(f, "concatenate")?;
                for source in sources {
                    write!(f, " {}", source.display())?;
                }
                write!(f, " > {}", dest.display())
            }
            Task::Decompress { src, dest } => {
                write!(f, "gunzip {} > {}", src.display(), dest.display())
            }
            Task::Gather {
                dir,
                include,
                exclude,
                dest,
            } => {
                write!(f, "gather {}", dir.display())?;
                for prefix in include {
                    write!(f, " +{}", prefix)?;
                }
                for prefix in exclude {
                    write!(f, " -{}", prefix)?;
                }
                write!(f, " > {}", dest.display())
            }
            Task::Rename { from, to } => {
                write!(f, "mv {} {}", from.display(), to.display())
            }
        }
    }
}

/// A memoized piece of a stage.
///
/// If every path in `outputs` already exists the tasks are skipped; either
/// way the updates are applied and every record in `records` is marked as
/// processed by the stage.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Step {
    /// Human-readable description for logging.
    pub label: String,

    /// Files whose existence means the step has already run.
    pub outputs: Vec<PathBuf>,

    /// Work to do if the step has not already run.
    pub tasks: Vec<Task>,

    /// Changes to apply to records (by store index) once the step is done.
    pub updates: Vec<(usize, RecordUpdate)>,

    /// Records (by store index) this step processes.
    pub records: Vec<usize>,
}

impl Step {
    /// Creates an empty step.
    pub fn new<L>(label: L) -> Self
    where
        L: Into<String>,
    {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    /// Adds a file that the step produces.
    pub fn output<P>(mut self, path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        self.outputs.push(path.into());
        self
    }

    /// Adds a task.
    pub fn task(mut self, task: Task) -> Self {
        self.tasks.push(task);
        self
    }

    /// Adds a tool invocation.
    pub fn run(self, command: CommandLine) -> Self {
        self.task(Task::Run(command))
    }

    /// Adds a record update; the record is also marked as processed.
    pub fn update(mut self, index: usize, update: RecordUpdate) -> Self {
        self.updates.push((index, update));
        self.touch(index)
    }

    /// Marks a record as processed by this step without changing it.
    pub fn touch(mut self, index: usize) -> Self {
        if !self.records.contains(&index) {
            self.records.push(index);
        }
        self
    }

    /// Whether every output already exists.
    pub fn is_done(&self) -> bool {
        !self.outputs.is_empty() && self.outputs.iter().all(|p| p.exists())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_is_done_requires_every_output() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.fq");
        let b = dir.path().join("b.fq");
        std::fs::write(&a, "").unwrap();

        assert!(!Step::new("empty").is_done());
        assert!(Step::new("a").output(&a).is_done());
        assert!(!Step::new("ab").output(&a).output(&b).is_done());
    }

    #[test]
    fn test_records_are_not_duplicated() {
        let step = Step::new("s")
            .update(0, RecordUpdate::current("/out/a.fq"))
            .touch(0)
            .touch(1);
        assert_eq!(step.records, vec![0, 1]);
    }
}
