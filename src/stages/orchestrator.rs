//! Applies stages to a [`SampleStore`].
//!
//! For every step a tool describes, the orchestrator:
//!
//! 1. skips the step's tasks if all of its outputs already exist,
//! 2. otherwise runs the tasks in order, aborting with
//!    [`Error::StageFailed`] if a tool exits unsuccessfully,
//! 3. applies the step's record updates and marks its records as processed.
//!
//! Once every step is done, the store is snapshotted to the provenance log
//! and the stage's statistics are written. Execution is strictly sequential.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use flate2::read::MultiGzDecoder;
use indicatif::ProgressBar;
use indicatif::ProgressStyle;
use tracing::debug;
use tracing::info;

use super::descriptor::Plan;
use super::descriptor::PlannedStage;
use super::step::Step;
use super::step::Task;
use super::tools::Tool;
use crate::errors::Error;
use crate::errors::Result;
use crate::interleave;
use crate::invoker::ToolInvoker;
use crate::invoker::ToolResolver;
use crate::provenance::ProvenanceLog;
use crate::samples::SampleRecord;
use crate::samples::SampleStore;
use crate::utils::atomic::AtomicFile;
use crate::utils::formats::fastq;
use crate::utils::formats::BioinformaticsFileFormat;

//=============//
// Run context //
//=============//

/// Settings shared by every stage of a run.
#[derive(Clone, Debug)]
pub struct RunContext {
    /// Directory every output is written to.
    pub output_dir: PathBuf,

    /// Threads handed to each external tool.
    pub threads: usize,

    /// Memory (in gigabytes) handed to tools that take a memory budget.
    pub memory: usize,

    programs: HashMap<String, PathBuf>,
}

impl RunContext {
    /// A context writing to `output_dir` with one thread and 4 GB of memory.
    pub fn new<P>(output_dir: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            output_dir: output_dir.into(),
            threads: 1,
            memory: 4,
            programs: HashMap::new(),
        }
    }

    /// Sets the thread count.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Sets the memory budget in gigabytes.
    pub fn with_memory(mut self, memory: usize) -> Self {
        self.memory = memory;
        self
    }

    /// The path to run for a program: where it was resolved to, or its bare
    /// name if it has not been resolved.
    pub fn program(&self, name: &str) -> PathBuf {
        self.programs
            .get(name)
            .cloned()
            .unwrap_or_else(|| PathBuf::from(name))
    }

    /// `<output_dir>/<file_name>`.
    pub fn output<S>(&self, file_name: S) -> PathBuf
    where
        S: AsRef<Path>,
    {
        self.output_dir.join(file_name)
    }
}

//==============//
// Orchestrator //
//==============//

/// Runs stages against a store using an invoker for external tools.
pub struct Orchestrator<I, R> {
    invoker: I,
    resolver: R,
    context: RunContext,
    log: ProvenanceLog,
    show_progress: bool,
}

impl<I, R> Orchestrator<I, R>
where
    I: ToolInvoker,
    R: ToolResolver,
{
    /// Creates an orchestrator. The output directory is created if needed.
    pub fn new(invoker: I, resolver: R, context: RunContext) -> Result<Self> {
        fs::create_dir_all(&context.output_dir)?;
        let log = ProvenanceLog::in_directory(&context.output_dir);

        Ok(Self {
            invoker,
            resolver,
            context,
            log,
            show_progress: false,
        })
    }

    /// Shows a progress bar over each stage's steps.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// The run's settings.
    pub fn context(&self) -> &RunContext {
        &self.context
    }

    /// The run's provenance log.
    pub fn log(&self) -> &ProvenanceLog {
        &self.log
    }

    /// The invoker, for inspection once the run is over.
    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    /// Validates the order of the tools and then runs each as a stage.
    pub fn run_all(&mut self, tools: &mut [Box<dyn Tool>], store: &mut SampleStore) -> Result<()> {
        let plan = Plan::new(
            tools
                .iter()
                .map(|tool| PlannedStage {
                    kind: tool.kind(),
                    tool: tool.name().to_string(),
                    consumes: tool.consumes(),
                })
                .collect(),
        )?;

        debug!(
            "  [*] Plan: {}",
            plan.stages()
                .iter()
                .map(|s| format!("{}:{}", s.kind, s.tool))
                .collect::<Vec<_>>()
                .join(" -> ")
        );

        for tool in tools.iter_mut() {
            self.run_stage(tool.as_mut(), store)?;
        }

        Ok(())
    }

    /// Applies one stage to every record in the store.
    pub fn run_stage(&mut self, tool: &mut dyn Tool, store: &mut SampleStore) -> Result<()> {
        let (kind, name) = (tool.kind(), tool.name());
        info!("Starting the {} stage with {}.", kind, name);

        // (1) Every executable has to be available before anything runs.
        for program in tool.programs() {
            let path = self.resolver.require(program)?;
            self.context.programs.insert(program.to_string(), path);
        }

        // (2) Describe the work.
        let steps = tool.steps(store, &self.context)?;

        let pb = if self.show_progress {
            ProgressBar::new(steps.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:.cyan.bold} {spinner:.green} [{elapsed_precise}] [{bar}] {pos}/{len} {msg}")
                .progress_chars("=> "),
        );
        pb.set_prefix(kind.to_string());

        // (3) Run whatever has not been run before, then update the records.
        let (mut ran, mut skipped) = (0, 0);

        for step in &steps {
            pb.set_message(step.label.clone());

            if step.is_done() {
                info!("  [*] Skipping {}: output already exists.", step.label);
                skipped += 1;
            } else {
                debug!("  [*] Running {}.", step.label);
                for task in &step.tasks {
                    self.run_task(tool, task)?;
                }

                if let Some(missing) = step.outputs.iter().find(|p| !p.exists()) {
                    return Err(Error::MissingFile(missing.clone()));
                }
                ran += 1;
            }

            apply(step, store, tool)?;
            pb.inc(1);
        }

        pb.finish_and_clear();

        // (4) Persist what happened.
        self.log.snapshot(store)?;
        if let Some(stats) = tool.stats(store)? {
            stats.write_to_dir(&self.context.output_dir, tool.stats_name())?;
        }
        tool.finish(store, &self.context)?;

        info!(
            "Finished the {} stage ({} steps run, {} already done).",
            kind, ran, skipped
        );
        Ok(())
    }

    fn run_task(&mut self, tool: &mut dyn Tool, task: &Task) -> Result<()> {
        debug!("  [*] {}", task);

        match task {
            Task::Run(command) => {
                let output = self.invoker.invoke(command)?;

                if !output.success {
                    return Err(Error::StageFailed {
                        stage: tool.kind(),
                        tool: tool.name().to_string(),
                        stdout: output.stdout,
                        stderr: output.stderr,
                    });
                }

                tool.observe(command, &output);
            }
            Task::Interleave { left, right, dest } => {
                interleave::interleave(left, right, dest)?;
            }
            Task::Deinterleave { src, left, right } => {
                interleave::deinterleave(src, left, right)?;
            }
            Task::Concatenate { sources, dest } => {
                let mut writer = AtomicFile::create(dest)?;
                for source in sources {
                    io::copy(&mut fastq::open(source)?, &mut writer)?;
                }
                writer.commit()?;
            }
            Task::Decompress { src, dest } => {
                if !src.is_file() {
                    return Err(Error::MissingFile(src.clone()));
                }
                let mut reader = MultiGzDecoder::new(fs::File::open(src)?);
                let mut writer = AtomicFile::create(dest)?;
                io::copy(&mut reader, &mut writer)?;
                writer.commit()?;
            }
            Task::Gather {
                dir,
                include,
                exclude,
                dest,
            } => {
                let sources = gather(dir, include, exclude)?;
                if sources.is_empty() && !include.is_empty() {
                    return Err(Error::MissingFile(dir.join(format!("{}*", include.join("|")))));
                }

                let mut writer = AtomicFile::create(dest)?;
                for source in sources {
                    io::copy(&mut fastq::open(source)?, &mut writer)?;
                }
                writer.commit()?;
            }
            Task::Rename { from, to } => {
                if !from.exists() {
                    return Err(Error::MissingFile(from.clone()));
                }
                if from != to {
                    fs::rename(from, to)?;
                }
            }
        }

        Ok(())
    }
}

/// The FASTQ files in `dir` selected by name prefix, sorted by name.
fn gather(dir: &Path, include: &[String], exclude: &[String]) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::MissingFile(dir.to_path_buf()));
    }

    let mut sources = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name.to_string(),
            None => continue,
        };

        let included = include.is_empty() || include.iter().any(|p| name.starts_with(p.as_str()));
        let excluded = exclude.iter().any(|p| name.starts_with(p.as_str()));

        if included && !excluded && BioinformaticsFileFormat::try_detect(&path).is_some() {
            sources.push(path);
        }
    }

    sources.sort();
    Ok(sources)
}

/// Applies a finished (or skipped) step's updates to the store.
fn apply(step: &Step, store: &mut SampleStore, tool: &dyn Tool) -> Result<()> {
    for (index, update) in &step.updates {
        record_at(store, *index)?.apply(update);
    }

    for index in &step.records {
        record_at(store, *index)?.mark_processed(tool.kind(), tool.name());
    }

    Ok(())
}

fn record_at(store: &mut SampleStore, index: usize) -> Result<&mut SampleRecord> {
    store.get_mut(index).ok_or_else(|| {
        Error::MalformedInput(format!("stage referred to missing record {}", index))
    })
}
