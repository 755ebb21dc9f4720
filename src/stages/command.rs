//! Functionality relating to the `readprep run` subcommand itself.

use std::fs;
use std::path::PathBuf;

use anyhow::bail;
use anyhow::Context;
use clap::Args;
use tracing::info;

use super::orchestrator::Orchestrator;
use super::orchestrator::RunContext;
use super::tools;
use super::tools::Tool;
use super::tools::ToolParams;
use super::tools::ToolSpec;
use crate::invoker::PathResolver;
use crate::invoker::SystemInvoker;
use crate::samples::loader;
use crate::samples::SampleStore;
use crate::utils::pathbuf::absolute;

/// Clap arguments for the `readprep run` subcommand.
#[derive(Args)]
pub struct RunArgs {
    /// Manifest of `name,file,replicate,type,mate` lines.
    #[arg(short, long, value_name = "CSV", conflicts_with_all = ["left", "right", "single"])]
    manifest: Option<PathBuf>,

    /// Comma-separated FASTQ files holding the first read of each pair.
    #[arg(long, value_name = "FASTQ", value_delimiter = ',', requires = "right")]
    left: Vec<PathBuf>,

    /// Comma-separated FASTQ files holding the second read of each pair.
    #[arg(long, value_name = "FASTQ", value_delimiter = ',', requires = "left")]
    right: Vec<PathBuf>,

    /// Comma-separated single-end FASTQ files.
    #[arg(long, value_name = "FASTQ", value_delimiter = ',', conflicts_with_all = ["left", "right"])]
    single: Vec<PathBuf>,

    /// Sample name given to reads passed with `--left`/`--right` or
    /// `--single`.
    #[arg(long, value_name = "NAME", default_value = "sample")]
    name: String,

    /// Stage to run, as `<stage>` or `<stage>:<tool>` (such as
    /// `trim:trimmomatic`). Repeat to run several stages in order.
    #[arg(short, long = "stage", value_name = "STAGE", required = true)]
    stages: Vec<ToolSpec>,

    /// Directory every output is written to.
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Threads handed to each external tool.
    #[arg(short, long, value_name = "USIZE", default_value_t = 1)]
    threads: usize,

    /// Memory, in gigabytes, handed to tools that take a memory budget.
    #[arg(long, value_name = "GB", default_value_t = 4)]
    memory: usize,

    /// JSON file overriding tool parameters.
    #[arg(short, long, value_name = "JSON")]
    params: Option<PathBuf>,

    /// Reference sequences for the align and quantify stages.
    #[arg(short, long, value_name = "FASTA")]
    reference: Option<PathBuf>,

    /// Contaminant sequences for the filter stage.
    #[arg(long, value_name = "FASTA")]
    contaminants: Option<PathBuf>,

    /// Show a progress bar for each stage.
    #[arg(long)]
    progress: bool,
}

/// Loads the run's records from whichever input was given.
fn load(args: &RunArgs) -> anyhow::Result<SampleStore> {
    let store = if let Some(manifest) = &args.manifest {
        loader::load_manifest(manifest)
            .with_context(|| format!("loading manifest: {}", manifest.display()))?
    } else if !args.left.is_empty() {
        loader::load_reads(&args.left, &args.right, &args.name).context("loading read pairs")?
    } else if !args.single.is_empty() {
        loader::load_single(&args.single, &args.name).context("loading single-end reads")?
    } else {
        bail!("one of --manifest, --left/--right or --single must be given");
    };

    if store.is_empty() {
        bail!("no read files were given");
    }

    Ok(store)
}

/// Reads the parameter file (if any) and applies the command line
/// overrides on top.
fn params(args: &RunArgs) -> anyhow::Result<ToolParams> {
    let mut params = match &args.params {
        Some(path) => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("reading parameter file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("parsing parameter file: {}", path.display()))?
        }
        None => ToolParams::default(),
    };

    if let Some(reference) = &args.reference {
        params.reference = Some(absolute(reference)?);
    }

    if let Some(contaminants) = &args.contaminants {
        params.contaminants = Some(absolute(contaminants)?);
    }

    Ok(params)
}

/// Main function for the `readprep run` subcommand.
pub fn run(args: RunArgs) -> anyhow::Result<()> {
    info!("Starting run subcommand.");

    // (1) Load the records and build the requested tools.
    let mut store = load(&args)?;
    let params = params(&args)?;
    let mut tools = args
        .stages
        .iter()
        .map(|spec| tools::build(spec, &params))
        .collect::<Result<Vec<Box<dyn Tool>>, _>>()?;

    // (2) Run every stage in order.
    let output_dir = absolute(&args.output_dir)?;
    let context = RunContext::new(&output_dir)
        .with_threads(args.threads)
        .with_memory(args.memory);
    let mut orchestrator =
        Orchestrator::new(SystemInvoker::new(), PathResolver::from_env(), context)
            .with_context(|| format!("creating output directory: {}", output_dir.display()))?
            .with_progress(args.progress);

    orchestrator.run_all(&mut tools, &mut store)?;

    // (3) Summarize where the reads ended up.
    let outputs = store.outputs()?;
    info!(
        "Run complete: {} left, {} right and {} single-end or unpaired files.",
        outputs.left.len(),
        outputs.right.len(),
        outputs.single.len()
    );
    info!(
        "  [*] Provenance log written to {}.",
        orchestrator.log().path().display()
    );

    Ok(())
}
