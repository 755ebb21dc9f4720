use clap::Parser;
use clap::Subcommand;
use git_testament::git_testament;
use git_testament::render_testament;

use readprep::encoding::command::EncodingArgs;
use readprep::errors;
use readprep::errors::ExitCode;
use readprep::interleave::command::DeinterleaveArgs;
use readprep::interleave::command::InterleaveArgs;
use readprep::provenance::command::InspectArgs;
use readprep::stages::command::RunArgs;

git_testament!(TESTAMENT);

#[derive(Parser)]
#[command(
    name = "readprep",
    author,
    version = render_testament!(TESTAMENT),
    propagate_version = true,
    about
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Only errors are printed to the stderr stream.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// All available information, including debug information, is printed to
    /// stderr.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Runs preprocessing stages over a set of read files.
    Run(RunArgs),

    /// Detects the Phred offset of a FASTQ file's quality scores.
    Encoding(EncodingArgs),

    /// Interleaves two paired FASTQ files into one.
    Interleave(InterleaveArgs),

    /// Splits an interleaved FASTQ file into its two mates.
    Deinterleave(DeinterleaveArgs),

    /// Prints the provenance log of a run.
    Inspect(InspectArgs),
}

fn main() {
    let cli = Cli::parse();

    let mut level = tracing::Level::INFO;
    if cli.quiet {
        level = tracing::Level::ERROR;
    } else if cli.verbose {
        level = tracing::Level::DEBUG;
    }

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let result = match cli.command {
        Command::Run(args) => readprep::stages::command::run(args),
        Command::Encoding(args) => readprep::encoding::command::encoding(args),
        Command::Interleave(args) => readprep::interleave::command::interleave(args),
        Command::Deinterleave(args) => readprep::interleave::command::deinterleave(args),
        Command::Inspect(args) => readprep::provenance::command::inspect(args),
    };

    if let Err(err) = result {
        let code = err
            .downcast_ref::<readprep::Error>()
            .map(|e| e.exit_code())
            .unwrap_or(ExitCode::Failure);
        errors::exit(format!("{:#}", err), code);
    }
}
