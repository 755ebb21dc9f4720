// Shared fixtures for the end-to-end stage tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use readprep::invoker::CommandLine;
use readprep::invoker::ToolInvoker;
use readprep::invoker::ToolOutput;
use readprep::invoker::ToolResolver;
use readprep::samples::loader;
use readprep::samples::SampleStore;
use readprep::stages::Orchestrator;
use readprep::stages::RunContext;
use tempfile::TempDir;

/// Two reads with Phred+33 qualities.
pub const READS: &str = "@r1\nACGTACGTAC\n+\nIIIIIIIIII\n@r2\nTTGCA\n+\nIIIII\n";

/// An invoker that records every command and, instead of running anything,
/// writes the FASTQ or SAM files the tool would have produced inside the
/// output directory. A `%` in an output argument is replaced by each mate
/// number, the way `bowtie2 --un-conc` does.
pub struct MockInvoker {
    pub output_dir: PathBuf,
    pub commands: Vec<CommandLine>,
    pub fail: Option<(String, String)>,
    pub stderr: String,
    pub creates: Vec<(String, PathBuf, String)>,
}

impl MockInvoker {
    pub fn new<P>(output_dir: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            output_dir: output_dir.into(),
            commands: Vec::new(),
            fail: None,
            stderr: String::new(),
            creates: Vec::new(),
        }
    }

    /// Makes every invocation of `program` write `contents` to `path`, for
    /// tools that name their outputs themselves.
    pub fn creating<P>(mut self, program: &str, path: P, contents: &str) -> Self
    where
        P: Into<PathBuf>,
    {
        self.creates
            .push((program.to_string(), path.into(), contents.to_string()));
        self
    }

    /// Makes every invocation of `program` exit unsuccessfully.
    pub fn failing(mut self, program: &str, stderr: &str) -> Self {
        self.fail = Some((program.to_string(), stderr.to_string()));
        self
    }

    pub fn programs(&self) -> Vec<String> {
        self.commands
            .iter()
            .map(|c| program_name(c.program()))
            .collect()
    }
}

fn program_name<P>(program: P) -> String
where
    P: AsRef<Path>,
{
    program
        .as_ref()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_output(path: &Path, output_dir: &Path) -> bool {
    let extension = path.extension().and_then(|e| e.to_str());
    path.starts_with(output_dir) && matches!(extension, Some("fq") | Some("sam"))
}

impl ToolInvoker for MockInvoker {
    fn invoke(&mut self, command: &CommandLine) -> readprep::Result<ToolOutput> {
        self.commands.push(command.clone());

        if let Some((program, stderr)) = &self.fail {
            if program_name(command.program()) == *program {
                return Ok(ToolOutput::failure(stderr.clone()));
            }
        }

        for arg in command.arguments() {
            let arg = arg.to_string_lossy();
            let value = match arg.split_once('=') {
                Some((_, value)) => value,
                None => &*arg,
            };

            let paths = if value.contains('%') {
                vec![value.replace('%', "1"), value.replace('%', "2")]
            } else {
                vec![value.to_string()]
            };

            for path in paths {
                let path = Path::new(&path);
                if is_output(path, &self.output_dir) && !path.exists() {
                    fs::write(path, READS)?;
                }
            }
        }

        let program = program_name(command.program());
        for (creator, path, contents) in &self.creates {
            if *creator == program {
                fs::write(path, contents)?;
            }
        }

        if let Some(stdout) = command.stdout() {
            fs::write(stdout, "@HD\tVN:1.0\n")?;
        }

        Ok(ToolOutput::success(self.stderr.clone()))
    }
}

/// Resolves every tool to `/opt/bin/<name>` except the missing ones.
#[derive(Default)]
pub struct MockResolver {
    pub missing: Vec<String>,
}

impl MockResolver {
    pub fn without(name: &str) -> Self {
        Self {
            missing: vec![name.to_string()],
        }
    }
}

impl ToolResolver for MockResolver {
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        if self.missing.iter().any(|m| m == name) {
            None
        } else {
            Some(Path::new("/opt/bin").join(name))
        }
    }
}

/// A scratch area with an input directory and an output directory.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("input")).unwrap();
        Self { dir }
    }

    pub fn input(&self, name: &str) -> PathBuf {
        self.dir.path().join("input").join(name)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("output")
    }

    pub fn output(&self, name: &str) -> PathBuf {
        self.output_dir().join(name)
    }

    /// Writes a read file into the input directory.
    pub fn reads(&self, name: &str) -> PathBuf {
        let path = self.input(name);
        fs::write(&path, READS).unwrap();
        path
    }

    /// Writes a manifest listing `replicates` read pairs of sample `test`,
    /// type `A`, and loads it.
    pub fn paired_store(&self, replicates: u32) -> SampleStore {
        let mut manifest = String::new();

        for rep in 1..=replicates {
            for mate in 1..=2 {
                let file = self.reads(&format!("A{}_{}.fq", rep, mate));
                manifest.push_str(&format!("test,{},{},A,{}\n", file.display(), rep, mate));
            }
        }

        let path = self.input("manifest.csv");
        fs::write(&path, manifest).unwrap();
        loader::load_manifest(&path).unwrap()
    }

    pub fn orchestrator(&self) -> Orchestrator<MockInvoker, MockResolver> {
        self.orchestrator_with(MockInvoker::new(self.output_dir()), MockResolver::default())
    }

    pub fn orchestrator_with(
        &self,
        invoker: MockInvoker,
        resolver: MockResolver,
    ) -> Orchestrator<MockInvoker, MockResolver> {
        Orchestrator::new(invoker, resolver, RunContext::new(self.output_dir())).unwrap()
    }
}
