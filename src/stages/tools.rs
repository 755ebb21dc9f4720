//! The external tools each stage can be performed by.
//!
//! A [`Tool`] turns the current state of the store into a list of
//! [`Step`]s. It never runs anything itself: the orchestrator decides which
//! steps are already done, runs the rest, and applies their record updates.

pub mod bbnorm;
pub mod bowtie2;
pub mod bwa;
pub mod express;
pub mod facs;
pub mod gunzip;
pub mod hammer;
pub mod khmer;
pub mod rcorrector;
pub mod salmon;
pub mod skewer;
pub mod snap;
pub mod trimmomatic;

use std::path::PathBuf;
use std::str::FromStr;

use itertools::Itertools;
use serde::Deserialize;
use serde::Serialize;

use super::descriptor::descriptor;
use super::descriptor::DataKind;
use super::orchestrator::RunContext;
use super::step::Step;
use crate::errors::Error;
use crate::errors::Result;
use crate::invoker::CommandLine;
use crate::invoker::ToolOutput;
use crate::samples::SampleStore;
use crate::samples::StageKind;
use crate::stats;
use crate::stats::StageStats;

/// One external tool performing one kind of stage.
pub trait Tool {
    /// The stage this tool performs.
    fn kind(&self) -> StageKind;

    /// The tool's name, as recorded in each record's `processed` map.
    fn name(&self) -> &'static str;

    /// Executables that must be resolvable before the stage starts.
    fn programs(&self) -> Vec<&'static str>;

    /// What the tool needs as input.
    fn consumes(&self) -> DataKind {
        DataKind::Reads
    }

    /// Describes the work needed to apply the stage to every record.
    fn steps(&self, store: &SampleStore, context: &RunContext) -> Result<Vec<Step>>;

    /// Sees the output of every command that ran.
    fn observe(&mut self, _command: &CommandLine, _output: &ToolOutput) {}

    /// The file name, before `.stats`, that statistics are written to.
    fn stats_name(&self) -> &'static str {
        self.name()
    }

    /// Statistics about the stage's results, written to `<stats name>.stats`.
    /// Returning `None` leaves any existing statistics file untouched.
    ///
    /// By default a stage that produces reads reports the read length
    /// distribution of every record's current file.
    fn stats(&self, store: &SampleStore) -> Result<Option<StageStats>> {
        match descriptor(self.kind()).produces {
            DataKind::Reads => {
                let files = store.records().iter().map(|r| &r.current).unique();
                stats::read_lengths(files).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Runs once after every step has been applied.
    fn finish(&self, _store: &SampleStore, _context: &RunContext) -> Result<()> {
        Ok(())
    }
}

//=================//
// Tool parameters //
//=================//

/// Every tool's tunable parameters. Missing keys in a parameter file take
/// their defaults.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ToolParams {
    /// Parameters for Trimmomatic.
    pub trimmomatic: trimmomatic::TrimmomaticParams,

    /// Parameters for Skewer.
    pub skewer: skewer::SkewerParams,

    /// Parameters for Rcorrector.
    pub rcorrector: rcorrector::RcorrectorParams,

    /// Parameters for khmer.
    pub khmer: khmer::KhmerParams,

    /// Parameters for BBNorm.
    pub bbnorm: bbnorm::BbnormParams,

    /// Parameters for FACS.
    pub facs: facs::FacsParams,

    /// Parameters for Bowtie2 alignment.
    pub bowtie2: bowtie2::Bowtie2Params,

    /// Parameters for SNAP.
    pub snap: snap::SnapParams,

    /// Reference sequences used by the align and quantify stages.
    pub reference: Option<PathBuf>,

    /// Contaminant sequences removed by the filter stage.
    pub contaminants: Option<PathBuf>,
}

//============//
// Tool specs //
//============//

/// A `<kind>:<tool>` request for a stage, such as `trim:trimmomatic`. The
/// tool may be omitted to use the default for that stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolSpec {
    /// The stage.
    pub kind: StageKind,

    /// The tool performing it.
    pub tool: String,
}

impl ToolSpec {
    /// The tool used when a request names only a stage.
    pub fn default_tool(kind: StageKind) -> &'static str {
        match kind {
            StageKind::Unzip => "gunzip",
            StageKind::Trim => "trimmomatic",
            StageKind::Correct => "rcorrector",
            StageKind::Normalize => "bbnorm",
            StageKind::Filter => "bowtie2",
            StageKind::Align => "bowtie2",
            StageKind::Quantify => "salmon",
        }
    }
}

impl FromStr for ToolSpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (kind, tool) = match s.split_once(':') {
            Some((kind, tool)) => (kind.parse::<StageKind>()?, tool.to_lowercase()),
            None => {
                let kind = s.parse::<StageKind>()?;
                (kind, Self::default_tool(kind).to_string())
            }
        };

        Ok(Self { kind, tool })
    }
}

fn required(path: &Option<PathBuf>, what: &str, spec: &ToolSpec) -> Result<PathBuf> {
    path.clone().ok_or_else(|| {
        Error::MalformedInput(format!(
            "{}:{} needs {} to be provided",
            spec.kind, spec.tool, what
        ))
    })
}

/// Creates the requested tool.
pub fn build(spec: &ToolSpec, params: &ToolParams) -> Result<Box<dyn Tool>> {
    let tool: Box<dyn Tool> = match (spec.kind, spec.tool.as_str()) {
        (StageKind::Unzip, "gunzip") => Box::new(gunzip::Gunzip),
        (StageKind::Trim, "trimmomatic") => {
            Box::new(trimmomatic::Trimmomatic::new(params.trimmomatic.clone()))
        }
        (StageKind::Trim, "skewer") => Box::new(skewer::Skewer::new(params.skewer.clone())),
        (StageKind::Correct, "rcorrector") => {
            Box::new(rcorrector::Rcorrector::new(params.rcorrector.clone()))
        }
        (StageKind::Correct, "hammer") | (StageKind::Correct, "bayeshammer") => {
            Box::new(hammer::Hammer)
        }
        (StageKind::Normalize, "khmer") => Box::new(khmer::Khmer::new(params.khmer.clone())),
        (StageKind::Normalize, "bbnorm") => Box::new(bbnorm::Bbnorm::new(params.bbnorm.clone())),
        (StageKind::Filter, "bowtie2") | (StageKind::Filter, "bowtie2-filter") => Box::new(
            bowtie2::Bowtie2Filter::new(required(&params.contaminants, "contaminants", spec)?),
        ),
        (StageKind::Filter, "facs") => Box::new(facs::Facs::new(
            required(&params.contaminants, "contaminants", spec)?,
            params.facs.clone(),
        )),
        (StageKind::Align, "bowtie2") => Box::new(bowtie2::Bowtie2::new(
            required(&params.reference, "a reference", spec)?,
            params.bowtie2.clone(),
        )),
        (StageKind::Align, "bwa") => {
            Box::new(bwa::Bwa::new(required(&params.reference, "a reference", spec)?))
        }
        (StageKind::Align, "snap") => Box::new(snap::Snap::new(
            required(&params.reference, "a reference", spec)?,
            params.snap.clone(),
        )),
        (StageKind::Quantify, "salmon") => Box::new(salmon::Salmon::new(required(
            &params.reference,
            "a reference",
            spec,
        )?)),
        (StageKind::Quantify, "express") => Box::new(express::Express::new(required(
            &params.reference,
            "a reference",
            spec,
        )?)),
        (kind, tool) => {
            return Err(Error::MalformedInput(format!(
                "no tool named `{}` performs the {} stage",
                tool, kind
            )))
        }
    };

    Ok(tool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tool_spec() {
        let spec = "trim:Trimmomatic".parse::<ToolSpec>().unwrap();
        assert_eq!(spec.kind, StageKind::Trim);
        assert_eq!(spec.tool, "trimmomatic");

        let spec = "normalize".parse::<ToolSpec>().unwrap();
        assert_eq!(spec.tool, "bbnorm");

        assert!("assemble:trinity".parse::<ToolSpec>().is_err());
    }

    #[test]
    fn test_build_tools() {
        let mut params = ToolParams::default();

        let tool = build(&"normalize:khmer".parse().unwrap(), &params).unwrap();
        assert_eq!(tool.kind(), StageKind::Normalize);
        assert_eq!(tool.name(), "khmer");

        assert!(matches!(
            build(&"trim:khmer".parse().unwrap(), &params),
            Err(Error::MalformedInput(_))
        ));
        assert!(matches!(
            build(&"align:bwa".parse().unwrap(), &params),
            Err(Error::MalformedInput(_))
        ));

        params.reference = Some(PathBuf::from("/ref/transcripts.fa"));
        let tool = build(&"quantify:express".parse().unwrap(), &params).unwrap();
        assert_eq!(tool.consumes(), DataKind::Alignment);

        let tool = build(&"align:snap".parse().unwrap(), &params).unwrap();
        assert_eq!(tool.name(), "snap");
        assert_eq!(
            build(&"correct:hammer".parse().unwrap(), &params).unwrap().name(),
            "bayeshammer"
        );
        assert_eq!(
            build(&"trim:skewer".parse().unwrap(), &params).unwrap().kind(),
            StageKind::Trim
        );
        assert!(matches!(
            build(&"filter:facs".parse().unwrap(), &params),
            Err(Error::MalformedInput(_))
        ));
        params.contaminants = Some(PathBuf::from("/ref/phix.fa"));
        assert_eq!(
            build(&"filter:facs".parse().unwrap(), &params).unwrap().name(),
            "facs"
        );
    }

    #[test]
    fn test_params_file_defaults() {
        let params: ToolParams =
            serde_json::from_str(r#"{ "khmer": { "cutoff": 5 }, "reference": "/ref.fa" }"#)
                .unwrap();

        assert_eq!(params.khmer.cutoff, 5);
        assert_eq!(params.khmer.k, 23);
        assert_eq!(params.trimmomatic.minlen, 40);
        assert_eq!(params.bbnorm.target, 20);
        assert_eq!(params.reference, Some(PathBuf::from("/ref.fa")));
    }
}
