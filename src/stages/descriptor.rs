//! What each kind of stage consumes and produces, and validation of a
//! caller-chosen stage order against it.

use std::fmt;

use crate::errors::Error;
use crate::errors::Result;
use crate::samples::StageKind;

/// The kinds of data a stage can consume or produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataKind {
    /// FASTQ reads (a record's `current` and `unpaired` files).
    Reads,

    /// An alignment of the reads against a reference.
    Alignment,

    /// Expression estimates.
    Quantification,
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataKind::Reads => write!(f, "reads"),
            DataKind::Alignment => write!(f, "an alignment"),
            DataKind::Quantification => write!(f, "a quantification"),
        }
    }
}

/// The declared inputs and output of one kind of stage.
#[derive(Debug)]
pub struct StageDescriptor {
    /// The stage kind described.
    pub kind: StageKind,

    /// Data kinds that a tool for this stage may consume.
    pub consumes: &'static [DataKind],

    /// The data kind the stage produces.
    pub produces: DataKind,
}

const READS: &[DataKind] = &[DataKind::Reads];

/// Every stage kind's descriptor, in conventional pipeline order.
pub static STAGES: [StageDescriptor; 7] = [
    StageDescriptor {
        kind: StageKind::Unzip,
        consumes: READS,
        produces: DataKind::Reads,
    },
    StageDescriptor {
        kind: StageKind::Trim,
        consumes: READS,
        produces: DataKind::Reads,
    },
    StageDescriptor {
        kind: StageKind::Correct,
        consumes: READS,
        produces: DataKind::Reads,
    },
    StageDescriptor {
        kind: StageKind::Normalize,
        consumes: READS,
        produces: DataKind::Reads,
    },
    StageDescriptor {
        kind: StageKind::Filter,
        consumes: READS,
        produces: DataKind::Reads,
    },
    StageDescriptor {
        kind: StageKind::Align,
        consumes: READS,
        produces: DataKind::Alignment,
    },
    StageDescriptor {
        kind: StageKind::Quantify,
        consumes: &[DataKind::Reads, DataKind::Alignment],
        produces: DataKind::Quantification,
    },
];

/// Looks up the descriptor of a stage kind.
pub fn descriptor(kind: StageKind) -> &'static StageDescriptor {
    // `STAGES` holds one entry per kind, in declaration order.
    &STAGES[kind as usize]
}

/// One entry of a [`Plan`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedStage {
    /// The kind of stage.
    pub kind: StageKind,

    /// The tool performing it.
    pub tool: String,

    /// What the tool needs as input.
    pub consumes: DataKind,
}

/// An ordered list of stages that has been checked for impossible orderings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plan {
    stages: Vec<PlannedStage>,
}

impl Plan {
    /// Validates a stage order.
    ///
    /// Each tool must consume a data kind its stage accepts, and a tool that
    /// consumes an alignment must come after some align stage. Any other
    /// order is allowed.
    pub fn new(stages: Vec<PlannedStage>) -> Result<Self> {
        let mut aligned = false;

        for stage in &stages {
            let descriptor = descriptor(stage.kind);

            if !descriptor.consumes.contains(&stage.consumes) {
                return Err(Error::InvalidStageOrder(format!(
                    "{} cannot be used for the {} stage: it consumes {}",
                    stage.tool, stage.kind, stage.consumes
                )));
            }

            if stage.consumes == DataKind::Alignment && !aligned {
                return Err(Error::InvalidStageOrder(format!(
                    "{} ({}) needs an alignment, but no align stage runs before it",
                    stage.tool, stage.kind
                )));
            }

            if descriptor.produces == DataKind::Alignment {
                aligned = true;
            }
        }

        Ok(Self { stages })
    }

    /// The stages, in order.
    pub fn stages(&self) -> &[PlannedStage] {
        &self.stages
    }
}
