//! The per-file metadata threaded through a preprocessing run.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;

use crate::errors::Error;

//=======//
// Mates //
//=======//

/// Which half of a read pair a file represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Mate {
    /// The first read of each fragment.
    #[serde(rename = "1")]
    One,

    /// The second read of each fragment.
    #[serde(rename = "2")]
    Two,

    /// Single-end reads.
    #[serde(rename = "single")]
    Single,
}

impl fmt::Display for Mate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mate::One => write!(f, "1"),
            Mate::Two => write!(f, "2"),
            Mate::Single => write!(f, "single"),
        }
    }
}

impl FromStr for Mate {
    type Err = Error;

    /// Parses a manifest mate column. Only `1` and `2` are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(Mate::One),
            "2" => Ok(Mate::Two),
            other => Err(Error::InvalidMate(other.to_string())),
        }
    }
}

//=============//
// Stage kinds //
//=============//

/// The kinds of processing a run can apply to its reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    /// Decompression of gzipped inputs.
    Unzip,

    /// Quality and adapter trimming.
    Trim,

    /// Sequencing error correction.
    Correct,

    /// Abundance normalization.
    Normalize,

    /// Contamination filtering.
    Filter,

    /// Alignment against a reference.
    Align,

    /// Expression quantification.
    Quantify,
}

impl StageKind {
    /// Every stage kind, in the conventional pipeline order.
    pub const ALL: [StageKind; 7] = [
        StageKind::Unzip,
        StageKind::Trim,
        StageKind::Correct,
        StageKind::Normalize,
        StageKind::Filter,
        StageKind::Align,
        StageKind::Quantify,
    ];

    /// The lowercase name of the stage kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Unzip => "unzip",
            StageKind::Trim => "trim",
            StageKind::Correct => "correct",
            StageKind::Normalize => "normalize",
            StageKind::Filter => "filter",
            StageKind::Align => "align",
            StageKind::Quantify => "quantify",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StageKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown stage kind: {}", s))
    }
}

//================//
// Sample records //
//================//

/// One physical read file at one point in the pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// Logical sample identifier, stable across every derived file.
    pub name: String,

    /// Experimental condition or tag (may equal `name`).
    #[serde(rename = "type")]
    pub condition: String,

    /// One-based replicate index.
    pub replicate: u32,

    /// Which half of a pair this file represents.
    pub mate: Mate,

    /// Absolute path as first loaded. Never changes.
    pub original_file: PathBuf,

    /// The most recently produced file representing this record's reads.
    pub current: PathBuf,

    /// Reads orphaned by a stage (their mate was discarded).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unpaired: Option<PathBuf>,

    /// The value of `current` before the last stage that changed it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<PathBuf>,

    /// Stage kind to the name of the tool that performed it, in the order
    /// the stages were first applied.
    #[serde(default)]
    pub processed: IndexMap<StageKind, String>,

    /// Alignment produced for this record's reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<PathBuf>,

    /// Quantification produced for this record's reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantification: Option<PathBuf>,
}

impl SampleRecord {
    /// Creates a freshly loaded record whose `current` is its original file.
    pub fn new<N, C, P>(name: N, condition: C, replicate: u32, mate: Mate, file: P) -> Self
    where
        N: Into<String>,
        C: Into<String>,
        P: Into<PathBuf>,
    {
        let file = file.into();

        Self {
            name: name.into(),
            condition: condition.into(),
            replicate,
            mate,
            original_file: file.clone(),
            current: file,
            unpaired: None,
            previous: None,
            processed: IndexMap::new(),
            alignment: None,
            quantification: None,
        }
    }

    /// The identity shared by both halves of a pair.
    pub fn pair_key(&self) -> (&str, &str, u32) {
        (&self.name, &self.condition, self.replicate)
    }

    /// Points `current` at a new file, remembering the old one. Pointing it
    /// at the file it already references changes nothing.
    pub fn advance(&mut self, next: PathBuf) {
        if next != self.current {
            let previous = std::mem::replace(&mut self.current, next);
            self.previous = Some(previous);
        }
    }

    /// Records that a stage was applied by the given tool.
    pub fn mark_processed<T>(&mut self, kind: StageKind, tool: T)
    where
        T: Into<String>,
    {
        self.processed.insert(kind, tool.into());
    }

    /// Applies the changes a stage made to this record.
    pub fn apply(&mut self, update: &RecordUpdate) {
        if let Some(current) = &update.current {
            self.advance(current.clone());
        }

        if update.clear_unpaired {
            self.unpaired = None;
        }

        if let Some(unpaired) = &update.unpaired {
            self.unpaired = Some(unpaired.clone());
        }

        if let Some(alignment) = &update.alignment {
            self.alignment = Some(alignment.clone());
        }

        if let Some(quantification) = &update.quantification {
            self.quantification = Some(quantification.clone());
        }
    }
}

/// The changes a stage makes to one [`SampleRecord`]. Fields left as `None`
/// are not touched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RecordUpdate {
    /// New value for `current`.
    pub current: Option<PathBuf>,

    /// New value for `unpaired`.
    pub unpaired: Option<PathBuf>,

    /// Whether `unpaired` should be cleared (applied before `unpaired`).
    pub clear_unpaired: bool,

    /// New alignment result.
    pub alignment: Option<PathBuf>,

    /// New quantification result.
    pub quantification: Option<PathBuf>,
}

impl RecordUpdate {
    /// An update that only moves `current`.
    pub fn current<P>(path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            current: Some(path.into()),
            ..Default::default()
        }
    }

    /// Also sets `unpaired`.
    pub fn with_unpaired<P>(mut self, path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        self.unpaired = Some(path.into());
        self
    }

    /// Also clears `unpaired`.
    pub fn without_unpaired(mut self) -> Self {
        self.clear_unpaired = true;
        self
    }

    /// An update that only sets `unpaired`.
    pub fn unpaired<P>(path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            unpaired: Some(path.into()),
            ..Default::default()
        }
    }

    /// An update that only sets the alignment result.
    pub fn alignment<P>(path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            alignment: Some(path.into()),
            ..Default::default()
        }
    }

    /// An update that only sets the quantification result.
    pub fn quantification<P>(path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            quantification: Some(path.into()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SampleRecord {
        SampleRecord::new("test", "A", 1, Mate::One, "/data/A_1.fq")
    }

    #[test]
    fn test_parse_mate() {
        assert_eq!("1".parse::<Mate>().unwrap(), Mate::One);
        assert_eq!(" 2 ".parse::<Mate>().unwrap(), Mate::Two);
        assert!(matches!("3".parse::<Mate>(), Err(Error::InvalidMate(m)) if m == "3"));
        assert!(matches!("single".parse::<Mate>(), Err(Error::InvalidMate(_))));
    }

    #[test]
    fn test_parse_stage_kind() {
        assert_eq!("trim".parse::<StageKind>().unwrap(), StageKind::Trim);
        assert_eq!("Normalize".parse::<StageKind>().unwrap(), StageKind::Normalize);
        assert!("assemble".parse::<StageKind>().is_err());
    }

    #[test]
    fn test_advance_tracks_previous() {
        let mut record = record();
        record.advance(PathBuf::from("/out/test_A_1-1.t.fq"));
        assert_eq!(record.current, PathBuf::from("/out/test_A_1-1.t.fq"));
        assert_eq!(record.previous, Some(PathBuf::from("/data/A_1.fq")));
        assert_eq!(record.original_file, PathBuf::from("/data/A_1.fq"));

        record.advance(PathBuf::from("/out/test_A_1-1.t.fq"));
        assert_eq!(record.previous, Some(PathBuf::from("/data/A_1.fq")));
    }

    #[test]
    fn test_apply_update() {
        let mut record = record();
        record.unpaired = Some(PathBuf::from("/out/old.tU.fq"));

        record.apply(&RecordUpdate::current("/out/x.fq").without_unpaired());
        assert_eq!(record.current, PathBuf::from("/out/x.fq"));
        assert_eq!(record.unpaired, None);

        record.apply(&RecordUpdate::alignment("/out/x.sam"));
        assert_eq!(record.current, PathBuf::from("/out/x.fq"));
        assert_eq!(record.alignment, Some(PathBuf::from("/out/x.sam")));
    }

    #[test]
    fn test_processed_keeps_first_application_order() {
        let mut record = record();
        record.mark_processed(StageKind::Trim, "trimmomatic");
        record.mark_processed(StageKind::Normalize, "bbnorm");
        record.mark_processed(StageKind::Trim, "trimmomatic");

        let stages: Vec<_> = record.processed.keys().copied().collect();
        assert_eq!(stages, vec![StageKind::Trim, StageKind::Normalize]);
    }

    #[test]
    fn test_serialized_field_names() {
        let mut record = record();
        record.mark_processed(StageKind::Trim, "trimmomatic");
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["type"], "A");
        assert_eq!(value["mate"], "1");
        assert_eq!(value["processed"]["trim"], "trimmomatic");
        assert!(value.get("unpaired").is_none());
    }
}
