//! The in-memory collection of sample records for one run.

use std::path::PathBuf;

use indexmap::IndexMap;
use indexmap::IndexSet;
use serde::Deserialize;
use serde::Serialize;

use super::record::Mate;
use super::record::SampleRecord;
use crate::errors::Error;
use crate::errors::Result;

/// A group of records that a stage processes together: either both halves of
/// a read pair, or a single file. Records are referred to by their index in
/// the [`SampleStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Unit {
    /// Both halves of a read pair.
    Paired {
        /// Index of the mate 1 record.
        left: usize,

        /// Index of the mate 2 record.
        right: usize,
    },

    /// A record without a partner.
    Single(usize),
}

impl Unit {
    /// The index of the first (or only) record in the unit.
    pub fn first(&self) -> usize {
        match self {
            Unit::Paired { left, .. } => *left,
            Unit::Single(index) => *index,
        }
    }

    /// The indices of every record in the unit.
    pub fn indices(&self) -> Vec<usize> {
        match self {
            Unit::Paired { left, right } => vec![*left, *right],
            Unit::Single(index) => vec![*index],
        }
    }
}

/// The files that currently represent a run's reads.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Outputs {
    /// Current files of every mate 1 record.
    pub left: Vec<PathBuf>,

    /// Current files of every mate 2 record.
    pub right: Vec<PathBuf>,

    /// Current files of single-end records and every unpaired file.
    pub single: Vec<PathBuf>,
}

/// The collection of [`SampleRecord`]s threaded through a run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleStore {
    records: Vec<SampleRecord>,
}

impl SampleStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record to the end of the store.
    pub fn push(&mut self, record: SampleRecord) {
        self.records.push(record);
    }

    /// The number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Gets the record at an index.
    pub fn get(&self, index: usize) -> Option<&SampleRecord> {
        self.records.get(index)
    }

    /// Gets the record at an index mutably.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut SampleRecord> {
        self.records.get_mut(index)
    }

    /// All records, in load order.
    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    /// All records mutably, in load order.
    pub fn records_mut(&mut self) -> &mut [SampleRecord] {
        &mut self.records
    }

    /// Groups records into [`Unit`]s by `(name, type, replicate)`.
    ///
    /// A key with both a mate 1 and a mate 2 record forms a paired unit; a
    /// key with one record forms a single unit. Units are returned in order
    /// of first appearance. Two records with the same key and mate, or a
    /// single-end record sharing its key with anything else, are rejected.
    pub fn units(&self) -> Result<Vec<Unit>> {
        let mut groups: IndexMap<(&str, &str, u32), Vec<usize>> = IndexMap::new();

        for (index, record) in self.records.iter().enumerate() {
            groups.entry(record.pair_key()).or_default().push(index);
        }

        let mut units = Vec::with_capacity(groups.len());

        for ((name, condition, replicate), indices) in groups {
            match indices.as_slice() {
                [only] => units.push(Unit::Single(*only)),
                [a, b] => {
                    let (ma, mb) = (self.records[*a].mate, self.records[*b].mate);
                    match (ma, mb) {
                        (Mate::One, Mate::Two) => units.push(Unit::Paired {
                            left: *a,
                            right: *b,
                        }),
                        (Mate::Two, Mate::One) => units.push(Unit::Paired {
                            left: *b,
                            right: *a,
                        }),
                        _ => {
                            return Err(Error::MalformedInput(format!(
                                "sample {} (type {}, replicate {}) has mates {} and {}; \
                                expected one of each of 1 and 2",
                                name, condition, replicate, ma, mb
                            )))
                        }
                    }
                }
                _ => {
                    return Err(Error::MalformedInput(format!(
                        "sample {} (type {}, replicate {}) has {} files; expected at most 2",
                        name,
                        condition,
                        replicate,
                        indices.len()
                    )))
                }
            }
        }

        Ok(units)
    }

    /// Whether any record is half of a read pair.
    pub fn is_paired(&self) -> bool {
        self.records
            .iter()
            .any(|record| matches!(record.mate, Mate::One | Mate::Two))
    }

    /// The files that currently represent the reads, with duplicates removed
    /// and load order preserved.
    pub fn outputs(&self) -> Result<Outputs> {
        let mut left = IndexSet::new();
        let mut right = IndexSet::new();
        let mut single = IndexSet::new();

        for unit in self.units()? {
            match unit {
                Unit::Paired { left: l, right: r } => {
                    left.insert(self.records[l].current.clone());
                    right.insert(self.records[r].current.clone());
                }
                Unit::Single(index) => {
                    single.insert(self.records[index].current.clone());
                }
            }

            for index in unit.indices() {
                if let Some(unpaired) = &self.records[index].unpaired {
                    single.insert(unpaired.clone());
                }
            }
        }

        Ok(Outputs {
            left: left.into_iter().collect(),
            right: right.into_iter().collect(),
            single: single.into_iter().collect(),
        })
    }
}

impl FromIterator<SampleRecord> for SampleStore {
    fn from_iter<I: IntoIterator<Item = SampleRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SampleStore {
    type Item = &'a SampleRecord;
    type IntoIter = std::slice::Iter<'a, SampleRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
