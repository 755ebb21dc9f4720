//! Per-stage statistics artifacts.
//!
//! Each stage leaves a plain-text `<tool>.stats` file in the output directory
//! with one `value\tcount\tpercentage` row per line.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;

use crate::errors::Result;
use crate::utils::atomic;
use crate::utils::display::PercentageFormat;
use crate::utils::formats::fastq;

/// One row of a statistics artifact.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatsRow {
    /// What was counted.
    pub value: String,

    /// How many times it was counted.
    pub count: u64,
}

/// The statistics a stage reports about its outputs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StageStats {
    rows: Vec<StatsRow>,
    total: u64,
}

impl StageStats {
    /// Creates an empty set of statistics whose percentages are relative to
    /// `total`.
    pub fn with_total(total: u64) -> Self {
        Self {
            rows: Vec::new(),
            total,
        }
    }

    /// Appends a row.
    pub fn push<V>(&mut self, value: V, count: u64)
    where
        V: ToString,
    {
        self.rows.push(StatsRow {
            value: value.to_string(),
            count,
        });
    }

    /// The rows, in insertion order.
    pub fn rows(&self) -> &[StatsRow] {
        &self.rows
    }

    /// The denominator of every percentage.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Writes the statistics to `<dir>/<tool>.stats`.
    pub fn write_to_dir<P>(&self, dir: P, tool: &str) -> Result<PathBuf>
    where
        P: AsRef<Path>,
    {
        let path = dir.as_ref().join(format!("{}.stats", tool));
        atomic::write(&path, self.to_string())?;
        debug!("  [*] Wrote statistics to {}.", path.display());
        Ok(path)
    }
}

impl fmt::Display for StageStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            writeln!(
                f,
                "{}\t{}\t{}",
                row.value,
                row.count,
                PercentageFormat(row.count, self.total)
            )?;
        }

        Ok(())
    }
}

/// The distribution of read lengths across a set of FASTQ files.
pub fn read_lengths<I, P>(files: I) -> Result<StageStats>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut lengths: BTreeMap<usize, u64> = BTreeMap::new();
    let mut total = 0;

    for file in files {
        let mut reader = fastq::reader(file)?;

        for result in reader.records() {
            let record = result?;
            *lengths.entry(record.sequence().len()).or_default() += 1;
            total += 1;
        }
    }

    let mut stats = StageStats::with_total(total);
    for (length, count) in lengths {
        stats.push(length, count);
    }

    Ok(stats)
}

/// The first whitespace-delimited token of a FASTQ header, which is what
/// identifies a read across tools that append their own annotations.
fn read_id(name: &[u8]) -> &[u8] {
    name.split(|b| b.is_ascii_whitespace())
        .next()
        .unwrap_or_default()
}

/// Counts, per read position, how many bases differ between each pair of
/// files. Reads are matched by identifier; reads present in only one of the
/// files are ignored. Percentages are relative to the number of reads
/// compared.
pub fn corrections<I, B, A>(pairs: I) -> Result<StageStats>
where
    I: IntoIterator<Item = (B, A)>,
    B: AsRef<Path>,
    A: AsRef<Path>,
{
    let mut positions: BTreeMap<usize, u64> = BTreeMap::new();
    let mut compared = 0;

    for (before, after) in pairs {
        let mut before = fastq::reader(before)?;
        let mut after = fastq::reader(after)?;

        for (b, a) in before.records().zip(after.records()) {
            let (b, a) = (b?, a?);

            if read_id(b.name()) != read_id(a.name()) {
                continue;
            }

            compared += 1;

            for (i, (x, y)) in b.sequence().iter().zip(a.sequence().iter()).enumerate() {
                if !x.eq_ignore_ascii_case(y) {
                    *positions.entry(i).or_default() += 1;
                }
            }
        }
    }

    let mut stats = StageStats::with_total(compared);
    for (position, count) in positions {
        stats.push(position, count);
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_render_rows() {
        let mut stats = StageStats::with_total(8);
        stats.push(100, 6);
        stats.push(75, 2);

        assert_eq!(stats.to_string(), "100\t6\t75.00%\n75\t2\t25.00%\n");

        let mut empty = StageStats::with_total(0);
        empty.push("reads", 0);
        assert_eq!(empty.to_string(), "reads\t0\tN/A\n");
    }

    #[test]
    fn test_read_lengths_and_write() {
        let dir = TempDir::new().unwrap();
        let reads = dir.path().join("a.fq");
        fs::write(&reads, "@a\nACGT\n+\nIIII\n@b\nAC\n+\nII\n@c\nACGT\n+\nIIII\n").unwrap();

        let stats = read_lengths([&reads]).unwrap();
        assert_eq!(stats.total(), 3);
        assert_eq!(
            stats.rows(),
            &[
                StatsRow {
                    value: String::from("2"),
                    count: 1
                },
                StatsRow {
                    value: String::from("4"),
                    count: 2
                },
            ]
        );

        let path = stats.write_to_dir(dir.path(), "trimmomatic").unwrap();
        assert_eq!(path, dir.path().join("trimmomatic.stats"));
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "2\t1\t33.33%\n4\t2\t66.67%\n"
        );
    }

    #[test]
    fn test_corrections_by_position() {
        let dir = TempDir::new().unwrap();
        let before = dir.path().join("a.fq");
        let after = dir.path().join("a.cor.fq");
        fs::write(&before, "@a\nACGT\n+\nIIII\n@b\nACGT\n+\nIIII\n").unwrap();
        fs::write(
            &after,
            "@a cor\nACGA\n+\nIIII\n@b l:1 m:2 h:3\nTCGA\n+\nIIII\n",
        )
        .unwrap();

        let stats = corrections([(&before, &after)]).unwrap();
        assert_eq!(stats.total(), 2);
        assert_eq!(stats.to_string(), "0\t1\t50.00%\n3\t2\t100.00%\n");
    }
}
