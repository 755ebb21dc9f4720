//! Module holding the logic for computing the Phred offset of a FASTQ file.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::errors::Error;
use crate::errors::Result;
use crate::utils::args::NumberOfRecords;
use crate::utils::display::RecordCounter;
use crate::utils::formats::fastq;
use crate::utils::histogram::Histogram;

/// Highest quality character code that is still consistent with Phred+33.
const PHRED_33_MAX: usize = 74;

/// Highest quality character code that is still consistent with Phred+64.
const PHRED_64_MAX: usize = 105;

/// The number of records sampled when no limit is given.
pub const DEFAULT_SAMPLE_RECORDS: usize = 1000;

/// The additive constant that converts a quality character to a score.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PhredOffset {
    /// Sanger and Illumina 1.8+.
    #[serde(rename = "33")]
    Phred33 = 33,

    /// Illumina 1.3 through 1.7.
    #[serde(rename = "64")]
    Phred64 = 64,
}

impl PhredOffset {
    /// The numeric offset.
    pub fn value(&self) -> u8 {
        *self as u8
    }
}

impl fmt::Display for PhredOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Struct holding the final results for a `readprep encoding` call.
#[derive(Debug, Serialize)]
pub struct DerivedEncodingResult {
    /// The detected Phred offset.
    pub offset: PhredOffset,

    /// The number of records that were sampled.
    pub records_sampled: usize,

    /// The lowest quality character code observed.
    pub observed_min: u8,

    /// The highest quality character code observed.
    pub observed_max: u8,
}

/// Classifies a histogram of quality character codes by its highest
/// observed code.
pub fn classify<P>(path: P, histogram: &Histogram) -> Result<PhredOffset>
where
    P: AsRef<Path>,
{
    let unknown = |max: Option<usize>| Error::UnknownEncoding {
        path: path.as_ref().to_path_buf(),
        max: max.map(|m| m as u8),
    };

    match histogram.max_observed() {
        Some(max) if max <= PHRED_33_MAX => Ok(PhredOffset::Phred33),
        Some(max) if max <= PHRED_64_MAX => Ok(PhredOffset::Phred64),
        max => Err(unknown(max)),
    }
}

/// Samples up to `limit` records from the head of a FASTQ file and returns
/// the details of the Phred offset detected.
pub fn predict<P>(src: P, limit: NumberOfRecords) -> Result<DerivedEncodingResult>
where
    P: AsRef<Path>,
{
    let src = src.as_ref();
    let mut reader = fastq::reader(src)?;
    let mut histogram = Histogram::for_bytes();
    let mut counter = RecordCounter::default();

    for result in reader.records() {
        let record = result?;

        for code in record.quality_scores().iter() {
            // A byte always fits in the byte histogram.
            let _ = histogram.increment(*code as usize);
        }

        counter.inc();
        if counter.time_to_break(&limit) {
            break;
        }
    }

    let offset = classify(src, &histogram)?;

    // `classify` only succeeds when something was observed.
    let observed_min = histogram.min_observed().unwrap_or_default() as u8;
    let observed_max = histogram.max_observed().unwrap_or_default() as u8;

    debug!(
        "  [*] {}: phred+{} (quality codes {}..={} over {} records)",
        src.display(),
        offset,
        observed_min,
        observed_max,
        counter.get()
    );

    Ok(DerivedEncodingResult {
        offset,
        records_sampled: counter.get(),
        observed_min,
        observed_max,
    })
}

/// Detects the Phred offset of a FASTQ file from its first
/// [`DEFAULT_SAMPLE_RECORDS`] records.
pub fn detect<P>(src: P) -> Result<PhredOffset>
where
    P: AsRef<Path>,
{
    predict(src, NumberOfRecords::Some(DEFAULT_SAMPLE_RECORDS)).map(|result| result.offset)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use tempfile::TempDir;

    use super::*;

    fn fastq_with_quality(dir: &TempDir, name: &str, quality: &str) -> PathBuf {
        let path = dir.path().join(name);
        let sequence = "A".repeat(quality.len());
        let mut contents = String::new();

        for i in 0..120 {
            contents.push_str(&format!("@read{}\n{}\n+\n{}\n", i, sequence, quality));
        }

        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_phred_33() {
        let dir = TempDir::new().unwrap();
        let path = fastq_with_quality(&dir, "p33.fq", "#+5?IJ");
        assert_eq!(detect(&path).unwrap(), PhredOffset::Phred33);
    }

    #[test]
    fn test_phred_64() {
        let dir = TempDir::new().unwrap();
        let path = fastq_with_quality(&dir, "p64.fq", "BKTahi");
        let result = predict(&path, NumberOfRecords::All).unwrap();
        assert_eq!(result.offset, PhredOffset::Phred64);
        assert_eq!(result.records_sampled, 120);
        assert_eq!(result.observed_max, b'i');
    }

    #[test]
    fn test_boundaries() {
        let dir = TempDir::new().unwrap();

        // 'J' is 74 and 'i' is 105.
        let path = fastq_with_quality(&dir, "j.fq", "JJJJ");
        assert_eq!(detect(&path).unwrap(), PhredOffset::Phred33);

        let path = fastq_with_quality(&dir, "k.fq", "KKKK");
        assert_eq!(detect(&path).unwrap(), PhredOffset::Phred64);

        let path = fastq_with_quality(&dir, "j2.fq", "jjjj");
        assert!(matches!(
            detect(&path),
            Err(Error::UnknownEncoding { max: Some(106), .. })
        ));
    }

    #[test]
    fn test_empty_file_is_unknown() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.fq");
        fs::write(&path, "").unwrap();

        assert!(matches!(
            detect(&path),
            Err(Error::UnknownEncoding { max: None, .. })
        ));
    }

    #[test]
    fn test_only_the_sampled_prefix_counts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("mixed.fq");
        let mut contents = String::new();
        for i in 0..10 {
            contents.push_str(&format!("@read{}\nACGT\n+\nIIII\n", i));
        }
        contents.push_str("@late\nACGT\n+\nzzzz\n");
        fs::write(&path, contents).unwrap();

        let result = predict(&path, NumberOfRecords::Some(10)).unwrap();
        assert_eq!(result.offset, PhredOffset::Phred33);
        assert!(predict(&path, NumberOfRecords::All).is_err());
    }
}
