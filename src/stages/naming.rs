//! Deterministic names for the files each stage produces.
//!
//! A record's stem is `<name>_<type>_<replicate>-<mate>`; a single-end
//! record drops the `-<mate>` suffix. Stages append their own suffix, so a
//! trimmed mate 1 file is `<name>_<type>_<replicate>-1.t.fq`.

use std::path::Path;
use std::path::PathBuf;

use crate::samples::Mate;
use crate::samples::SampleRecord;

/// The stem shared by both halves of a pair: `<name>_<type>_<replicate>`.
pub fn unit_stem(record: &SampleRecord) -> String {
    format!("{}_{}_{}", record.name, record.condition, record.replicate)
}

/// The stem identifying one record's files.
pub fn record_stem(record: &SampleRecord) -> String {
    match record.mate {
        Mate::Single => unit_stem(record),
        mate => format!("{}-{}", unit_stem(record), mate),
    }
}

/// `<dir>/<stem>.<suffix>`.
pub fn output_path<P>(dir: P, stem: &str, suffix: &str) -> PathBuf
where
    P: AsRef<Path>,
{
    dir.as_ref().join(format!("{}.{}", stem, suffix))
}

/// The path of a record's output for a stage suffix.
pub fn record_output<P>(dir: P, record: &SampleRecord, suffix: &str) -> PathBuf
where
    P: AsRef<Path>,
{
    output_path(dir, &record_stem(record), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stems() {
        let paired = SampleRecord::new("test", "A", 1, Mate::Two, "/data/A_2.fq");
        assert_eq!(record_stem(&paired), "test_A_1-2");
        assert_eq!(unit_stem(&paired), "test_A_1");
        assert_eq!(
            record_output("/out", &paired, "t.fq"),
            PathBuf::from("/out/test_A_1-2.t.fq")
        );

        let single = SampleRecord::new("s", "s", 3, Mate::Single, "/data/s.fq");
        assert_eq!(record_stem(&single), "s_s_3");
    }
}
