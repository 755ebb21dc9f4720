//! Utilities related to bioinformatics file formats.

pub mod fastq;

use std::fmt;
use std::path::Path;

/// File formats that `readprep` reads itself.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BioinformaticsFileFormat {
    /// Uncompressed FASTQ.
    FASTQ,

    /// Gzipped FASTQ.
    FASTQ_GZ,
}

impl BioinformaticsFileFormat {
    /// Attempts to detect the format of a file from its extension.
    pub fn try_detect<P>(path: P) -> Option<Self>
    where
        P: AsRef<Path>,
    {
        let name = path.as_ref().file_name()?.to_str()?.to_ascii_lowercase();

        if name.ends_with(".fastq.gz") || name.ends_with(".fq.gz") {
            Some(Self::FASTQ_GZ)
        } else if name.ends_with(".fastq") || name.ends_with(".fq") {
            Some(Self::FASTQ)
        } else {
            None
        }
    }
}

impl fmt::Display for BioinformaticsFileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FASTQ => write!(f, "FASTQ"),
            Self::FASTQ_GZ => write!(f, "gzipped FASTQ"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_formats() {
        use BioinformaticsFileFormat::*;

        assert_eq!(BioinformaticsFileFormat::try_detect("a.fq"), Some(FASTQ));
        assert_eq!(BioinformaticsFileFormat::try_detect("a.fastq"), Some(FASTQ));
        assert_eq!(BioinformaticsFileFormat::try_detect("a.FQ.GZ"), Some(FASTQ_GZ));
        assert_eq!(
            BioinformaticsFileFormat::try_detect("/x/a.t.fastq.gz"),
            Some(FASTQ_GZ)
        );
        assert_eq!(BioinformaticsFileFormat::try_detect("a.sam"), None);
    }
}
