//! Utilities related to opening and reading FASTQ files.

use std::fs::File;
use std::io;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;

use flate2::read::MultiGzDecoder;
use noodles::fastq;

use super::BioinformaticsFileFormat;
use crate::errors::Error;
use crate::errors::Result;

/// Opens a file for line-oriented reading, transparently decompressing it if
/// it is gzipped. A missing file is reported as [`Error::MissingFile`].
pub fn open<P>(src: P) -> Result<Box<dyn BufRead>>
where
    P: AsRef<Path>,
{
    let path = src.as_ref();

    if !path.is_file() {
        return Err(Error::MissingFile(path.to_path_buf()));
    }

    let file = File::open(path)?;

    match BioinformaticsFileFormat::try_detect(path) {
        Some(BioinformaticsFileFormat::FASTQ_GZ) => {
            Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
        }
        _ => Ok(Box::new(BufReader::new(file))),
    }
}

/// Attempts to open a FASTQ reader from a given source.
pub fn reader<P>(src: P) -> Result<fastq::Reader<Box<dyn BufRead>>>
where
    P: AsRef<Path>,
{
    open(src).map(fastq::Reader::new)
}

/// One FASTQ record exactly as it appeared on disk: header, sequence,
/// separator and quality lines, each including its line terminator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawRecord {
    /// The header line (`@...`).
    pub header: String,

    /// The sequence line.
    pub sequence: String,

    /// The separator line (`+...`).
    pub separator: String,

    /// The quality line.
    pub quality: String,
}

impl RawRecord {
    /// Reads the next four lines. Returns `Ok(None)` if fewer than four lines
    /// remain; whatever partial content there was is consumed and dropped.
    pub fn read_from<R>(reader: &mut R) -> io::Result<Option<Self>>
    where
        R: BufRead + ?Sized,
    {
        let mut record = RawRecord::default();

        for line in [
            &mut record.header,
            &mut record.sequence,
            &mut record.separator,
            &mut record.quality,
        ] {
            if reader.read_line(line)? == 0 {
                return Ok(None);
            }

            if !line.ends_with('\n') {
                line.push('\n');
            }
        }

        Ok(Some(record))
    }

    /// Writes the record verbatim.
    pub fn write_to<W>(&self, writer: &mut W) -> io::Result<()>
    where
        W: io::Write,
    {
        self.write_with_header(writer, &self.header)
    }

    /// Writes the record with its header line replaced.
    pub fn write_with_header<W>(&self, writer: &mut W, header: &str) -> io::Result<()>
    where
        W: io::Write,
    {
        writer.write_all(header.as_bytes())?;
        if !header.ends_with('\n') {
            writer.write_all(b"\n")?;
        }
        writer.write_all(self.sequence.as_bytes())?;
        writer.write_all(self.separator.as_bytes())?;
        writer.write_all(self.quality.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_raw_records_and_drop_partial_tail() {
        let mut reader = Cursor::new("@r1 extra\nACGT\n+r1\nIIII\n@r2\nTT\n");

        let first = RawRecord::read_from(&mut reader).unwrap().unwrap();
        assert_eq!(first.header, "@r1 extra\n");
        assert_eq!(first.sequence, "ACGT\n");
        assert_eq!(first.separator, "+r1\n");
        assert_eq!(first.quality, "IIII\n");

        assert!(RawRecord::read_from(&mut reader).unwrap().is_none());
    }

    #[test]
    fn test_missing_final_newline_is_normalized() {
        let mut reader = Cursor::new("@r1\nACGT\n+\nIIII");
        let record = RawRecord::read_from(&mut reader).unwrap().unwrap();
        assert_eq!(record.quality, "IIII\n");

        let mut out = Vec::new();
        record.write_with_header(&mut out, "@read1:1").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "@read1:1\nACGT\n+\nIIII\n");
    }

    #[test]
    fn test_open_missing_file() {
        let result = open("/definitely/not/here.fq");
        assert!(matches!(result, Err(Error::MissingFile(_))));
    }
}
