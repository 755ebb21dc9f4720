//! Reading and writing the provenance log.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;

use crate::errors::Error;
use crate::errors::Result;
use crate::samples::SampleStore;
use crate::utils::atomic;

/// File name of the log inside a run's output directory.
pub const LOG_FILE_NAME: &str = "log";

/// A provenance log at a fixed location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProvenanceLog {
    path: PathBuf,
}

impl ProvenanceLog {
    /// A log at an explicit path.
    pub fn new<P>(path: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self { path: path.into() }
    }

    /// The log of the run writing to `dir`.
    pub fn in_directory<P>(dir: P) -> Self
    where
        P: AsRef<Path>,
    {
        Self::new(dir.as_ref().join(LOG_FILE_NAME))
    }

    /// Where the log lives.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrites the log with the current state of every record, as a
    /// pretty-printed JSON array.
    pub fn snapshot(&self, store: &SampleStore) -> Result<()> {
        let mut contents = serde_json::to_string_pretty(store)?;
        contents.push('\n');
        atomic::write(&self.path, contents)?;

        debug!(
            "  [*] Logged {} records to {}.",
            store.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Loads the records from the log.
    pub fn read(&self) -> Result<SampleStore> {
        read(&self.path)
    }
}

/// Loads the records from a provenance log.
pub fn read<P>(path: P) -> Result<SampleStore>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if !path.is_file() {
        return Err(Error::MissingFile(path.to_path_buf()));
    }

    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::samples::Mate;
    use crate::samples::SampleRecord;
    use crate::samples::StageKind;

    #[test]
    fn test_snapshot_overwrites_and_reads_back() {
        let dir = TempDir::new().unwrap();
        let log = ProvenanceLog::in_directory(dir.path());
        assert_eq!(log.path(), dir.path().join("log"));

        let mut store = SampleStore::new();
        store.push(SampleRecord::new("test", "A", 1, Mate::One, "/data/A_1.fq"));
        log.snapshot(&store).unwrap();

        let record = store.get_mut(0).unwrap();
        record.advance(PathBuf::from("/out/test_A_1-1.t.fq"));
        record.mark_processed(StageKind::Trim, "trimmomatic");
        log.snapshot(&store).unwrap();

        let contents = fs::read_to_string(log.path()).unwrap();
        assert!(contents.starts_with("[\n"));
        assert!(contents.contains("\"trim\": \"trimmomatic\""));
        assert_eq!(log.read().unwrap(), store);
    }

    #[test]
    fn test_read_missing_log() {
        assert!(matches!(
            read("/definitely/not/a/log"),
            Err(Error::MissingFile(_))
        ));
    }
}
