//! Write-then-rename output files.
//!
//! Every file `readprep` writes itself is written to a `<path>.partial`
//! sibling first and renamed into place only once it is complete, so an
//! aborted run never leaves behind a truncated file that a later run would
//! mistake for a finished output.

use std::fs;
use std::fs::File;
use std::io;
use std::io::BufWriter;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use crate::utils::pathbuf::AppendExtension;

/// A buffered writer whose contents only appear at the destination path
/// after [`commit`][AtomicFile::commit] is called. Dropping an uncommitted
/// `AtomicFile` removes the partial file.
pub struct AtomicFile {
    inner: Option<BufWriter<File>>,
    partial: PathBuf,
    destination: PathBuf,
}

impl AtomicFile {
    /// Creates the partial file for the given destination.
    pub fn create<P>(destination: P) -> io::Result<Self>
    where
        P: AsRef<Path>,
    {
        let destination = destination.as_ref().to_path_buf();
        let partial = partial_path(&destination);
        let file = File::create(&partial)?;

        Ok(Self {
            inner: Some(BufWriter::new(file)),
            partial,
            destination,
        })
    }

    /// The path that will exist once the file is committed.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Flushes the buffered contents and renames the partial file into place.
    ///
    /// If any part of this fails the partial file is removed on drop.
    pub fn commit(mut self) -> io::Result<PathBuf> {
        if let Some(writer) = self.inner.as_mut() {
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }

        fs::rename(&self.partial, &self.destination)?;
        self.inner = None;
        Ok(self.destination.clone())
    }
}

impl Write for AtomicFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.inner.as_mut() {
            Some(writer) => writer.write(buf),
            None => Err(io::Error::new(
                io::ErrorKind::Other,
                "write to a committed file",
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.inner.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for AtomicFile {
    fn drop(&mut self) {
        if self.inner.take().is_some() {
            let _ = fs::remove_file(&self.partial);
        }
    }
}

/// The path a file is written to before it is renamed into place.
pub fn partial_path<P>(destination: P) -> PathBuf
where
    P: AsRef<Path>,
{
    destination.as_ref().to_path_buf().append_extension("partial")
}

/// Writes the full contents to the destination with write-then-rename.
pub fn write<P, C>(destination: P, contents: C) -> io::Result<()>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    let mut file = AtomicFile::create(destination)?;
    file.write_all(contents.as_ref())?;
    file.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_commit_moves_contents_into_place() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("reads.fq");

        let mut file = AtomicFile::create(&destination).unwrap();
        file.write_all(b"@r1\nACGT\n+\nIIII\n").unwrap();
        assert!(!destination.exists());
        assert!(partial_path(&destination).exists());

        file.commit().unwrap();
        assert!(destination.exists());
        assert!(!partial_path(&destination).exists());
        assert_eq!(
            fs::read_to_string(&destination).unwrap(),
            "@r1\nACGT\n+\nIIII\n"
        );
    }

    #[test]
    fn test_dropping_uncommitted_file_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let destination = dir.path().join("reads.fq");

        {
            let mut file = AtomicFile::create(&destination).unwrap();
            file.write_all(b"@r1\n").unwrap();
        }

        assert!(!destination.exists());
        assert!(!partial_path(&destination).exists());
    }

    #[test]
    fn test_failed_commit_removes_partial_file() {
        let dir = TempDir::new().unwrap();
        // Renaming a file onto a non-empty directory fails.
        let destination = dir.path().join("reads.fq");
        fs::create_dir(&destination).unwrap();
        fs::write(destination.join("occupied"), "").unwrap();

        let mut file = AtomicFile::create(&destination).unwrap();
        file.write_all(b"@r1\n").unwrap();
        assert!(file.commit().is_err());

        assert!(!partial_path(&destination).exists());
        assert!(destination.is_dir());
    }
}
