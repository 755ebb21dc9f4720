//! Extensions to and utilities concerning [`PathBuf`]s.
//!
//! # Overview
//!
//! Most of the files a preprocessing run produces are named after some other
//! file: a partially written output is `<output>.partial`, a bowtie2 index is
//! `<index>.1.bt2`, and so on. This module provides a few helpers so that
//! these names are constructed the same way everywhere.
//!
//! ```
//! use std::path::PathBuf;
//! // Trait must be in scope to use it.
//! use readprep::utils::pathbuf::AppendExtension;
//!
//! assert_eq!(
//!     PathBuf::from("reads.fq").append_extension("partial"),
//!     PathBuf::from("reads.fq.partial"))
//! ```

use std::ffi::OsStr;
use std::io;
use std::path::Path;
use std::path::PathBuf;

/// A trait that is intended to add a
/// [`append_extension`][AppendExtension::append_extension] method to
/// [`PathBuf`].
pub trait AppendExtension {
    /// Appends an extension after any extension that is already present.
    ///
    /// ```
    /// use std::path::PathBuf;
    /// use readprep::utils::pathbuf::AppendExtension;
    ///
    /// let index = PathBuf::from("/out/contaminants");
    /// assert_eq!(index.append_extension("bwt"), PathBuf::from("/out/contaminants.bwt"));
    /// ```
    fn append_extension<P>(self, ext: P) -> Self
    where
        P: AsRef<OsStr>;
}

impl AppendExtension for PathBuf {
    fn append_extension<P>(mut self, ext: P) -> Self
    where
        P: AsRef<OsStr>,
    {
        let new_ext = match self.extension() {
            Some(existing) => {
                let mut new_ext = existing.to_os_string();
                new_ext.push(".");
                new_ext.push(ext);
                new_ext
            }
            None => ext.as_ref().to_os_string(),
        };

        self.set_extension(new_ext);
        self
    }
}

/// Resolves a path against the current working directory without touching
/// the filesystem (symlinks are left as they are).
pub fn absolute<P>(path: P) -> io::Result<PathBuf>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

/// The final component of a path with its last extension removed, as a
/// (lossily converted) [`String`].
///
/// ```
/// use readprep::utils::pathbuf::stem_of;
///
/// assert_eq!(stem_of("/out/test_A_1-1.t.fq"), "test_A_1-1.t");
/// assert_eq!(stem_of("reads"), "reads");
/// ```
pub fn stem_of<P>(path: P) -> String
where
    P: AsRef<Path>,
{
    path.as_ref()
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// The final component of a path as a (lossily converted) [`String`].
pub fn basename_of<P>(path: P) -> String
where
    P: AsRef<Path>,
{
    path.as_ref()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
