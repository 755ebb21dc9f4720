//! The interleave codec. Both directions operate on strict four-line FASTQ
//! records and write through [`AtomicFile`]s, so a destination either holds
//! the complete result or does not exist.

use std::path::Path;
use std::path::PathBuf;

use tracing::debug;
use tracing::info;

use crate::errors::Result;
use crate::utils::atomic::AtomicFile;
use crate::utils::display::RecordCounter;
use crate::utils::formats::fastq;
use crate::utils::formats::fastq::RawRecord;

/// Merges two mate files into one alternating stream.
///
/// Each iteration writes the left record as `@read<N>:1` followed by the right
/// record as `@read<N>:2`, where `N` counts pairs from one. Original headers
/// are discarded. Writing stops as soon as either input runs out; any records
/// left on the longer input are dropped.
pub fn interleave<L, R, O>(left: L, right: R, dest: O) -> Result<PathBuf>
where
    L: AsRef<Path>,
    R: AsRef<Path>,
    O: AsRef<Path>,
{
    let (left, right, dest) = (left.as_ref(), right.as_ref(), dest.as_ref());
    info!(
        "Interleaving {} and {} into {}.",
        left.display(),
        right.display(),
        dest.display()
    );

    let mut left_reader = fastq::open(left)?;
    let mut right_reader = fastq::open(right)?;
    let mut writer = AtomicFile::create(dest)?;
    let mut counter = RecordCounter::default();

    loop {
        let l = RawRecord::read_from(&mut left_reader)?;
        let r = RawRecord::read_from(&mut right_reader)?;

        let (l, r) = match (l, r) {
            (Some(l), Some(r)) => (l, r),
            _ => break,
        };

        counter.inc();
        let n = counter.get();
        l.write_with_header(&mut writer, &format!("@read{}:1", n))?;
        r.write_with_header(&mut writer, &format!("@read{}:2", n))?;
    }

    debug!("  [*] Wrote {} read pairs.", counter.get());
    Ok(writer.commit()?)
}

/// Splits an interleaved stream back into two mate files. Records are copied
/// verbatim, alternating between `left` and `right`. Reading stops at the
/// first point where a full pair of records cannot be read.
pub fn deinterleave<I, L, R>(src: I, left: L, right: R) -> Result<(PathBuf, PathBuf)>
where
    I: AsRef<Path>,
    L: AsRef<Path>,
    R: AsRef<Path>,
{
    let (src, left, right) = (src.as_ref(), left.as_ref(), right.as_ref());
    info!(
        "De-interleaving {} into {} and {}.",
        src.display(),
        left.display(),
        right.display()
    );

    let mut reader = fastq::open(src)?;
    let mut left_writer = AtomicFile::create(left)?;
    let mut right_writer = AtomicFile::create(right)?;
    let mut counter = RecordCounter::default();

    while let (Some(l), Some(r)) = (
        RawRecord::read_from(&mut reader)?,
        RawRecord::read_from(&mut reader)?,
    ) {
        l.write_to(&mut left_writer)?;
        r.write_to(&mut right_writer)?;
        counter.inc();
    }

    debug!("  [*] Wrote {} read pairs.", counter.get());
    Ok((left_writer.commit()?, right_writer.commit()?))
}
