//! Populates a [`SampleStore`] from a manifest or from explicit file lists.

use std::io::BufRead;
use std::path::Path;
use std::path::PathBuf;

use tracing::debug;
use tracing::info;

use super::record::Mate;
use super::record::SampleRecord;
use super::store::SampleStore;
use crate::errors::Error;
use crate::errors::Result;
use crate::utils::pathbuf::absolute;

/// The number of comma-separated columns in a manifest line.
const MANIFEST_COLUMNS: usize = 5;

/// Resolves a read file to an absolute path and checks that it exists.
fn existing_file<P>(path: P) -> Result<PathBuf>
where
    P: AsRef<Path>,
{
    let path = absolute(path)?;

    if !path.is_file() {
        return Err(Error::MissingFile(path));
    }

    Ok(path)
}

/// Parses one manifest line of the form `name,file,replicate,type,mate`.
pub fn parse_manifest_line(line: &str) -> Result<SampleRecord> {
    let columns: Vec<&str> = line.split(',').map(|c| c.trim()).collect();

    if columns.len() != MANIFEST_COLUMNS {
        return Err(Error::MalformedInput(format!(
            "expected {} comma-separated columns (name,file,replicate,type,mate), found {}: {}",
            MANIFEST_COLUMNS,
            columns.len(),
            line
        )));
    }

    let (name, file, replicate, condition, mate) =
        (columns[0], columns[1], columns[2], columns[3], columns[4]);

    if name.is_empty() || condition.is_empty() {
        return Err(Error::MalformedInput(format!(
            "name and type must not be empty: {}",
            line
        )));
    }

    let replicate = match replicate.parse::<u32>() {
        Ok(r) if r > 0 => r,
        _ => {
            return Err(Error::MalformedInput(format!(
                "replicate must be a positive integer, found `{}`",
                replicate
            )))
        }
    };

    let mate = mate.parse::<Mate>()?;
    let file = existing_file(file)?;

    Ok(SampleRecord::new(name, condition, replicate, mate, file))
}

/// Loads every non-blank line of a manifest file.
pub fn load_manifest<P>(path: P) -> Result<SampleStore>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    info!("Loading manifest from {}.", path.display());

    if !path.is_file() {
        return Err(Error::MissingFile(path.to_path_buf()));
    }

    let reader = std::io::BufReader::new(std::fs::File::open(path)?);
    let mut store = SampleStore::new();

    for line in reader.lines() {
        let line = line?;

        if line.trim().is_empty() {
            continue;
        }

        let record = parse_manifest_line(&line)?;
        debug!(
            "  [*] {} (type {}, replicate {}, mate {}): {}",
            record.name,
            record.condition,
            record.replicate,
            record.mate,
            record.current.display()
        );
        store.push(record);
    }

    // Surfaces pairing errors at load time rather than in the first stage.
    store.units()?;

    info!("  [*] Loaded {} read files.", store.len());
    Ok(store)
}

/// Loads paired read files from two parallel lists. The `i`th left file is
/// paired with the `i`th right file as replicate `i + 1`.
pub fn load_reads<L, R>(left: &[L], right: &[R], name: &str) -> Result<SampleStore>
where
    L: AsRef<Path>,
    R: AsRef<Path>,
{
    if left.len() != right.len() {
        return Err(Error::MalformedInput(format!(
            "{} left read files but {} right read files",
            left.len(),
            right.len()
        )));
    }

    let mut store = SampleStore::new();

    for (i, (l, r)) in left.iter().zip(right.iter()).enumerate() {
        let replicate = (i + 1) as u32;
        store.push(SampleRecord::new(
            name,
            name,
            replicate,
            Mate::One,
            existing_file(l)?,
        ));
        store.push(SampleRecord::new(
            name,
            name,
            replicate,
            Mate::Two,
            existing_file(r)?,
        ));
    }

    info!("Loaded {} read pairs for {}.", left.len(), name);
    Ok(store)
}

/// Loads single-end read files, one record per file.
pub fn load_single<P>(files: &[P], name: &str) -> Result<SampleStore>
where
    P: AsRef<Path>,
{
    let mut store = SampleStore::new();

    for (i, file) in files.iter().enumerate() {
        store.push(SampleRecord::new(
            name,
            name,
            (i + 1) as u32,
            Mate::Single,
            existing_file(file)?,
        ));
    }

    info!("Loaded {} single-end read files for {}.", files.len(), name);
    Ok(store)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, "@r1\nACGT\n+\nIIII\n").unwrap();
        path
    }

    #[test]
    fn test_load_manifest() {
        let dir = TempDir::new().unwrap();
        let a1 = touch(&dir, "A_1.fq");
        let a2 = touch(&dir, "A_2.fq");
        let manifest = dir.path().join("manifest.csv");
        fs::write(
            &manifest,
            format!(
                "test,{},1,A,1\n\ntest,{},1,A,2\n",
                a1.display(),
                a2.display()
            ),
        )
        .unwrap();

        let store = load_manifest(&manifest).unwrap();
        assert_eq!(store.len(), 2);

        let first = store.get(0).unwrap();
        assert_eq!(first.name, "test");
        assert_eq!(first.condition, "A");
        assert_eq!(first.replicate, 1);
        assert_eq!(first.mate, Mate::One);
        assert_eq!(first.current, a1);
        assert_eq!(first.original_file, a1);
        assert_eq!(store.get(1).unwrap().mate, Mate::Two);
    }

    #[test]
    fn test_manifest_errors() {
        let dir = TempDir::new().unwrap();
        let a1 = touch(&dir, "A_1.fq");

        let line = format!("test,{},1,A", a1.display());
        assert!(matches!(
            parse_manifest_line(&line),
            Err(Error::MalformedInput(_))
        ));

        let line = format!("test,{},one,A,1", a1.display());
        assert!(matches!(
            parse_manifest_line(&line),
            Err(Error::MalformedInput(_))
        ));

        let line = format!("test,{},1,A,3", a1.display());
        assert!(matches!(
            parse_manifest_line(&line),
            Err(Error::InvalidMate(_))
        ));

        let missing = dir.path().join("missing.fq");
        let line = format!("test,{},1,A,1", missing.display());
        assert!(matches!(
            parse_manifest_line(&line),
            Err(Error::MissingFile(p)) if p == missing
        ));

        assert!(matches!(
            load_manifest(dir.path().join("nope.csv")),
            Err(Error::MissingFile(_))
        ));
    }

    #[test]
    fn test_load_reads_pairs_by_position() {
        let dir = TempDir::new().unwrap();
        let left = vec![touch(&dir, "a_1.fq"), touch(&dir, "b_1.fq")];
        let right = vec![touch(&dir, "a_2.fq"), touch(&dir, "b_2.fq")];

        let store = load_reads(&left, &right, "sample").unwrap();
        assert_eq!(store.len(), 4);
        assert_eq!(store.get(2).unwrap().replicate, 2);
        assert_eq!(store.get(2).unwrap().condition, "sample");
        assert_eq!(store.units().unwrap().len(), 2);

        assert!(matches!(
            load_reads(&left, &right[..1], "sample"),
            Err(Error::MalformedInput(_))
        ));
    }

    #[test]
    fn test_load_single() {
        let dir = TempDir::new().unwrap();
        let files = vec![touch(&dir, "a.fq"), touch(&dir, "b.fq")];

        let store = load_single(&files, "sample").unwrap();
        assert!(store.records().iter().all(|r| r.mate == Mate::Single));
        assert!(!store.is_paired());
        assert_eq!(store.units().unwrap().len(), 2);
    }
}
