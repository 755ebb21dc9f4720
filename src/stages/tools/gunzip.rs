//! Decompression of gzipped read files.

use super::Tool;
use crate::errors::Result;
use crate::samples::RecordUpdate;
use crate::samples::SampleStore;
use crate::samples::StageKind;
use crate::stages::orchestrator::RunContext;
use crate::stages::step::Step;
use crate::stages::step::Task;
use crate::utils::pathbuf::stem_of;

/// Decompresses every record whose current file is gzipped into
/// `<output_dir>/<file name without .gz>`. Other records are left alone.
#[derive(Debug, Default)]
pub struct Gunzip;

impl Tool for Gunzip {
    fn kind(&self) -> StageKind {
        StageKind::Unzip
    }

    fn name(&self) -> &'static str {
        "gunzip"
    }

    fn programs(&self) -> Vec<&'static str> {
        Vec::new()
    }

    fn steps(&self, store: &SampleStore, context: &RunContext) -> Result<Vec<Step>> {
        let mut steps = Vec::new();

        for (i, record) in store.records().iter().enumerate() {
            let gzipped = record
                .current
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("gz"))
                .unwrap_or(false);

            if !gzipped {
                continue;
            }

            let dest = context.output(stem_of(&record.current));
            steps.push(
                Step::new(format!("decompress {}", record.current.display()))
                    .output(&dest)
                    .task(Task::Decompress {
                        src: record.current.clone(),
                        dest: dest.clone(),
                    })
                    .update(i, RecordUpdate::current(dest)),
            );
        }

        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::samples::Mate;
    use crate::samples::SampleRecord;
    use crate::utils::formats::BioinformaticsFileFormat;

    #[test]
    fn test_only_gzipped_records_get_steps() {
        let store: SampleStore = vec![
            SampleRecord::new("s", "s", 1, Mate::One, "/data/s_1.fq.gz"),
            SampleRecord::new("s", "s", 1, Mate::Two, "/data/s_2.fq"),
        ]
        .into_iter()
        .collect();

        let steps = Gunzip.steps(&store, &RunContext::new("/out")).unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].outputs, vec![PathBuf::from("/out/s_1.fq")]);
        assert_eq!(steps[0].records, vec![0]);
        assert_eq!(
            BioinformaticsFileFormat::try_detect(&steps[0].outputs[0]),
            Some(BioinformaticsFileFormat::FASTQ)
        );
    }
}
