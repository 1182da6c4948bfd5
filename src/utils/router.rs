use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::config::defs::{DemuxError, UNASSIGNED_NAME};
use crate::utils::fastx::write_fastq_record;
use crate::utils::file::fastq_path;
use crate::utils::matcher::Assignment;
use crate::utils::reference::ReferenceIndex;
use crate::utils::sam::Mate;

enum SampleStreams {
    Single(BufWriter<File>),
    Paired {
        mate1: BufWriter<File>,
        mate2: BufWriter<File>,
    },
}

/// Per-destination read counts reported after a run.
#[derive(Debug)]
pub struct DemuxSummary {
    pub per_sample: Vec<(String, u64)>,
    pub unassigned: u64,
}

impl DemuxSummary {
    pub fn total(&self) -> u64 {
        self.per_sample.iter().map(|(_, n)| n).sum::<u64>() + self.unassigned
    }
}

/// Owns every output stream for the run: one per sample (two when
/// paired) plus a single unassigned stream. All streams are opened up
/// front so every listed sample gets a file even with zero reads.
pub struct OutputRouter {
    streams: Vec<SampleStreams>,
    unassigned: BufWriter<File>,
    assigned_counts: Vec<u64>,
    unassigned_count: u64,
}

impl OutputRouter {
    pub fn create(
        out_dir: &Path,
        index: &ReferenceIndex,
        paired: bool,
    ) -> Result<Self, DemuxError> {
        let unassigned = open_stream(&fastq_path(out_dir, UNASSIGNED_NAME, None))?;
        let mut streams = Vec::with_capacity(index.len());
        for entry in index.samples() {
            let stream = if paired {
                SampleStreams::Paired {
                    mate1: open_stream(&fastq_path(out_dir, &entry.name, Some(1)))?,
                    mate2: open_stream(&fastq_path(out_dir, &entry.name, Some(2)))?,
                }
            } else {
                SampleStreams::Single(open_stream(&fastq_path(out_dir, &entry.name, None))?)
            };
            streams.push(stream);
        }
        Ok(Self {
            assigned_counts: vec![0; streams.len()],
            streams,
            unassigned,
            unassigned_count: 0,
        })
    }

    /// Appends one FASTQ record to exactly one destination stream. The
    /// mate suffix is appended to the emitted read id.
    pub fn route(
        &mut self,
        assignment: &Assignment,
        mate: Mate,
        qname: &str,
        seq: &str,
        qual: &str,
    ) -> Result<(), DemuxError> {
        let id = format!("{}{}", qname, mate.suffix());
        let sample = match assignment {
            Assignment::Assigned { sample, .. } => *sample,
            Assignment::Unassigned => {
                write_fastq_record(&mut self.unassigned, &id, seq.as_bytes(), qual.as_bytes())?;
                self.unassigned_count += 1;
                return Ok(());
            }
        };

        let written = match (&mut self.streams[sample], mate) {
            (SampleStreams::Single(w), _) => {
                write_fastq_record(w, &id, seq.as_bytes(), qual.as_bytes())?;
                true
            }
            (SampleStreams::Paired { mate1, .. }, Mate::First) => {
                write_fastq_record(mate1, &id, seq.as_bytes(), qual.as_bytes())?;
                true
            }
            (SampleStreams::Paired { mate2, .. }, Mate::Second) => {
                write_fastq_record(mate2, &id, seq.as_bytes(), qual.as_bytes())?;
                true
            }
            // No mate bit in a paired run: annotation anomaly.
            (SampleStreams::Paired { .. }, Mate::None) => false,
        };

        if written {
            self.assigned_counts[sample] += 1;
        } else {
            write_fastq_record(&mut self.unassigned, &id, seq.as_bytes(), qual.as_bytes())?;
            self.unassigned_count += 1;
        }
        Ok(())
    }

    /// Flushes every stream and reports the per-destination counts.
    pub fn finalize(mut self, index: &ReferenceIndex) -> Result<DemuxSummary, DemuxError> {
        for stream in &mut self.streams {
            match stream {
                SampleStreams::Single(w) => w.flush()?,
                SampleStreams::Paired { mate1, mate2 } => {
                    mate1.flush()?;
                    mate2.flush()?;
                }
            }
        }
        self.unassigned.flush()?;

        let per_sample = index
            .samples()
            .iter()
            .zip(self.assigned_counts.iter())
            .map(|(entry, count)| (entry.name.clone(), *count))
            .collect();
        Ok(DemuxSummary {
            per_sample,
            unassigned: self.unassigned_count,
        })
    }
}

fn open_stream(path: &Path) -> Result<BufWriter<File>, DemuxError> {
    let file = File::create(path)
        .map_err(|e| DemuxError::IOError(format!("cannot create output file {:?}: {}", path, e)))?;
    Ok(BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::IndexMode;
    use std::fs;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn index() -> ReferenceIndex {
        let table = "sample_1\tAACCGGTT\tTTGGCCAA\nsample_2\tCCAATTGG\tGGTTAACC\n";
        ReferenceIndex::from_reader(Cursor::new(table.to_string()), IndexMode::Both, 0).unwrap()
    }

    #[test]
    fn test_zero_read_samples_still_get_files() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let index = index();
        let router = OutputRouter::create(dir.path(), &index, false)?;
        let summary = router.finalize(&index)?;

        assert_eq!(summary.total(), 0);
        for name in ["sample_1.fastq", "sample_2.fastq", "unassigned.fastq"] {
            let meta = fs::metadata(dir.path().join(name))?;
            assert_eq!(meta.len(), 0, "{} should exist and be empty", name);
        }
        Ok(())
    }

    #[test]
    fn test_route_single_end() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let index = index();
        let mut router = OutputRouter::create(dir.path(), &index, false)?;

        let assigned = Assignment::Assigned { sample: 0, distance: 0 };
        router.route(&assigned, Mate::None, "read1", "ATCG", "IIII")?;
        router.route(&Assignment::Unassigned, Mate::None, "read2", "GGGG", "IIII")?;
        let summary = router.finalize(&index)?;

        assert_eq!(summary.per_sample[0], ("sample_1".to_string(), 1));
        assert_eq!(summary.per_sample[1], ("sample_2".to_string(), 0));
        assert_eq!(summary.unassigned, 1);

        let content = fs::read_to_string(dir.path().join("sample_1.fastq"))?;
        assert_eq!(content, "@read1\nATCG\n+\nIIII\n");
        Ok(())
    }

    #[test]
    fn test_route_paired_mates_to_matching_streams() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let index = index();
        let mut router = OutputRouter::create(dir.path(), &index, true)?;

        let assigned = Assignment::Assigned { sample: 1, distance: 0 };
        router.route(&assigned, Mate::First, "pair1", "ATCG", "IIII")?;
        router.route(&assigned, Mate::Second, "pair1", "CGAT", "IIII")?;
        let summary = router.finalize(&index)?;

        assert_eq!(summary.per_sample[1].1, 2);
        let mate1 = fs::read_to_string(dir.path().join("sample_2.1.fastq"))?;
        let mate2 = fs::read_to_string(dir.path().join("sample_2.2.fastq"))?;
        assert_eq!(mate1, "@pair1/1\nATCG\n+\nIIII\n");
        assert_eq!(mate2, "@pair1/2\nCGAT\n+\nIIII\n");
        // Single unassigned stream even in paired mode.
        assert!(dir.path().join("unassigned.fastq").exists());
        Ok(())
    }

    #[test]
    fn test_mateless_record_in_paired_run_goes_to_unassigned() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let index = index();
        let mut router = OutputRouter::create(dir.path(), &index, true)?;

        let assigned = Assignment::Assigned { sample: 0, distance: 0 };
        router.route(&assigned, Mate::None, "orphan", "ATCG", "IIII")?;
        let summary = router.finalize(&index)?;

        assert_eq!(summary.per_sample[0].1, 0);
        assert_eq!(summary.unassigned, 1);
        Ok(())
    }
}
