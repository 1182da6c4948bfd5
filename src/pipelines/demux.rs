use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::config::defs::{DemuxError, MAX_MISMATCH_LIMIT, RunConfig};
use crate::utils::matcher::{Assignment, BarcodeMatcher};
use crate::utils::reference::ReferenceIndex;
use crate::utils::router::{DemuxSummary, OutputRouter};
use crate::utils::sam::{Mate, SamReader};

/// Demultiplexes one SAM file into per-sample FASTQ files.
///
/// Per run: Init -> Loading-Reference -> Streaming-Records -> Finalizing.
/// A malformed table or an unrecoverable SAM format error aborts the run;
/// a per-record unassigned outcome is a normal result, not a failure.
///
/// # Arguments
/// * `config` - The run configuration built in main.
///
/// # Returns
/// Per-destination read counts for the run.
pub fn run(config: &RunConfig) -> Result<DemuxSummary, DemuxError> {
    validate(config)?;

    let index = ReferenceIndex::load(
        Path::new(&config.args.table),
        config.args.indices,
        config.args.mismatch,
    )?;
    info!("Loaded {} samples from {}", index.len(), config.args.table);

    fs::create_dir_all(&config.out_dir).map_err(|e| {
        DemuxError::IOError(format!("cannot create output directory {:?}: {}", config.out_dir, e))
    })?;
    let mut router = OutputRouter::create(&config.out_dir, &index, config.args.paired)?;
    let matcher = BarcodeMatcher::new(&index, config.args.mismatch);

    let reader = SamReader::from_path(Path::new(&config.args.sam))?;
    let mut pending: Option<(String, Assignment)> = None;
    let mut records: u64 = 0;
    for record in reader {
        let record = record?;
        records += 1;
        let mate = record.mate();

        // The first mate of a pair is the single source of truth for the
        // pair's assignment; its mate reuses it instead of re-deriving.
        let assignment = if config.args.paired && mate == Mate::Second {
            match pending.take() {
                Some((qname, assignment)) if qname == record.qname => assignment,
                _ => matcher.assign(record.i7.as_deref(), record.i5.as_deref()),
            }
        } else {
            matcher.assign(record.i7.as_deref(), record.i5.as_deref())
        };
        if config.args.paired && mate == Mate::First {
            pending = Some((record.qname.clone(), assignment.clone()));
        }

        // An unpaired record in a paired run has no mate stream to go to.
        let assignment = if config.args.paired && mate == Mate::None {
            Assignment::Unassigned
        } else {
            assignment
        };
        router.route(&assignment, mate, &record.qname, &record.seq, &record.qual)?;
    }
    debug!("Processed {} alignment records", records);

    let summary = router.finalize(&index)?;
    for (name, count) in &summary.per_sample {
        info!("{}: {} reads", name, count);
    }
    info!("unassigned: {} reads", summary.unassigned);
    Ok(summary)
}

fn validate(config: &RunConfig) -> Result<(), DemuxError> {
    if config.args.mismatch > MAX_MISMATCH_LIMIT {
        return Err(DemuxError::InvalidConfig(format!(
            "mismatch must be between 0 and {}, got {}",
            MAX_MISMATCH_LIMIT, config.args.mismatch
        )));
    }
    for path in [&config.args.sam, &config.args.table] {
        if !Path::new(path).is_file() {
            return Err(DemuxError::InvalidConfig(format!("cannot read {}", path)));
        }
    }
    Ok(())
}
