use std::path::{Path, PathBuf};

use crate::config::defs::FASTQ_EXT;

/// Builds the output FASTQ path for a destination name.
/// Paired-end streams carry a mate number: `<name>.1.fastq` / `<name>.2.fastq`.
pub fn fastq_path(out_dir: &Path, name: &str, mate: Option<u8>) -> PathBuf {
    match mate {
        Some(n) => out_dir.join(format!("{}.{}.{}", name, n, FASTQ_EXT)),
        None => out_dir.join(format!("{}.{}", name, FASTQ_EXT)),
    }
}
