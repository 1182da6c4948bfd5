use std::collections::HashSet;
use std::fmt;
use std::io;
use std::path::PathBuf;
use lazy_static::lazy_static;

use crate::cli::Arguments;

// Barcode conventions (Illumina index reads)
pub const BARCODE_MAX_LEN: usize = 8;
pub const I7_TAG_PREFIX: &str = "BC:Z:";
pub const I5_TAG_PREFIX: &str = "B2:Z:";

// Matching limits
pub const MAX_MISMATCH_LIMIT: u8 = 3;

// Output conventions
pub const UNASSIGNED_NAME: &str = "unassigned";
pub const FASTQ_EXT: &str = "fastq";

// SAM layout
pub const SAM_MANDATORY_FIELDS: usize = 11;
pub const FLAG_FIRST_IN_PAIR: u16 = 0x40;
pub const FLAG_SECOND_IN_PAIR: u16 = 0x80;

lazy_static! {
    /// Bases accepted in reference table barcodes.
    pub static ref VALID_BASES: HashSet<u8> = {
        let mut s = HashSet::new();
        for b in [b'A', b'C', b'G', b'T', b'N'] {
            s.insert(b);
        }
        s
    };
}

pub struct RunConfig {
    pub cwd: PathBuf,
    pub out_dir: PathBuf,
    pub args: Arguments,
}

#[derive(Debug)]
pub enum DemuxError {
    InvalidConfig(String),
    MalformedTable { line: usize, reason: String },
    InvalidSamFormat(String),
    IOError(String),
}

impl fmt::Display for DemuxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemuxError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            DemuxError::MalformedTable { line, reason } => {
                write!(f, "Malformed reference table at line {}: {}", line, reason)
            }
            DemuxError::InvalidSamFormat(msg) => write!(f, "Invalid SAM format: {}", msg),
            DemuxError::IOError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl std::error::Error for DemuxError {}

impl From<io::Error> for DemuxError {
    fn from(e: io::Error) -> Self {
        DemuxError::IOError(e.to_string())
    }
}
