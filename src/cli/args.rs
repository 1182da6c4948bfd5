use clap::{Parser, ValueEnum};

/// Which index read(s) to demultiplex on.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq)]
pub enum IndexMode {
    I5,
    I7,
    #[default]
    Both,
}

impl IndexMode {
    pub fn uses_i5(&self) -> bool {
        matches!(self, IndexMode::I5 | IndexMode::Both)
    }

    pub fn uses_i7(&self) -> bool {
        matches!(self, IndexMode::I7 | IndexMode::Both)
    }
}

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "samdemux", version = "0.1.0")]
pub struct Arguments {

    #[arg(short = 'S', long = "sam", help = "Filepath to multiplexed SAM file")]
    pub sam: String,

    #[arg(short = 'T', long = "table", help = "Reference table of index sequences (TSV: name, i7, i5)")]
    pub table: String,

    #[arg(short = 'I', long = "indices", default_value = "both", value_enum, help = "Which index feature(s) to demultiplex on")]
    pub indices: IndexMode,

    #[arg(short = 'M', long = "mismatch", default_value_t = 0, help = "Number of mismatches to allow in an index sequence (0-3)")]
    pub mismatch: u8,

    #[arg(short = 'O', long = "output", default_value = ".", help = "Output directory for per-sample FASTQ files")]
    pub output: String,

    #[arg(long, action, help = "Is the run paired-end?")]
    pub paired: bool,

    #[arg(short = 'v', long = "verbose", action)]
    pub verbose: bool,
}
