use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use crate::config::defs::{
    DemuxError, FLAG_FIRST_IN_PAIR, FLAG_SECOND_IN_PAIR, I5_TAG_PREFIX, I7_TAG_PREFIX,
    SAM_MANDATORY_FIELDS,
};
use crate::utils::reference::clip_barcode;

/// Which mate of a pair an alignment record represents, from FLAG bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mate {
    None,
    First,
    Second,
}

impl Mate {
    pub fn from_flag(flag: u16) -> Mate {
        if flag & FLAG_FIRST_IN_PAIR != 0 {
            Mate::First
        } else if flag & FLAG_SECOND_IN_PAIR != 0 {
            Mate::Second
        } else {
            Mate::None
        }
    }

    /// Suffix appended to the emitted read id.
    pub fn suffix(&self) -> &'static str {
        match self {
            Mate::None => "",
            Mate::First => "/1",
            Mate::Second => "/2",
        }
    }
}

/// One SAM alignment line, reduced to the fields demultiplexing needs.
/// Missing barcode tags are represented as None, never as an error.
#[derive(Debug, Clone)]
pub struct ReadRecord {
    pub qname: String,
    pub flag: u16,
    pub seq: String,
    pub qual: String,
    pub i7: Option<String>,
    pub i5: Option<String>,
}

impl ReadRecord {
    pub fn mate(&self) -> Mate {
        Mate::from_flag(self.flag)
    }
}

/// Line-oriented SAM reader. Header lines ('@') and blank lines are
/// skipped; each remaining line must be a well-formed alignment.
pub struct SamReader<R: BufRead> {
    lines: Lines<R>,
    line_no: usize,
}

impl SamReader<BufReader<File>> {
    pub fn from_path(path: &Path) -> Result<Self, DemuxError> {
        let file = File::open(path)
            .map_err(|e| DemuxError::IOError(format!("cannot open SAM file {:?}: {}", path, e)))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> SamReader<R> {
    pub fn new(reader: R) -> Self {
        Self { lines: reader.lines(), line_no: 0 }
    }
}

impl<R: BufRead> Iterator for SamReader<R> {
    type Item = Result<ReadRecord, DemuxError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => return Some(Err(e.into())),
            };
            self.line_no += 1;
            let trimmed = line.trim_end();
            if trimmed.is_empty() || trimmed.starts_with('@') {
                continue;
            }
            return Some(parse_alignment(trimmed, self.line_no));
        }
    }
}

fn parse_alignment(line: &str, line_no: usize) -> Result<ReadRecord, DemuxError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < SAM_MANDATORY_FIELDS {
        return Err(DemuxError::InvalidSamFormat(format!(
            "alignment at line {} has {} fields, expected at least {}",
            line_no,
            fields.len(),
            SAM_MANDATORY_FIELDS
        )));
    }
    let flag: u16 = fields[1].parse().map_err(|_| {
        DemuxError::InvalidSamFormat(format!(
            "unparseable FLAG '{}' at line {}",
            fields[1], line_no
        ))
    })?;

    let mut i7 = None;
    let mut i5 = None;
    for field in &fields[SAM_MANDATORY_FIELDS..] {
        if let Some(value) = field.strip_prefix(I7_TAG_PREFIX) {
            i7 = Some(clip_barcode(value));
        } else if let Some(value) = field.strip_prefix(I5_TAG_PREFIX) {
            i5 = Some(clip_barcode(value));
        }
    }

    Ok(ReadRecord {
        qname: fields[0].to_string(),
        flag,
        seq: fields[9].to_string(),
        qual: fields[10].to_string(),
        i7,
        i5,
    })
}
