use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use fxhash::{FxHashMap, FxHashSet};
use log::warn;

use crate::cli::IndexMode;
use crate::config::defs::{BARCODE_MAX_LEN, DemuxError, VALID_BASES};
use crate::utils::matcher::hamming_within;

/// One row of the reference table, immutable after load.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleEntry {
    pub name: String,
    pub i7: Option<String>,
    pub i5: Option<String>,
}

/// The loaded sample/barcode table, queryable by exact key or by
/// bounded-mismatch scan over the entries.
#[derive(Debug)]
pub struct ReferenceIndex {
    samples: Vec<SampleEntry>,
    mode: IndexMode,
    exact: FxHashMap<String, usize>,
}

/// Clips a barcode to the Illumina index read length.
pub fn clip_barcode(raw: &str) -> String {
    raw.chars().take(BARCODE_MAX_LEN).collect()
}

/// Composes the exact-lookup key for the active index mode.
/// Returns None if a field required by the mode is absent or empty.
pub fn compose_key(mode: IndexMode, i7: Option<&str>, i5: Option<&str>) -> Option<String> {
    let i7 = i7.filter(|s| !s.is_empty());
    let i5 = i5.filter(|s| !s.is_empty());
    match mode {
        IndexMode::I7 => i7.map(str::to_string),
        IndexMode::I5 => i5.map(str::to_string),
        IndexMode::Both => match (i5, i7) {
            (Some(i5), Some(i7)) => Some(format!("{}_{}", i5, i7)),
            _ => None,
        },
    }
}

impl ReferenceIndex {
    /// Loads the reference table from a tab-separated, header-free file.
    ///
    /// # Arguments
    /// * `path` - Path to the table (columns: sample name, i7, i5).
    /// * `mode` - Which index field(s) the run demultiplexes on.
    /// * `max_mismatch` - Tolerance used for the ambiguity warning pass.
    ///
    /// # Returns
    /// The queryable index, or a `DemuxError` naming the offending row.
    pub fn load(path: &Path, mode: IndexMode, max_mismatch: u8) -> Result<Self, DemuxError> {
        let file = File::open(path)
            .map_err(|e| DemuxError::IOError(format!("cannot open reference table {:?}: {}", path, e)))?;
        Self::from_reader(BufReader::new(file), mode, max_mismatch)
    }

    /// Builds the index from any buffered reader over table rows.
    /// Blank lines and lines starting with '#' are skipped.
    pub fn from_reader<R: BufRead>(
        reader: R,
        mode: IndexMode,
        max_mismatch: u8,
    ) -> Result<Self, DemuxError> {
        let mut samples: Vec<SampleEntry> = Vec::new();
        let mut exact: FxHashMap<String, usize> = FxHashMap::default();
        let mut names: FxHashSet<String> = FxHashSet::default();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = line_no + 1;
            let trimmed = line.trim_end();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let cols: Vec<&str> = trimmed.split('\t').collect();
            if cols.len() != 3 {
                return Err(DemuxError::MalformedTable {
                    line: line_no,
                    reason: format!("expected 3 tab-separated columns, found {}", cols.len()),
                });
            }

            let name = cols[0].trim();
            if name.is_empty() {
                return Err(DemuxError::MalformedTable {
                    line: line_no,
                    reason: "empty sample name".to_string(),
                });
            }
            if !names.insert(name.to_string()) {
                return Err(DemuxError::MalformedTable {
                    line: line_no,
                    reason: format!("duplicate sample name '{}'", name),
                });
            }

            let i7 = clip_barcode(cols[1].trim());
            let i5 = clip_barcode(cols[2].trim());
            if mode.uses_i7() {
                if i7.is_empty() {
                    return Err(DemuxError::MalformedTable {
                        line: line_no,
                        reason: format!("sample '{}' is missing the i7 barcode required by the active index mode", name),
                    });
                }
                validate_bases(&i7, line_no)?;
            }
            if mode.uses_i5() {
                if i5.is_empty() {
                    return Err(DemuxError::MalformedTable {
                        line: line_no,
                        reason: format!("sample '{}' is missing the i5 barcode required by the active index mode", name),
                    });
                }
                validate_bases(&i5, line_no)?;
            }

            let entry = SampleEntry {
                name: name.to_string(),
                i7: (!i7.is_empty()).then_some(i7),
                i5: (!i5.is_empty()).then_some(i5),
            };
            if let Some(key) = compose_key(mode, entry.i7.as_deref(), entry.i5.as_deref()) {
                if let Some(prev) = exact.insert(key.clone(), samples.len()) {
                    return Err(DemuxError::MalformedTable {
                        line: line_no,
                        reason: format!(
                            "barcode key '{}' of sample '{}' duplicates sample '{}'",
                            key, name, samples[prev].name
                        ),
                    });
                }
            }
            samples.push(entry);
        }

        if samples.is_empty() {
            return Err(DemuxError::InvalidConfig(
                "reference table contains no sample rows".to_string(),
            ));
        }

        let index = ReferenceIndex { samples, mode, exact };
        index.warn_ambiguous(max_mismatch);
        Ok(index)
    }

    pub fn samples(&self) -> &[SampleEntry] {
        &self.samples
    }

    pub fn sample(&self, idx: usize) -> &SampleEntry {
        &self.samples[idx]
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn mode(&self) -> IndexMode {
        self.mode
    }

    pub fn exact_lookup(&self, key: &str) -> Option<usize> {
        self.exact.get(key).copied()
    }

    /// Pairwise check for samples whose barcodes sit within the mismatch
    /// tolerance of each other. Reads in the contested neighborhood are
    /// rejected by the matcher's unique-candidate rule, so this surfaces
    /// as a warning rather than a load failure.
    fn warn_ambiguous(&self, max_mismatch: u8) {
        if max_mismatch == 0 {
            return;
        }
        for i in 0..self.samples.len() {
            for j in (i + 1)..self.samples.len() {
                if self.entries_within(&self.samples[i], &self.samples[j], max_mismatch) {
                    warn!(
                        "Samples '{}' and '{}' have barcodes within {} mismatches of each other; reads between them will be unassigned",
                        self.samples[i].name, self.samples[j].name, max_mismatch
                    );
                }
            }
        }
    }

    fn entries_within(&self, a: &SampleEntry, b: &SampleEntry, max: u8) -> bool {
        let field_within = |x: &Option<String>, y: &Option<String>| match (x, y) {
            (Some(x), Some(y)) => hamming_within(x.as_bytes(), y.as_bytes(), max).is_some(),
            _ => false,
        };
        let i7_ok = !self.mode.uses_i7() || field_within(&a.i7, &b.i7);
        let i5_ok = !self.mode.uses_i5() || field_within(&a.i5, &b.i5);
        i7_ok && i5_ok
    }
}

fn validate_bases(barcode: &str, line: usize) -> Result<(), DemuxError> {
    for b in barcode.bytes() {
        if !VALID_BASES.contains(&b) {
            return Err(DemuxError::MalformedTable {
                line,
                reason: format!("invalid base '{}' in barcode '{}'", b as char, barcode),
            });
        }
    }
    Ok(())
}
