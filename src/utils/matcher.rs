use crate::utils::reference::{ReferenceIndex, SampleEntry, compose_key};

/// Outcome of matching one read's barcode(s) against the reference index.
#[derive(Debug, Clone, PartialEq)]
pub enum Assignment {
    Assigned { sample: usize, distance: u8 },
    Unassigned,
}

impl Assignment {
    pub fn is_assigned(&self) -> bool {
        matches!(self, Assignment::Assigned { .. })
    }
}

/// Hamming distance of `a` and `b` if it is at most `max`.
/// Unequal lengths never match and never error.
pub fn hamming_within(a: &[u8], b: &[u8], max: u8) -> Option<u8> {
    if a.len() != b.len() {
        return None;
    }
    let mut d: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        if x != y {
            d += 1;
            if d > max {
                return None;
            }
        }
    }
    Some(d)
}

/// Matches observed barcodes against the reference index. Pure: the same
/// inputs always yield the same Assignment.
pub struct BarcodeMatcher<'a> {
    index: &'a ReferenceIndex,
    max_mismatch: u8,
}

impl<'a> BarcodeMatcher<'a> {
    pub fn new(index: &'a ReferenceIndex, max_mismatch: u8) -> Self {
        Self { index, max_mismatch }
    }

    /// Assigns a read by its observed i7/i5 barcodes under the index's mode.
    ///
    /// At tolerance zero this is a single exact-key lookup. Otherwise every
    /// sample is scanned and the read is assigned only when exactly one
    /// sample qualifies; zero or multiple qualifying samples yield
    /// `Unassigned` (an ambiguous match is not a reliable identification).
    pub fn assign(&self, i7: Option<&str>, i5: Option<&str>) -> Assignment {
        let mode = self.index.mode();
        let i7 = i7.filter(|s| !s.is_empty());
        let i5 = i5.filter(|s| !s.is_empty());
        if (mode.uses_i7() && i7.is_none()) || (mode.uses_i5() && i5.is_none()) {
            return Assignment::Unassigned;
        }

        if self.max_mismatch == 0 {
            return match compose_key(mode, i7, i5).and_then(|key| self.index.exact_lookup(&key)) {
                Some(sample) => Assignment::Assigned { sample, distance: 0 },
                None => Assignment::Unassigned,
            };
        }

        let mut best: Option<(usize, u8)> = None;
        for (idx, entry) in self.index.samples().iter().enumerate() {
            let Some(distance) = self.entry_distance(entry, i7, i5) else {
                continue;
            };
            if best.is_some() {
                // Two samples qualify at this tolerance.
                return Assignment::Unassigned;
            }
            best = Some((idx, distance));
        }
        match best {
            Some((sample, distance)) => Assignment::Assigned { sample, distance },
            None => Assignment::Unassigned,
        }
    }

    /// Distance of the observed barcodes to one sample's reference pair,
    /// if every active field is independently within the tolerance.
    /// For mode `both` the reported distance is the larger field distance.
    fn entry_distance(&self, entry: &SampleEntry, i7: Option<&str>, i5: Option<&str>) -> Option<u8> {
        let mode = self.index.mode();
        let mut distance: u8 = 0;
        if mode.uses_i7() {
            let d = hamming_within(
                i7?.as_bytes(),
                entry.i7.as_deref()?.as_bytes(),
                self.max_mismatch,
            )?;
            distance = distance.max(d);
        }
        if mode.uses_i5() {
            let d = hamming_within(
                i5?.as_bytes(),
                entry.i5.as_deref()?.as_bytes(),
                self.max_mismatch,
            )?;
            distance = distance.max(d);
        }
        Some(distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::IndexMode;
    use std::io::Cursor;

    fn index(table: &str, mode: IndexMode, max: u8) -> ReferenceIndex {
        ReferenceIndex::from_reader(Cursor::new(table.to_string()), mode, max).unwrap()
    }

    const TABLE: &str = "sample_1\tAACCGGTT\tTTGGCCAA\nsample_2\tCCAATTGG\tGGTTAACC\n";

    #[test]
    fn test_hamming_within_exact() {
        assert_eq!(hamming_within(b"AACCGGTT", b"AACCGGTT", 0), Some(0));
    }

    #[test]
    fn test_hamming_within_boundary() {
        assert_eq!(hamming_within(b"AACCGGTT", b"AACCGGTA", 1), Some(1));
        assert_eq!(hamming_within(b"AACCGGTT", b"AACCGGAA", 1), None);
        assert_eq!(hamming_within(b"AACCGGTT", b"AACCGGAA", 2), Some(2));
    }

    #[test]
    fn test_hamming_within_length_mismatch() {
        assert_eq!(hamming_within(b"AACC", b"AACCGGTT", 3), None);
        assert_eq!(hamming_within(b"", b"AACCGGTT", 3), None);
    }

    #[test]
    fn test_exact_assignment_at_zero_tolerance() {
        let index = index(TABLE, IndexMode::Both, 0);
        let matcher = BarcodeMatcher::new(&index, 0);
        assert_eq!(
            matcher.assign(Some("AACCGGTT"), Some("TTGGCCAA")),
            Assignment::Assigned { sample: 0, distance: 0 }
        );
        assert_eq!(
            matcher.assign(Some("AACCGGTA"), Some("TTGGCCAA")),
            Assignment::Unassigned
        );
    }

    #[test]
    fn test_single_mismatch_rescued_at_tolerance_one() {
        let index = index(TABLE, IndexMode::Both, 1);
        let matcher = BarcodeMatcher::new(&index, 1);
        assert_eq!(
            matcher.assign(Some("AACCGGTA"), Some("TTGGCCAA")),
            Assignment::Assigned { sample: 0, distance: 1 }
        );
        // One substitution past the tolerance.
        assert_eq!(
            matcher.assign(Some("AACCGGAA"), Some("TTGGCCAA")),
            Assignment::Unassigned
        );
    }

    #[test]
    fn test_both_mode_thresholds_are_per_field() {
        // One mismatch in each field: within tolerance 1 independently,
        // even though the summed distance is 2.
        let index = index(TABLE, IndexMode::Both, 1);
        let matcher = BarcodeMatcher::new(&index, 1);
        assert_eq!(
            matcher.assign(Some("AACCGGTA"), Some("TTGGCCAT")),
            Assignment::Assigned { sample: 0, distance: 1 }
        );
    }

    #[test]
    fn test_both_mode_requires_both_fields_within_tolerance() {
        let index = index(TABLE, IndexMode::Both, 1);
        let matcher = BarcodeMatcher::new(&index, 1);
        // i7 exact, i5 two substitutions away.
        assert_eq!(
            matcher.assign(Some("AACCGGTT"), Some("TTGGCCTT")),
            Assignment::Unassigned
        );
    }

    #[test]
    fn test_ambiguous_candidates_rejected() {
        let close = "sample_1\tAACCGGTT\tTTGGCCAA\nsample_2\tAACCGGTA\tTTGGCCAA\n";
        let index = index(close, IndexMode::Both, 1);
        let matcher = BarcodeMatcher::new(&index, 1);
        // Exactly on sample_1 but within 1 of sample_2 as well: rejected.
        assert_eq!(
            matcher.assign(Some("AACCGGTT"), Some("TTGGCCAA")),
            Assignment::Unassigned
        );
    }

    #[test]
    fn test_missing_observed_barcode_is_unassigned() {
        let index = index(TABLE, IndexMode::Both, 1);
        let matcher = BarcodeMatcher::new(&index, 1);
        assert_eq!(matcher.assign(None, Some("TTGGCCAA")), Assignment::Unassigned);
        assert_eq!(matcher.assign(Some("AACCGGTT"), None), Assignment::Unassigned);
        assert_eq!(matcher.assign(Some(""), Some("TTGGCCAA")), Assignment::Unassigned);
    }

    #[test]
    fn test_single_index_modes() {
        let index_i7 = index(TABLE, IndexMode::I7, 1);
        let matcher = BarcodeMatcher::new(&index_i7, 1);
        assert_eq!(
            matcher.assign(Some("CCAATTGG"), None),
            Assignment::Assigned { sample: 1, distance: 0 }
        );

        let index_i5 = index(TABLE, IndexMode::I5, 1);
        let matcher = BarcodeMatcher::new(&index_i5, 1);
        assert_eq!(
            matcher.assign(None, Some("GGTTAACA")),
            Assignment::Assigned { sample: 1, distance: 1 }
        );
    }

    #[test]
    fn test_assignment_is_deterministic() {
        let index = index(TABLE, IndexMode::Both, 2);
        let matcher = BarcodeMatcher::new(&index, 2);
        let first = matcher.assign(Some("AACCGGAA"), Some("TTGGCCAA"));
        for _ in 0..10 {
            assert_eq!(matcher.assign(Some("AACCGGAA"), Some("TTGGCCAA")), first);
        }
    }
}
