use rand::Rng;
use rand::seq::IndexedRandom;
use rand_distr::{Distribution, Normal};

pub const BASES: &[u8] = b"ACGT";

/// Generates a random nucleotide sequence of the given length.
pub fn random_dna<R: Rng>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| *BASES.choose(rng).expect("BASES is never empty") as char)
        .collect()
}

fn phred33(score: u8) -> u8 {
    score + 33
}

/// Generates a Phred+33 quality string with normally distributed scores
/// clamped to the 0-40 range by resampling.
pub fn random_quals<R: Rng>(rng: &mut R, length: usize, mean: f32, stdev: f32) -> String {
    let normal = Normal::new(mean, stdev).expect("invalid quality distribution");
    (0..length)
        .map(|_| {
            let mut raw = -1.0;
            while !(0.0..=40.0).contains(&raw) {
                raw = normal.sample(rng);
            }
            phred33(raw as u8) as char
        })
        .collect()
}

/// Substitutes the first `count` positions of a barcode with a different
/// base. Deterministic, for exercising mismatch tolerances.
pub fn substitute_bases(barcode: &str, count: usize) -> String {
    barcode
        .chars()
        .enumerate()
        .map(|(i, c)| {
            if i < count {
                if c == 'A' { 'C' } else { 'A' }
            } else {
                c
            }
        })
        .collect()
}
