use crate::bio::alignment::normalized_edit_distance;
use crate::bio::sequence::Sequence;
use crate::{DendrosortError, Result};
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Default k-mer length for the alignment-free metric, matching the sketch
/// size the upstream benchmark datasets were prepared with.
pub const DEFAULT_KMER_SIZE: usize = 15;

/// Pairwise dissimilarity measure between two sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// Normalized edit distance from a global alignment.
    Edit,
    /// Jaccard distance between k-mer sets; much faster than alignment for
    /// long sequences, at the cost of coarser resolution.
    Kmer,
}

impl std::str::FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "edit" | "align" | "alignment" => Ok(DistanceMetric::Edit),
            "kmer" | "k-mer" | "jaccard" => Ok(DistanceMetric::Kmer),
            _ => Err(format!("Unknown distance metric: '{}'. Options: edit, kmer", s)),
        }
    }
}

impl std::fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistanceMetric::Edit => write!(f, "edit"),
            DistanceMetric::Kmer => write!(f, "kmer"),
        }
    }
}

/// Symmetric N×N matrix of pairwise dissimilarities, indexed by original
/// input position. The diagonal is always zero.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    pub fn zeroed(n: usize) -> Self {
        Self {
            n,
            values: vec![0.0; n * n],
        }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }

    /// Set both `(i, j)` and `(j, i)` so symmetry holds by construction.
    pub fn set(&mut self, i: usize, j: usize, distance: f64) {
        self.values[i * self.n + j] = distance;
        self.values[j * self.n + i] = distance;
    }
}

/// Computes the all-pairs distance matrix for a set of sequences.
pub struct DistanceEngine {
    metric: DistanceMetric,
    kmer_size: usize,
}

impl DistanceEngine {
    pub fn new(metric: DistanceMetric) -> Self {
        Self {
            metric,
            kmer_size: DEFAULT_KMER_SIZE,
        }
    }

    pub fn with_kmer_size(mut self, kmer_size: usize) -> Self {
        self.kmer_size = kmer_size;
        self
    }

    /// Number of pairwise comparisons `compute` will perform for `n` inputs.
    pub fn pair_count(n: usize) -> u64 {
        (n as u64 * (n as u64).saturating_sub(1)) / 2
    }

    pub fn compute(&self, sequences: &[Sequence]) -> Result<DistanceMatrix> {
        self.compute_with_progress(sequences, None)
    }

    /// All-pairs computation. Comparisons are independent and run on the
    /// rayon pool; each (i, j) cell is produced by exactly one task.
    pub fn compute_with_progress(
        &self,
        sequences: &[Sequence],
        progress: Option<&ProgressBar>,
    ) -> Result<DistanceMatrix> {
        let n = sequences.len();
        if n < 2 {
            return Err(DendrosortError::InvalidInput(format!(
                "a guide tree needs at least two sequences, got {}",
                n
            )));
        }

        if let Some(empty) = sequences.iter().find(|s| s.is_empty()) {
            return Err(DendrosortError::InvalidInput(format!(
                "sequence '{}' has zero length",
                empty.id
            )));
        }

        if self.metric == DistanceMetric::Kmer && self.kmer_size == 0 {
            return Err(DendrosortError::InvalidInput(
                "k-mer size must be at least 1".to_string(),
            ));
        }

        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .collect();

        let computed: Result<Vec<(usize, usize, f64)>> = pairs
            .par_iter()
            .map(|&(i, j)| {
                let d = self.pairwise(&sequences[i], &sequences[j]);
                if let Some(pb) = progress {
                    pb.inc(1);
                }
                if !d.is_finite() {
                    return Err(DendrosortError::InvalidInput(format!(
                        "non-finite distance between '{}' and '{}'",
                        sequences[i].id, sequences[j].id
                    )));
                }
                Ok((i, j, d))
            })
            .collect();

        let mut matrix = DistanceMatrix::zeroed(n);
        for (i, j, d) in computed? {
            matrix.set(i, j, d);
        }

        Ok(matrix)
    }

    fn pairwise(&self, a: &Sequence, b: &Sequence) -> f64 {
        match self.metric {
            DistanceMetric::Edit => normalized_edit_distance(&a.residues, &b.residues),
            DistanceMetric::Kmer => self.kmer_distance(a, b),
        }
    }

    fn kmer_distance(&self, a: &Sequence, b: &Sequence) -> f64 {
        let kmers_a = extract_kmers(&a.residues, self.kmer_size);
        let kmers_b = extract_kmers(&b.residues, self.kmer_size);

        let intersection = kmers_a.intersection(&kmers_b).count();
        let union = kmers_a.len() + kmers_b.len() - intersection;

        let mut distance = if union == 0 {
            0.0
        } else {
            1.0 - intersection as f64 / union as f64
        };

        // Distinct sequences can share a k-mer profile; zero stays reserved
        // for identical records.
        if distance == 0.0 && a.residues != b.residues {
            distance = f64::EPSILON;
        }

        distance
    }
}

/// Collect the set of k-length substrings. Sequences shorter than k
/// contribute themselves as a single profile entry.
fn extract_kmers(residues: &[u8], k: usize) -> HashSet<&[u8]> {
    if residues.len() < k {
        let mut kmers = HashSet::with_capacity(1);
        kmers.insert(residues);
        return kmers;
    }

    residues.windows(k).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seqs(residues: &[&[u8]]) -> Vec<Sequence> {
        residues
            .iter()
            .enumerate()
            .map(|(i, r)| Sequence::new(format!("seq{}", i), r.to_vec()))
            .collect()
    }

    #[test]
    fn test_symmetric_zero_diagonal() {
        for metric in [DistanceMetric::Edit, DistanceMetric::Kmer] {
            let sequences = seqs(&[b"ACGTACGTAC", b"ACGTTGGTAC", b"TTTTGGGGCC"]);
            let matrix = DistanceEngine::new(metric)
                .with_kmer_size(4)
                .compute(&sequences)
                .unwrap();

            for i in 0..3 {
                assert_eq!(matrix.get(i, i), 0.0);
                for j in 0..3 {
                    assert_eq!(matrix.get(i, j), matrix.get(j, i));
                }
            }
        }
    }

    #[test]
    fn test_identical_sequences_have_zero_distance() {
        let sequences = seqs(&[b"ACGTACGT", b"ACGTACGT"]);
        for metric in [DistanceMetric::Edit, DistanceMetric::Kmer] {
            let matrix = DistanceEngine::new(metric)
                .with_kmer_size(4)
                .compute(&sequences)
                .unwrap();
            assert_eq!(matrix.get(0, 1), 0.0);
        }
    }

    #[test]
    fn test_distinct_sequences_have_positive_distance() {
        // Same 3-mer profile, different sequences: the collision floor keeps
        // the distance positive.
        let sequences = seqs(&[b"ACGACGACG", b"ACGACG"]);
        let matrix = DistanceEngine::new(DistanceMetric::Kmer)
            .with_kmer_size(3)
            .compute(&sequences)
            .unwrap();
        assert!(matrix.get(0, 1) > 0.0);
    }

    #[test]
    fn test_too_few_sequences_rejected() {
        let engine = DistanceEngine::new(DistanceMetric::Edit);
        assert!(matches!(
            engine.compute(&[]),
            Err(DendrosortError::InvalidInput(_))
        ));
        assert!(matches!(
            engine.compute(&seqs(&[b"ACGT"])),
            Err(DendrosortError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_empty_sequence_rejected() {
        let sequences = seqs(&[b"ACGT", b""]);
        let engine = DistanceEngine::new(DistanceMetric::Edit);
        assert!(matches!(
            engine.compute(&sequences),
            Err(DendrosortError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_short_sequences_fall_back_to_whole_profile() {
        let sequences = seqs(&[b"AC", b"AC", b"GT"]);
        let matrix = DistanceEngine::new(DistanceMetric::Kmer)
            .compute(&sequences)
            .unwrap();
        assert_eq!(matrix.get(0, 1), 0.0);
        assert!(matrix.get(0, 2) > 0.0);
    }

    #[test]
    fn test_pair_count() {
        assert_eq!(DistanceEngine::pair_count(2), 1);
        assert_eq!(DistanceEngine::pair_count(5), 10);
    }
}
