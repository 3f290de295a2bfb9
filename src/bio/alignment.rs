//! Global alignment distance between residue strings.
//!
//! The sorter only needs a dissimilarity score, not a traceback, so this is
//! the classic unit-cost edit distance computed over two rolling DP rows
//! rather than a full alignment matrix.

/// Number of single-residue edits (substitution, insertion, deletion) needed
/// to turn `a` into `b`.
pub fn edit_distance(a: &[u8], b: &[u8]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Keep the shorter sequence on the row axis to bound memory
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    let mut prev: Vec<usize> = (0..=shorter.len()).collect();
    let mut curr: Vec<usize> = vec![0; shorter.len() + 1];

    for (i, &lc) in longer.iter().enumerate() {
        curr[0] = i + 1;

        for (j, &sc) in shorter.iter().enumerate() {
            let substitution = prev[j] + usize::from(lc != sc);
            let deletion = prev[j + 1] + 1;
            let insertion = curr[j] + 1;
            curr[j + 1] = substitution.min(deletion).min(insertion);
        }

        std::mem::swap(&mut prev, &mut curr);
    }

    prev[shorter.len()]
}

/// Edit distance scaled to [0, 1] by the longer sequence length.
/// Zero exactly when the two sequences are identical.
pub fn normalized_edit_distance(a: &[u8], b: &[u8]) -> f64 {
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 0.0;
    }

    edit_distance(a, b) as f64 / max_len as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_sequences() {
        assert_eq!(edit_distance(b"ACGT", b"ACGT"), 0);
        assert_eq!(normalized_edit_distance(b"ACGT", b"ACGT"), 0.0);
    }

    #[test]
    fn test_single_substitution() {
        assert_eq!(edit_distance(b"ACGT", b"AGGT"), 1);
    }

    #[test]
    fn test_indels() {
        assert_eq!(edit_distance(b"ACGTACGT", b"ACGTCGT"), 1);
        assert_eq!(edit_distance(b"", b"ACGT"), 4);
        assert_eq!(edit_distance(b"AC", b""), 2);
    }

    #[test]
    fn test_symmetry() {
        let a = b"ACGTTGCA";
        let b = b"TTGCAACG";
        assert_eq!(edit_distance(a, b), edit_distance(b, a));
        assert_eq!(normalized_edit_distance(a, b), normalized_edit_distance(b, a));
    }

    #[test]
    fn test_normalization_bounds() {
        let d = normalized_edit_distance(b"AAAA", b"TTTTTTTT");
        assert!(d > 0.0 && d <= 1.0);
    }
}
