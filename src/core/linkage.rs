use serde::{Deserialize, Serialize};

/// Rule for deriving the distance between a freshly merged cluster and every
/// remaining cluster in the working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Linkage {
    /// Subtree-size-weighted mean of the two child distances (UPGMA-style).
    Average,
    /// Minimum of the two child distances.
    Single,
    /// Maximum of the two child distances.
    Complete,
}

impl Linkage {
    /// Distance from the cluster merging children `i` and `j` to some other
    /// cluster `k`, given the distances `d_ik` and `d_jk` and the leaf counts
    /// of the two children. Size weighting keeps repeatedly merged subtrees
    /// from being under-counted in the average.
    pub fn combine(&self, d_ik: f64, d_jk: f64, size_i: usize, size_j: usize) -> f64 {
        match self {
            Linkage::Average => {
                (d_ik * size_i as f64 + d_jk * size_j as f64) / (size_i + size_j) as f64
            }
            Linkage::Single => d_ik.min(d_jk),
            Linkage::Complete => d_ik.max(d_jk),
        }
    }
}

impl std::str::FromStr for Linkage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "average" | "upgma" => Ok(Linkage::Average),
            "single" | "min" => Ok(Linkage::Single),
            "complete" | "max" => Ok(Linkage::Complete),
            _ => Err(format!(
                "Unknown linkage rule: '{}'. Options: average, single, complete",
                s
            )),
        }
    }
}

impl std::fmt::Display for Linkage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Linkage::Average => write!(f, "average"),
            Linkage::Single => write!(f, "single"),
            Linkage::Complete => write!(f, "complete"),
        }
    }
}
