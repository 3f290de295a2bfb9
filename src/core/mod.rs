pub mod distance;
pub mod guide_tree;
pub mod linkage;
pub mod newick;

pub use distance::{DistanceEngine, DistanceMatrix, DistanceMetric};
pub use guide_tree::{GuideTree, GuideTreeBuilder};
pub use linkage::Linkage;
