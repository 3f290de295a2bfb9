use crate::core::distance::DistanceMatrix;
use crate::core::linkage::Linkage;
use crate::{DendrosortError, Result};

/// One cluster in the finished tree. Leaves wrap a single input sequence;
/// internal nodes own exactly two children, created in merge order and never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct Node {
    /// Node ids double as creation order: leaves are 0..N-1, internal nodes
    /// continue from N in the order they were merged.
    pub id: usize,
    /// Child node ids, earlier-representative subtree first. Empty for leaves.
    pub children: Vec<usize>,
    /// Original input index for leaves, None for internal nodes.
    pub leaf: Option<usize>,
    /// Number of leaves beneath this node.
    pub size: usize,
    /// Smallest original input index beneath this node; the deterministic
    /// tie-break key during merging.
    pub representative: usize,
    /// Ultrametric height (half the merge distance), zero for leaves.
    pub height: f64,
}

/// A rooted hierarchical clustering over N input sequences: N leaves and
/// N-1 strictly binary internal nodes.
#[derive(Debug, Clone)]
pub struct GuideTree {
    nodes: Vec<Node>,
    root: usize,
}

impl GuideTree {
    pub fn root(&self) -> &Node {
        &self.nodes[self.root]
    }

    pub fn node(&self, id: usize) -> &Node {
        &self.nodes[id]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.leaf.is_some()).count()
    }

    /// Depth-first leaf order: children are visited in their stored order, so
    /// the result is fully determined by the merge history. Returns a
    /// permutation of 0..N-1; anything else means the builder produced a
    /// malformed tree and is reported as an invariant violation.
    pub fn traversal_order(&self) -> Result<Vec<usize>> {
        let n = self.leaf_count();
        let mut order = Vec::with_capacity(n);
        let mut stack = vec![self.root];

        while let Some(id) = stack.pop() {
            let node = self.nodes.get(id).ok_or_else(|| {
                DendrosortError::InvariantViolation(format!(
                    "tree references missing node {}",
                    id
                ))
            })?;

            match node.leaf {
                Some(index) => order.push(index),
                None => {
                    for &child in node.children.iter().rev() {
                        stack.push(child);
                    }
                }
            }
        }

        let mut seen = vec![false; n];
        for &index in &order {
            if index >= n || seen[index] {
                return Err(DendrosortError::InvariantViolation(format!(
                    "traversal emitted leaf index {} more than once or out of range",
                    index
                )));
            }
            seen[index] = true;
        }

        if order.len() != n {
            return Err(DendrosortError::InvariantViolation(format!(
                "traversal covered {} of {} leaves",
                order.len(),
                n
            )));
        }

        Ok(order)
    }

    fn check_shape(&self, n: usize) -> Result<()> {
        let leaves = self.leaf_count();
        if leaves != n || self.nodes.len() != 2 * n - 1 {
            return Err(DendrosortError::InvariantViolation(format!(
                "expected {} leaves and {} nodes, found {} leaves and {} nodes",
                n,
                2 * n - 1,
                leaves,
                self.nodes.len()
            )));
        }
        Ok(())
    }
}

/// Builds a guide tree by agglomerative clustering: O(N^2) scan per merge,
/// O(N^3) total, which covers the tens to low thousands of sequences these
/// benchmark datasets contain.
pub struct GuideTreeBuilder {
    linkage: Linkage,
}

impl GuideTreeBuilder {
    pub fn new(linkage: Linkage) -> Self {
        Self { linkage }
    }

    pub fn build(&self, matrix: &DistanceMatrix) -> Result<GuideTree> {
        let n = matrix.len();
        if n < 2 {
            return Err(DendrosortError::InvalidInput(format!(
                "a guide tree needs at least two sequences, got {}",
                n
            )));
        }

        let mut nodes: Vec<Node> = (0..n)
            .map(|i| Node {
                id: i,
                children: Vec::new(),
                leaf: Some(i),
                size: 1,
                representative: i,
                height: 0.0,
            })
            .collect();

        // Working set of live clusters: node ids plus a square distance
        // matrix over their positions. Rows and columns are dropped as
        // clusters merge.
        let mut active: Vec<usize> = (0..n).collect();
        let mut work: Vec<Vec<f64>> = (0..n)
            .map(|i| (0..n).map(|j| matrix.get(i, j)).collect())
            .collect();

        while active.len() > 1 {
            let (pos_i, pos_j, merge_distance) = self.closest_pair(&active, &work, &nodes)?;

            let node_i = active[pos_i];
            let node_j = active[pos_j];
            let size_i = nodes[node_i].size;
            let size_j = nodes[node_j].size;

            // Distances from the merged cluster to every survivor, in the
            // surviving column order.
            let mut merged_row = Vec::with_capacity(active.len() - 2);
            for k in 0..active.len() {
                if k == pos_i || k == pos_j {
                    continue;
                }
                merged_row
                    .push(self.linkage.combine(work[pos_i][k], work[pos_j][k], size_i, size_j));
            }

            // Earlier-representative child first; this fixes the traversal
            // order at merge time.
            let (first, second) =
                if nodes[node_i].representative <= nodes[node_j].representative {
                    (node_i, node_j)
                } else {
                    (node_j, node_i)
                };

            let id = nodes.len();
            let representative = nodes[node_i]
                .representative
                .min(nodes[node_j].representative);
            nodes.push(Node {
                id,
                children: vec![first, second],
                leaf: None,
                size: size_i + size_j,
                representative,
                height: merge_distance / 2.0,
            });

            let (lo, hi) = (pos_i.min(pos_j), pos_i.max(pos_j));
            active.remove(hi);
            active.remove(lo);
            work.remove(hi);
            work.remove(lo);
            for row in work.iter_mut() {
                row.remove(hi);
                row.remove(lo);
            }

            for (row, &d) in work.iter_mut().zip(merged_row.iter()) {
                row.push(d);
            }
            merged_row.push(0.0);
            work.push(merged_row);
            active.push(id);
        }

        let tree = GuideTree {
            root: active[0],
            nodes,
        };
        tree.check_shape(n)?;

        Ok(tree)
    }

    /// Minimum-distance pair over the working set. Ties are broken by the
    /// lexicographically smallest pair of representative indices, never by
    /// scan order, so the merge sequence is reproducible across runs.
    fn closest_pair(
        &self,
        active: &[usize],
        work: &[Vec<f64>],
        nodes: &[Node],
    ) -> Result<(usize, usize, f64)> {
        let mut best: Option<(f64, (usize, usize), (usize, usize))> = None;

        for i in 0..active.len() {
            for j in (i + 1)..active.len() {
                let d = work[i][j];
                if d.is_nan() {
                    return Err(DendrosortError::DegenerateTree(format!(
                        "NaN distance between clusters {} and {}",
                        active[i], active[j]
                    )));
                }

                let rep_i = nodes[active[i]].representative;
                let rep_j = nodes[active[j]].representative;
                let key = (rep_i.min(rep_j), rep_i.max(rep_j));

                let better = match &best {
                    None => true,
                    Some((best_d, best_key, _)) => {
                        d < *best_d || (d == *best_d && key < *best_key)
                    }
                };
                if better {
                    best = Some((d, key, (i, j)));
                }
            }
        }

        best.map(|(d, _, (i, j))| (i, j, d)).ok_or_else(|| {
            DendrosortError::DegenerateTree(
                "could not order any cluster pair for merging".to_string(),
            )
        })
    }
}
