use std::sync::atomic::{AtomicUsize, Ordering};

use glam::Vec3;

use super::{Bvh, BvhNode, BvhNodeId};
use crate::{measure, Axis, BoundingBox, Elapsed, EntityToken};

/// Constructs BVH using a full-sweep SAH approach: each node gets split at
/// the position (along the axis of its largest extent) that minimizes the
/// summed `half_area * count` of both halves, considering every possible
/// position.
///
/// Sub-trees larger than the parallel threshold are built using
/// `rayon::join()`, so the caller decides on the thread pool by calling
/// [`Self::build()`] from within `ThreadPool::install()`.
///
/// Output doesn't depend on the threshold nor on the number of threads.
pub struct BvhBuilder<'a> {
    bounds: &'a [BoundingBox],
    tokens: &'a [EntityToken],
    centroids: Vec<Vec3>,
    parallel_threshold: usize,
    allocated_nodes: AtomicUsize,
    max_depth: AtomicUsize,
    forks: AtomicUsize,
}

impl<'a> BvhBuilder<'a> {
    /// Depth past which nodes get split in half instead of through SAH, which
    /// bounds the tree's depth and keeps traversal within its fixed stack.
    pub const SAH_DEPTH_LIMIT: usize = Bvh::STACK_SIZE - 32;

    pub fn new(bounds: &'a [BoundingBox], tokens: &'a [EntityToken]) -> Self {
        assert_eq!(bounds.len(), tokens.len());

        Self {
            bounds,
            tokens,
            centroids: bounds.iter().map(BoundingBox::centroid).collect(),
            parallel_threshold: usize::MAX,
            allocated_nodes: AtomicUsize::new(0),
            max_depth: AtomicUsize::new(0),
            forks: AtomicUsize::new(0),
        }
    }

    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Builds the tree.
    ///
    /// # Panics
    ///
    /// Panics when there are no leaves - callers are expected to reject empty
    /// inputs before reaching here.
    pub fn build(self) -> (Bvh, BuildStats) {
        assert!(!self.bounds.is_empty(), "cannot build BVH without leaves");

        let ((nodes, depth), elapsed) = measure(|| {
            let mut indices: Vec<u32> = (0..self.bounds.len() as u32).collect();
            let root = self.build_range(&mut indices, None, 1);

            let mut nodes = Vec::with_capacity(
                self.allocated_nodes.load(Ordering::Relaxed),
            );

            Self::flatten(root, &mut nodes);

            (nodes, self.max_depth.load(Ordering::Relaxed))
        });

        let stats = BuildStats {
            leaves: self.bounds.len(),
            nodes: nodes.len(),
            depth,
            forks: self.forks.load(Ordering::Relaxed),
            elapsed,
        };

        log::debug!(
            "BVH built; leaves={}, nodes={}, depth={}, forks={}, tt={}",
            stats.leaves,
            stats.nodes,
            stats.depth,
            stats.forks,
            stats.elapsed,
        );

        (Bvh::from_nodes(nodes, depth), stats)
    }

    fn build_range(
        &self,
        indices: &mut [u32],
        sorted_by: Option<Axis>,
        depth: usize,
    ) -> BuildNode {
        self.allocated_nodes.fetch_add(1, Ordering::Relaxed);
        self.max_depth.fetch_max(depth, Ordering::Relaxed);

        if let &mut [index] = indices {
            return BuildNode::Leaf {
                bounds: self.bounds[index as usize],
                token: self.tokens[index as usize],
            };
        }

        let bounds: BoundingBox = indices
            .iter()
            .map(|&index| self.bounds[index as usize])
            .collect();

        let axis = bounds.major_axis();

        // A sub-range of a sorted range is sorted as well
        if sorted_by != Some(axis) {
            self.sort(indices, axis);
        }

        let split_at = if depth < Self::SAH_DEPTH_LIMIT {
            self.find_split(indices)
        } else {
            indices.len() / 2
        };

        let forked = indices.len() > self.parallel_threshold;
        let (left, right) = indices.split_at_mut(split_at);

        let (left, right) = if forked {
            self.forks.fetch_add(1, Ordering::Relaxed);

            // `join()` runs the first closure on the current thread and lets
            // other workers steal the second one; hand out the larger half
            if left.len() >= right.len() {
                let (right, left) = rayon::join(
                    || self.build_range(right, Some(axis), depth + 1),
                    || self.build_range(left, Some(axis), depth + 1),
                );

                (left, right)
            } else {
                rayon::join(
                    || self.build_range(left, Some(axis), depth + 1),
                    || self.build_range(right, Some(axis), depth + 1),
                )
            }
        } else {
            (
                self.build_range(left, Some(axis), depth + 1),
                self.build_range(right, Some(axis), depth + 1),
            )
        };

        BuildNode::Internal {
            bounds,
            children: Box::new([left, right]),
        }
    }

    fn sort(&self, indices: &mut [u32], axis: Axis) {
        indices.sort_unstable_by(|&lhs, &rhs| {
            let lhs_centroid = self.centroids[lhs as usize][axis];
            let rhs_centroid = self.centroids[rhs as usize][axis];

            lhs_centroid.total_cmp(&rhs_centroid).then(lhs.cmp(&rhs))
        });
    }

    /// Returns the number of leaves that should go into the left child; it's
    /// always within `1..indices.len()`.
    fn find_split(&self, indices: &[u32]) -> usize {
        let len = indices.len();
        let mut suffixes = vec![BoundingBox::EMPTY; len];
        let mut suffix = BoundingBox::EMPTY;

        for (i, &index) in indices.iter().enumerate().rev() {
            suffix += self.bounds[index as usize];
            suffixes[i] = suffix;
        }

        // ---

        let mut prefix = BoundingBox::EMPTY;
        let mut best_split_at = 1;
        let mut best_cost = f32::INFINITY;

        for split_at in 1..len {
            prefix += self.bounds[indices[split_at - 1] as usize];

            let cost = sah_cost(&prefix, split_at, &suffixes[split_at], len);

            if cost < best_cost {
                best_split_at = split_at;
                best_cost = cost;
            }
        }

        best_split_at
    }

    fn flatten(node: BuildNode, nodes: &mut Vec<BvhNode>) -> BvhNodeId {
        let id = BvhNodeId::new(nodes.len() as u32);

        match node {
            BuildNode::Leaf { bounds, token } => {
                nodes.push(BvhNode::Leaf { bounds, token });
            }

            BuildNode::Internal { bounds, children } => {
                let [left, right] = *children;

                // Placeholder, patched up once the children's ids are known
                nodes.push(BvhNode::Internal {
                    bounds,
                    left_id: id,
                    right_id: id,
                });

                let left_id = Self::flatten(left, nodes);
                let right_id = Self::flatten(right, nodes);

                nodes[id.get() as usize] = BvhNode::Internal {
                    bounds,
                    left_id,
                    right_id,
                };
            }
        }

        id
    }
}

/// Returns the surface area heuristic's cost of splitting `len` leaves into
/// `left` (holding `left_count` leaves) and `right`.
pub fn sah_cost(
    left: &BoundingBox,
    left_count: usize,
    right: &BoundingBox,
    len: usize,
) -> f32 {
    left.half_area() * (left_count as f32)
        + right.half_area() * ((len - left_count) as f32)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub leaves: usize,
    pub nodes: usize,
    pub depth: usize,
    pub forks: usize,
    pub elapsed: Elapsed,
}

enum BuildNode {
    Leaf {
        bounds: BoundingBox,
        token: EntityToken,
    },

    Internal {
        bounds: BoundingBox,
        children: Box<[BuildNode; 2]>,
    },
}
