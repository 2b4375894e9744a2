mod builder;
mod node;
mod printer;

use std::{mem, ops};

pub use self::builder::*;
pub use self::node::*;
pub use self::printer::*;
use crate::{BoundingBox, EntityToken, Ray};

/// Flattened bounding volume hierarchy.
///
/// Nodes are laid out depth-first, starting with the root at index zero; a
/// tree built out of `n` leaves contains exactly `2n - 1` nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    depth: usize,
}

impl Bvh {
    /// Capacity of the traversal stack; the builder keeps the trees shallow
    /// enough never to overflow it.
    pub const STACK_SIZE: usize = 128;

    pub(crate) fn from_nodes(nodes: Vec<BvhNode>, depth: usize) -> Self {
        debug_assert!(!nodes.is_empty());
        debug_assert!(depth < Self::STACK_SIZE);

        Self { nodes, depth }
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of levels, counting the root as the first one.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn bounds(&self) -> BoundingBox {
        self[BvhNodeId::root()].bounds()
    }

    /// Returns tokens of all the leaves, left to right.
    pub fn leaves(&self) -> impl Iterator<Item = EntityToken> + '_ {
        self.nodes.iter().filter_map(|node| match node {
            BvhNode::Leaf { token, .. } => Some(*token),
            BvhNode::Internal { .. } => None,
        })
    }

    /// Walks the tree front-to-back and calls `visit` for each leaf that can
    /// contain a hit closer than the current distance; `visit` returns the
    /// new closest distance (which must not be larger than the current one).
    ///
    /// Returns the final closest distance.
    pub fn trace<F>(&self, ray: &Ray, mut distance: f32, mut visit: F) -> f32
    where
        F: FnMut(EntityToken) -> f32,
    {
        if ray.distance_to(&self.bounds()) >= distance {
            return distance;
        }

        let mut stack = [(BvhNodeId::root(), 0.0); Self::STACK_SIZE];
        let mut stack_len = 0;
        let mut node_id = BvhNodeId::root();

        loop {
            match self[node_id] {
                BvhNode::Internal {
                    left_id, right_id, ..
                } => {
                    let mut near_id = left_id;
                    let mut far_id = right_id;
                    let mut near_distance = ray.distance_to(&self[near_id].bounds());
                    let mut far_distance = ray.distance_to(&self[far_id].bounds());

                    if far_distance < near_distance {
                        mem::swap(&mut near_id, &mut far_id);
                        mem::swap(&mut near_distance, &mut far_distance);
                    }

                    if far_distance < distance {
                        stack[stack_len] = (far_id, far_distance);
                        stack_len += 1;
                    }

                    if near_distance < distance {
                        node_id = near_id;
                        continue;
                    }
                }

                BvhNode::Leaf { token, .. } => {
                    distance = visit(token);
                }
            }

            // Entries were pushed with the distance known back then, which
            // might've been shrunk in the meantime
            loop {
                let Some(top) = stack_len.checked_sub(1) else {
                    return distance;
                };

                stack_len = top;

                let (id, entry_distance) = stack[top];

                if entry_distance < distance {
                    node_id = id;
                    break;
                }
            }
        }
    }

    /// Walks the tree and calls `visit` for each leaf whose bounds the ray
    /// enters before `travel`, stopping at the first leaf for which `visit`
    /// returns `true`.
    pub fn occlude<F>(&self, ray: &Ray, travel: f32, mut visit: F) -> bool
    where
        F: FnMut(EntityToken) -> bool,
    {
        if ray.distance_to(&self.bounds()) >= travel {
            return false;
        }

        let mut stack = [BvhNodeId::root(); Self::STACK_SIZE];
        let mut stack_len = 0;
        let mut node_id = BvhNodeId::root();

        loop {
            match self[node_id] {
                BvhNode::Internal {
                    left_id, right_id, ..
                } => {
                    let left_hit =
                        ray.distance_to(&self[left_id].bounds()) < travel;

                    let right_hit =
                        ray.distance_to(&self[right_id].bounds()) < travel;

                    match (left_hit, right_hit) {
                        (true, true) => {
                            stack[stack_len] = right_id;
                            stack_len += 1;
                            node_id = left_id;
                            continue;
                        }

                        (true, false) => {
                            node_id = left_id;
                            continue;
                        }

                        (false, true) => {
                            node_id = right_id;
                            continue;
                        }

                        (false, false) => {
                            //
                        }
                    }
                }

                BvhNode::Leaf { token, .. } => {
                    if visit(token) {
                        return true;
                    }
                }
            }

            let Some(top) = stack_len.checked_sub(1) else {
                return false;
            };

            stack_len = top;
            node_id = stack[top];
        }
    }

    /// Returns the tree in the Graphviz format.
    pub fn print(&self) -> String {
        BvhPrinter::print(self)
    }
}

impl ops::Index<BvhNodeId> for Bvh {
    type Output = BvhNode;

    fn index(&self, id: BvhNodeId) -> &Self::Output {
        &self.nodes[id.get() as usize]
    }
}
