use std::fmt::Write;

use super::{Bvh, BvhNode};

/// Dumps a tree in the Graphviz format; useful for eyeballing how the builder
/// partitioned a small scene.
pub struct BvhPrinter;

impl BvhPrinter {
    pub fn print(bvh: &Bvh) -> String {
        let mut out = String::new();

        _ = writeln!(&mut out, "digraph {{");

        for (id, node) in bvh.nodes().iter().enumerate() {
            match node {
                BvhNode::Internal {
                    bounds,
                    left_id,
                    right_id,
                } => {
                    _ = writeln!(
                        out,
                        "  n{} [label=\"node({} : {})\"]",
                        id,
                        bounds.min(),
                        bounds.max()
                    );

                    for child_id in [left_id, right_id] {
                        _ = writeln!(out, "  n{} -> n{}", id, child_id.get());
                    }
                }

                BvhNode::Leaf { token, .. } => {
                    _ = writeln!(out, "  n{} [label=\"leaf({:?})\"]", id, token);
                }
            }
        }

        _ = writeln!(out, "}}");

        out
    }
}
