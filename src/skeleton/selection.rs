//! Branch selection: the chains of nodes created by a given shape function

use crate::core::types::Vec3;
use crate::skeleton::node::{NodeId, Skeleton};

/// A node of a selected branch and its world start position
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BranchNode {
    pub node: NodeId,
    pub position: Vec3,
}

/// Nodes of one branch, from base to tip
pub type BranchSelection = Vec<BranchNode>;

/// Collect every branch made of nodes created by `creator_id`.
///
/// A branch starts at a node of that creator whose parent does not continue
/// into it (a stem root or a lateral child) and follows continuation children
/// while they keep the same creator.
pub fn select_from_tree(skeleton: &Skeleton, creator_id: usize) -> Vec<BranchSelection> {
    let mut branches = Vec::new();
    // (node, world position, continues a selected branch)
    let mut stack: Vec<(NodeId, Vec3, bool)> = skeleton
        .stems()
        .iter()
        .rev()
        .map(|stem| (stem.node, stem.position, false))
        .collect();

    while let Some((id, position, continues)) = stack.pop() {
        let node = skeleton.node(id);
        let selected = node.creator_id == creator_id;

        if selected && !continues {
            let mut branch = Vec::new();
            let mut current = Some((id, position));
            while let Some((node_id, node_position)) = current {
                branch.push(BranchNode { node: node_id, position: node_position });
                current = skeleton
                    .node(node_id)
                    .continuation()
                    .filter(|&next| skeleton.node(next).creator_id == creator_id)
                    .map(|next| (next, skeleton.child_position(node_id, node_position, 1.0)));
            }
            branches.push(branch);
        }

        let continuation = node.continuation();
        for child in node.children.iter().rev() {
            let child_position = skeleton.child_position(id, position, child.position_in_parent);
            let child_continues =
                selected && Some(child.node) == continuation && skeleton.node(child.node).creator_id == creator_id;
            stack.push((child.node, child_position, child_continues));
        }
    }

    branches
}
