//! Node arena
//!
//! Nodes are stored in a flat `Vec` and reference each other by index, the
//! same way the colonization nodes of a tree generator do. A node is a
//! straight segment starting where its parent places it
//! (`position_in_parent` along the parent segment) and extending `length`
//! along `direction`.

use crate::core::types::Vec3;
use crate::math::geometry::{normalize_or, orthogonal_vector, project_on_plane};
use crate::skeleton::growth_info::GrowthInfo;

pub type NodeId = usize;

/// Children at or beyond this position continue their parent's branch
pub const CONTINUATION_POSITION: f32 = 1.0 - 1e-4;

/// Link from a parent node to a child
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeChild {
    pub node: NodeId,
    /// Where along the parent segment the child starts, in [0, 1]
    pub position_in_parent: f32,
}

#[derive(Clone, Debug)]
pub struct Node {
    pub children: Vec<NodeChild>,
    pub parent: Option<NodeId>,
    pub direction: Vec3,
    /// Unit vector perpendicular to `direction`
    pub tangent: Vec3,
    pub length: f32,
    pub radius: f32,
    /// Id of the shape function that created the node
    pub creator_id: usize,
    pub growth: GrowthInfo,
}

impl Node {
    pub fn new(direction: Vec3, parent_tangent: Vec3, length: f32, radius: f32, creator_id: usize) -> Self {
        let direction = normalize_or(direction, Vec3::Z);
        let tangent = normalize_or(
            project_on_plane(parent_tangent, direction),
            orthogonal_vector(direction),
        );
        Self {
            children: Vec::new(),
            parent: None,
            direction,
            tangent,
            length,
            radius,
            creator_id,
            growth: GrowthInfo::None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Child continuing this node's branch, if any
    pub fn continuation(&self) -> Option<NodeId> {
        self.children
            .first()
            .filter(|c| c.position_in_parent >= CONTINUATION_POSITION)
            .map(|c| c.node)
    }
}

/// Root of a node hierarchy and its world position
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stem {
    pub node: NodeId,
    pub position: Vec3,
}

/// Flat storage for all nodes of a tree
#[derive(Clone, Debug, Default)]
pub struct Skeleton {
    nodes: Vec<Node>,
    stems: Vec<Stem>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.stems.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn stems(&self) -> &[Stem] {
        &self.stems
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    /// Add a parentless node
    pub fn add_node(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Add a node as a new stem root at `position`
    pub fn add_stem(&mut self, node: Node, position: Vec3) -> NodeId {
        let id = self.add_node(node);
        self.stems.push(Stem { node: id, position });
        id
    }

    /// Append `node` to `parent`'s children
    pub fn add_child(&mut self, parent: NodeId, mut node: Node, position_in_parent: f32) -> NodeId {
        node.parent = Some(parent);
        let id = self.add_node(node);
        self.nodes[parent].children.push(NodeChild { node: id, position_in_parent });
        id
    }

    /// World position where `child` starts on `parent` placed at `parent_position`
    pub fn child_position(&self, parent: NodeId, parent_position: Vec3, position_in_parent: f32) -> Vec3 {
        let node = &self.nodes[parent];
        parent_position + node.direction * node.length * position_in_parent
    }

    /// Length of the branch starting at `start`, following continuation children
    pub fn branch_length(&self, start: NodeId) -> f32 {
        let mut length = 0.0;
        let mut current = Some(start);
        while let Some(id) = current {
            let node = &self.nodes[id];
            length += node.length;
            current = node.continuation();
        }
        length
    }

    /// Ids of `root` and all its descendants, parents before children
    pub fn subtree(&self, root: NodeId) -> Vec<NodeId> {
        let mut ids = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            ids.push(id);
            stack.extend(self.nodes[id].children.iter().rev().map(|c| c.node));
        }
        ids
    }

    /// World start position of every node
    pub fn world_positions(&self) -> Vec<Vec3> {
        let mut positions = vec![Vec3::ZERO; self.nodes.len()];
        let mut stack: Vec<(NodeId, Vec3)> = self.stems.iter().map(|s| (s.node, s.position)).collect();
        while let Some((id, position)) = stack.pop() {
            positions[id] = position;
            for child in &self.nodes[id].children {
                stack.push((child.node, self.child_position(id, position, child.position_in_parent)));
            }
        }
        positions
    }
}
