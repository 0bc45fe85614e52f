//! Per-node scratch state owned by the shape function currently growing it

use crate::core::types::Vec3;

/// State of a node grown by a branch function
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BranchGrowthInfo {
    pub desired_length: f32,
    pub origin_radius: f32,
    /// World position of the node start
    pub position: Vec3,
    pub current_length: f32,
    pub deviation_from_rest_pose: f32,
    pub cumulated_weight: f32,
    pub age: f32,
    pub inactive: bool,
}

/// Role of a node in the vigor-based growth simulation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// Active growth tip
    Meristem,
    /// Interior node that has grown children
    Branch,
    /// Pruned tip, never grows again
    Cut,
    /// Structure the simulation does not grow (e.g. the trunk)
    #[default]
    Ignored,
    /// Lateral bud waiting for enough vigor
    Dormant,
    /// Tip that stopped growing to carry a flower
    Flower,
}

/// State of a node in the vigor-based growth simulation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BioNodeInfo {
    pub node_type: NodeType,
    pub branch_weight: f32,
    pub center_of_mass: Vec3,
    pub absolute_position: Vec3,
    pub vigor_ratio: f32,
    pub vigor: f32,
    pub age: u32,
    pub philotaxis_angle: f32,
    pub is_lateral: bool,
}

impl BioNodeInfo {
    pub fn new(node_type: NodeType) -> Self {
        Self {
            node_type,
            branch_weight: 0.0,
            center_of_mass: Vec3::ZERO,
            absolute_position: Vec3::ZERO,
            vigor_ratio: 1.0,
            vigor: 0.0,
            age: 0,
            philotaxis_angle: 0.0,
            is_lateral: false,
        }
    }

    pub fn with_angle(node_type: NodeType, philotaxis_angle: f32) -> Self {
        Self { philotaxis_angle, ..Self::new(node_type) }
    }
}

impl Default for BioNodeInfo {
    fn default() -> Self {
        Self::new(NodeType::Ignored)
    }
}

/// Scratch state attached to every node
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum GrowthInfo {
    #[default]
    None,
    Branch(BranchGrowthInfo),
    Bio(BioNodeInfo),
}

impl GrowthInfo {
    pub fn as_branch(&self) -> Option<&BranchGrowthInfo> {
        match self {
            GrowthInfo::Branch(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_branch_mut(&mut self) -> Option<&mut BranchGrowthInfo> {
        match self {
            GrowthInfo::Branch(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_bio(&self) -> Option<&BioNodeInfo> {
        match self {
            GrowthInfo::Bio(info) => Some(info),
            _ => None,
        }
    }

    pub fn as_bio_mut(&mut self) -> Option<&mut BioNodeInfo> {
        match self {
            GrowthInfo::Bio(info) => Some(info),
            _ => None,
        }
    }

    /// Growth simulation type, if the node carries simulation state
    pub fn node_type(&self) -> Option<NodeType> {
        self.as_bio().map(|info| info.node_type)
    }
}
