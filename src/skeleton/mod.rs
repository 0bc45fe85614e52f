//! Tree skeleton: the node arena realized by executing a function tree

pub mod growth_info;
pub mod node;
pub mod selection;
pub mod tree;

pub use growth_info::{BioNodeInfo, BranchGrowthInfo, GrowthInfo, NodeType};
pub use node::{Node, NodeChild, NodeId, Skeleton, Stem};
pub use selection::{BranchNode, BranchSelection, select_from_tree};
pub use tree::Tree;
