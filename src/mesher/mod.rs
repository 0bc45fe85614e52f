//! Tree meshers: turn a tree skeleton into a polygon mesh

pub mod manifold;

pub use manifold::ManifoldMesher;

use crate::core::types::Result;
use crate::mesh::Mesh;
use crate::skeleton::Tree;

pub trait TreeMesher {
    /// Mesh an executed tree
    fn mesh_tree(&self, tree: &Tree) -> Result<Mesh>;
}
