//! Tree: a function tree and the skeleton it produces

use crate::core::error::Error;
use crate::core::types::{Result, Vec3};
use crate::functions::{MAX_FUNCTION_DEPTH, ShapeFunction};
use crate::skeleton::growth_info::NodeType;
use crate::skeleton::node::Skeleton;

#[derive(Clone, Debug, Default)]
pub struct Tree {
    trunk_function: Option<ShapeFunction>,
    skeleton: Skeleton,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the root of the function tree
    pub fn set_trunk_function(&mut self, function: impl Into<ShapeFunction>) {
        self.trunk_function = Some(function.into());
    }

    pub fn trunk_function(&self) -> Option<&ShapeFunction> {
        self.trunk_function.as_ref()
    }

    pub fn trunk_function_mut(&mut self) -> Option<&mut ShapeFunction> {
        self.trunk_function.as_mut()
    }

    /// Regenerate the skeleton from the function tree.
    ///
    /// Functions run depth-first; each one receives a pre-order id and acts
    /// on the nodes created by its parent.
    pub fn execute_functions(&mut self) -> Result<()> {
        let function = self.trunk_function.as_ref().ok_or(Error::MissingTrunk)?;
        // Only a trunk creates stems; anything else would grow on nothing
        if !matches!(function, ShapeFunction::Trunk(_)) {
            return Err(Error::RootNotTrunk);
        }
        let depth = function.depth();
        if depth > MAX_FUNCTION_DEPTH {
            return Err(Error::FunctionTreeTooDeep { depth });
        }

        let mut skeleton = Skeleton::new();
        let mut next_id = 0;
        function.execute(&mut skeleton, &mut next_id, None);

        log::debug!(
            "Executed {} functions: {} stems, {} nodes",
            next_id,
            skeleton.stems().len(),
            skeleton.node_count()
        );
        self.skeleton = skeleton;
        Ok(())
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn is_executed(&self) -> bool {
        !self.skeleton.is_empty()
    }

    /// World positions of the tips that became flowers during growth
    pub fn flower_points(&self) -> Vec<Vec3> {
        let positions = self.skeleton.world_positions();
        self.skeleton
            .nodes()
            .iter()
            .zip(positions)
            .filter(|(node, _)| node.growth.node_type() == Some(NodeType::Flower))
            .map(|(node, position)| position + node.direction * node.length)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::{BranchFunction, GrowthFunction, TrunkFunction};

    #[test]
    fn test_execute_without_trunk() {
        let mut tree = Tree::new();
        assert!(matches!(tree.execute_functions(), Err(Error::MissingTrunk)));
        assert!(!tree.is_executed());
    }

    #[test]
    fn test_root_must_be_trunk() {
        let mut tree = Tree::new();
        tree.set_trunk_function(GrowthFunction::default());
        assert!(matches!(tree.execute_functions(), Err(Error::RootNotTrunk)));
        assert!(!tree.is_executed());

        tree.set_trunk_function(BranchFunction::default());
        assert!(matches!(tree.execute_functions(), Err(Error::RootNotTrunk)));
    }

    #[test]
    fn test_execute_is_not_additive() {
        let mut tree = Tree::new();
        let mut trunk = TrunkFunction::default();
        trunk.add_child(BranchFunction::default());
        tree.set_trunk_function(trunk);

        tree.execute_functions().unwrap();
        let first = tree.skeleton().node_count();
        tree.execute_functions().unwrap();
        assert_eq!(tree.skeleton().node_count(), first);
        assert_eq!(tree.skeleton().stems().len(), 1);
    }

    #[test]
    fn test_function_tree_too_deep() {
        let mut function = ShapeFunction::from(BranchFunction::default());
        for _ in 0..MAX_FUNCTION_DEPTH {
            let mut parent = ShapeFunction::from(BranchFunction::default());
            parent.add_child(function);
            function = parent;
        }
        let mut trunk = TrunkFunction::default();
        trunk.add_child(function);

        let mut tree = Tree::new();
        tree.set_trunk_function(trunk);
        assert!(matches!(
            tree.execute_functions(),
            Err(Error::FunctionTreeTooDeep { depth }) if depth > MAX_FUNCTION_DEPTH
        ));
    }

    #[test]
    fn test_no_flowers_without_growth() {
        let mut tree = Tree::new();
        tree.set_trunk_function(TrunkFunction::default());
        tree.execute_functions().unwrap();
        assert!(tree.flower_points().is_empty());
    }
}
