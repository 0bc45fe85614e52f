//! Engine handle: one value owning the generation settings
//!
//! Create it once from a [`GenerationConfig`] and pass it to whatever needs
//! trees or leaves.

use crate::config::GenerationConfig;
use crate::core::error::Error;
use crate::core::types::Result;
use crate::functions::GrowthFunction;
use crate::leaf::{LeafShapeGenerator, get_leaf_preset};
use crate::mesh::Mesh;
use crate::mesher::{ManifoldMesher, TreeMesher};
use crate::presets::TreePreset;
use crate::skeleton::Tree;

pub struct Engine {
    config: GenerationConfig,
    mesher: ManifoldMesher,
}

impl Engine {
    pub fn new(config: GenerationConfig) -> Self {
        let mesher = ManifoldMesher::new(config.radial_resolution, config.smooth_iterations);
        Self { config, mesher }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Build and execute the function tree of a tree preset
    pub fn build_tree(&self, preset: &str) -> Result<Tree> {
        let seed = self.config.seed;
        let preset = TreePreset::from_name(preset, seed)?;

        let mut branches = preset.branch_function(seed);
        if self.config.growth_iterations > 0 {
            branches.add_child(GrowthFunction {
                seed,
                iterations: self.config.growth_iterations,
                ..Default::default()
            });
        }
        let mut trunk = preset.trunk_function(seed);
        trunk.add_child(branches);

        let mut tree = Tree::new();
        tree.set_trunk_function(trunk);
        tree.execute_functions()?;
        Ok(tree)
    }

    pub fn mesh_tree(&self, tree: &Tree) -> Result<Mesh> {
        self.mesher.mesh_tree(tree)
    }

    /// Tree mesh for the configured preset
    pub fn generate_tree(&self) -> Result<Mesh> {
        let tree = self.build_tree(&self.config.preset)?;
        self.mesh_tree(&tree)
    }

    /// Leaf mesh for a leaf preset, seeded with the configured seed
    pub fn generate_leaf(&self, preset: &str) -> Result<Mesh> {
        let leaf_preset = get_leaf_preset(preset).ok_or_else(|| Error::UnknownPreset(preset.to_string()))?;
        let mut generator = LeafShapeGenerator { seed: self.config.seed, ..Default::default() };
        leaf_preset.apply(&mut generator);
        Ok(generator.generate())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(GenerationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::attributes;

    #[test]
    fn test_generate_tree() {
        let engine = Engine::new(GenerationConfig { radial_resolution: 6, ..Default::default() });
        let mesh = engine.generate_tree().unwrap();
        assert!(mesh.vertex_count() > 0);
        assert!(mesh.indices_valid());
        assert!(mesh.has_float_attribute(attributes::RADIUS));
    }

    #[test]
    fn test_growth_adds_nodes() {
        let plain = Engine::default().build_tree("PINE").unwrap();
        let grown = Engine::new(GenerationConfig { growth_iterations: 3, ..Default::default() })
            .build_tree("PINE")
            .unwrap();
        assert!(grown.skeleton().node_count() > plain.skeleton().node_count());
    }

    #[test]
    fn test_unknown_presets() {
        let engine = Engine::default();
        assert!(matches!(engine.build_tree("cactus"), Err(Error::UnknownPreset(_))));
        assert!(matches!(engine.generate_leaf("Fern"), Err(Error::UnknownPreset(_))));
    }

    #[test]
    fn test_generate_leaf() {
        let leaf = Engine::default().generate_leaf("birch").unwrap();
        assert!(leaf.polygon_count() > 0);
        assert!(leaf.has_float_attribute(attributes::VEIN_DISTANCE));
    }

    #[test]
    fn test_same_config_same_mesh() {
        let config = GenerationConfig { preset: "RANDOM".to_string(), seed: 11, ..Default::default() };
        let a = Engine::new(config.clone()).generate_tree().unwrap();
        let b = Engine::new(config).generate_tree().unwrap();
        assert_eq!(a.get_vertices(), b.get_vertices());
    }
}
