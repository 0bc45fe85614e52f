//! Quick-start tree presets
//!
//! A preset is a set of trunk and branch parameters. Unset values fall back
//! to shared defaults, so every preset produces a complete trunk + branches
//! function tree. `RANDOM` keeps the default trunk and draws its branch
//! parameters from a seeded generator.

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::Result;
use crate::functions::{BranchFunction, TrunkFunction};
use crate::math::SimpleRng;
use crate::property::PropertyWrapper;
use crate::skeleton::Tree;

pub const TREE_PRESET_NAMES: [&str; 4] = ["RANDOM", "OAK", "PINE", "WILLOW"];

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrunkParams {
    pub length: f32,
    pub start_radius: f32,
    pub end_radius: f32,
    pub shape: f32,
    pub up_attraction: f32,
    pub resolution: f32,
    pub randomness: f32,
}

impl Default for TrunkParams {
    fn default() -> Self {
        Self {
            length: 14.0,
            start_radius: 0.3,
            end_radius: 0.05,
            shape: 0.7,
            up_attraction: 0.6,
            resolution: 3.0,
            randomness: 1.0,
        }
    }
}

impl TrunkParams {
    pub fn apply(&self, trunk: &mut TrunkFunction) {
        trunk.length = self.length;
        trunk.start_radius = self.start_radius;
        trunk.end_radius = self.end_radius;
        trunk.shape = self.shape;
        trunk.up_attraction = PropertyWrapper::constant(self.up_attraction);
        trunk.resolution = self.resolution;
        trunk.randomness = PropertyWrapper::constant(self.randomness);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchParams {
    pub start: f32,
    pub end: f32,
    pub resolution: f32,
    pub split_probability: f32,
    pub break_chance: f32,
    pub start_radius: f32,
    pub randomness: f32,
    pub length: f32,
    pub density: f32,
    pub start_angle: f32,
    pub gravity_strength: f32,
    pub up_attraction: f32,
    pub flatness: f32,
    pub stiffness: f32,
}

impl Default for BranchParams {
    fn default() -> Self {
        Self {
            start: 0.1,
            end: 0.95,
            resolution: 3.0,
            split_probability: 0.5,
            break_chance: 0.02,
            start_radius: 0.4,
            randomness: 0.5,
            length: 9.0,
            density: 2.0,
            start_angle: 45.0,
            gravity_strength: 10.0,
            up_attraction: 0.25,
            flatness: 0.5,
            stiffness: 0.1,
        }
    }
}

impl BranchParams {
    /// Draw the branch parameters of the `RANDOM` preset
    pub fn random(seed: i32) -> Self {
        let mut rng = SimpleRng::from_seed(seed);
        Self {
            length: randint(&mut rng, 5, 15),
            density: 0.4 + randint(&mut rng, 0, 8) / 10.0,
            start_angle: randint(&mut rng, 30, 80),
            gravity_strength: randint(&mut rng, 5, 20),
            up_attraction: 0.1 + randint(&mut rng, 0, 5) / 10.0,
            flatness: randint(&mut rng, 1, 5) / 10.0,
            stiffness: 0.05 + randint(&mut rng, 0, 3) / 10.0,
            ..Self::default()
        }
    }

    pub fn apply(&self, branches: &mut BranchFunction) {
        branches.distribution.start = self.start;
        branches.distribution.end = self.end;
        branches.distribution.density = self.density;
        branches.resolution = self.resolution;
        branches.split.probability = self.split_probability;
        branches.break_chance = self.break_chance;
        branches.start_radius = PropertyWrapper::constant(self.start_radius);
        branches.randomness = PropertyWrapper::constant(self.randomness);
        branches.length = PropertyWrapper::constant(self.length);
        branches.start_angle = PropertyWrapper::constant(self.start_angle);
        branches.gravity.strength = self.gravity_strength;
        branches.gravity.up_attraction = self.up_attraction;
        branches.gravity.stiffness = self.stiffness;
        branches.flatness = self.flatness;
    }
}

/// Uniform integer in `[min, max]`, as a float
fn randint(rng: &mut SimpleRng, min: u32, max: u32) -> f32 {
    (min + rng.next_u32() % (max - min + 1)) as f32
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreePreset {
    pub name: String,
    pub label: String,
    pub description: String,
    #[serde(default)]
    pub trunk: TrunkParams,
    #[serde(default)]
    pub branches: BranchParams,
}

impl TreePreset {
    fn new(name: &str, label: &str, description: &str, trunk: TrunkParams, branches: BranchParams) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            description: description.to_string(),
            trunk,
            branches,
        }
    }

    pub fn oak() -> Self {
        Self::new(
            "OAK",
            "Oak",
            "Broad spreading tree with thick trunk",
            TrunkParams {
                length: 7.0,
                start_radius: 0.5,
                end_radius: 0.15,
                shape: 0.5,
                up_attraction: 0.4,
                ..TrunkParams::default()
            },
            BranchParams {
                start: 0.0,
                length: 10.0,
                density: 0.6,
                start_angle: 70.0,
                gravity_strength: 18.0,
                up_attraction: 0.2,
                flatness: 0.4,
                stiffness: 0.12,
                ..BranchParams::default()
            },
        )
    }

    pub fn pine() -> Self {
        Self::new(
            "PINE",
            "Pine",
            "Tall conifer with upward branches",
            TrunkParams {
                length: 18.0,
                start_radius: 0.25,
                end_radius: 0.03,
                shape: 0.9,
                up_attraction: 0.8,
                ..TrunkParams::default()
            },
            BranchParams {
                length: 6.0,
                density: 1.0,
                start_angle: 80.0,
                gravity_strength: 2.0,
                up_attraction: 0.8,
                flatness: 0.1,
                stiffness: 0.3,
                ..BranchParams::default()
            },
        )
    }

    pub fn willow() -> Self {
        Self::new(
            "WILLOW",
            "Willow",
            "Drooping branches with weeping form",
            TrunkParams {
                length: 10.0,
                start_radius: 0.35,
                end_radius: 0.08,
                shape: 0.6,
                up_attraction: 0.5,
                ..TrunkParams::default()
            },
            BranchParams {
                length: 15.0,
                density: 0.6,
                start_angle: 45.0,
                gravity_strength: 30.0,
                up_attraction: -0.2,
                flatness: 0.2,
                stiffness: 0.02,
                ..BranchParams::default()
            },
        )
    }

    /// Default trunk with branch parameters drawn from `seed`
    pub fn random(seed: i32) -> Self {
        Self::new(
            "RANDOM",
            "Random",
            "Random tree with varied parameters",
            TrunkParams::default(),
            BranchParams::random(seed),
        )
    }

    /// Look up a preset by name, ignoring ASCII case. `seed` only matters for `RANDOM`.
    pub fn from_name(name: &str, seed: i32) -> Result<Self> {
        match name.to_ascii_uppercase().as_str() {
            "OAK" => Ok(Self::oak()),
            "PINE" => Ok(Self::pine()),
            "WILLOW" => Ok(Self::willow()),
            "RANDOM" => Ok(Self::random(seed)),
            _ => Err(Error::UnknownPreset(name.to_string())),
        }
    }

    pub fn trunk_function(&self, seed: i32) -> TrunkFunction {
        let mut trunk = TrunkFunction { seed, ..Default::default() };
        self.trunk.apply(&mut trunk);
        trunk
    }

    pub fn branch_function(&self, seed: i32) -> BranchFunction {
        let mut branches = BranchFunction { seed, ..Default::default() };
        self.branches.apply(&mut branches);
        branches
    }

    /// Trunk + branches function tree seeded with `seed`, not yet executed
    pub fn build_tree(&self, seed: i32) -> Tree {
        let mut trunk = self.trunk_function(seed);
        trunk.add_child(self.branch_function(seed));

        let mut tree = Tree::new();
        tree.set_trunk_function(trunk);
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        for name in TREE_PRESET_NAMES {
            assert_eq!(TreePreset::from_name(name, 1).unwrap().name, name);
        }
        assert_eq!(TreePreset::from_name("oak", 1).unwrap(), TreePreset::oak());
        assert!(matches!(TreePreset::from_name("baobab", 1), Err(Error::UnknownPreset(_))));
    }

    #[test]
    fn test_defaults_fill_unset_values() {
        let oak = TreePreset::oak();
        assert_eq!(oak.trunk.resolution, 3.0);
        assert_eq!(oak.trunk.randomness, 1.0);
        assert_eq!(oak.branches.end, 0.95);
        assert_eq!(oak.branches.start, 0.0);
        assert_eq!(TreePreset::pine().branches.start, 0.1);
    }

    #[test]
    fn test_apply_to_functions() {
        let pine = TreePreset::pine();
        let mut trunk = TrunkFunction::default();
        pine.trunk.apply(&mut trunk);
        assert_eq!(trunk.length, 18.0);
        assert_eq!(trunk.shape, 0.9);

        let mut branches = BranchFunction::default();
        pine.branches.apply(&mut branches);
        let mut rng = SimpleRng::new(0);
        assert_eq!(branches.start_angle.evaluate(0.5, &mut rng), 80.0);
        assert_eq!(branches.length.evaluate(0.5, &mut rng), 6.0);
        assert_eq!(branches.gravity.stiffness, 0.3);
        assert_eq!(branches.distribution.density, 1.0);
    }

    #[test]
    fn test_random_ranges() {
        for seed in 0..50 {
            let p = BranchParams::random(seed);
            assert!((5.0..=15.0).contains(&p.length));
            assert!((0.4..=1.2001).contains(&p.density));
            assert!((30.0..=80.0).contains(&p.start_angle));
            assert!((5.0..=20.0).contains(&p.gravity_strength));
            assert!((0.1..=0.6001).contains(&p.up_attraction));
            assert!((0.1..=0.5001).contains(&p.flatness));
            assert!((0.05..=0.3501).contains(&p.stiffness));
            assert_eq!(p.length.fract(), 0.0);
        }
        assert_eq!(TreePreset::random(3), TreePreset::random(3));
        assert_eq!(TreePreset::random(3).trunk, TrunkParams::default());
    }

    #[test]
    fn test_build_tree() {
        let mut tree = TreePreset::willow().build_tree(7);
        tree.execute_functions().unwrap();
        assert_eq!(tree.skeleton().stems().len(), 1);
        assert!(tree.skeleton().node_count() > 30);
    }

    #[test]
    fn test_serde_round_trip() {
        let preset = TreePreset::oak();
        let json = serde_json::to_string_pretty(&preset).unwrap();
        let back: TreePreset = serde_json::from_str(&json).unwrap();
        assert_eq!(back, preset);

        let partial: TreePreset =
            serde_json::from_str(r#"{"name":"X","label":"X","description":"","trunk":{"length":3.0}}"#).unwrap();
        assert_eq!(partial.trunk.length, 3.0);
        assert_eq!(partial.trunk.start_radius, 0.3);
        assert_eq!(partial.branches, BranchParams::default());
    }
}
