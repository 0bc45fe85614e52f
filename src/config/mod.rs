//! Generation settings shared by the engine handle and the command line tool

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::types::Result;

/// Settings for one tree (and optional leaf) generation run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Seed handed to every shape function
    pub seed: i32,
    /// Tree preset name: OAK, PINE, WILLOW or RANDOM
    pub preset: String,
    /// Vertices per tube ring (at least 3)
    pub radial_resolution: usize,
    /// Axial smoothing passes over ring centers
    pub smooth_iterations: usize,
    /// Growth iterations run on top of the branches, 0 disables growth
    pub growth_iterations: u32,
    /// Leaf preset to generate alongside the tree
    pub leaf_preset: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            preset: "OAK".to_string(),
            radial_resolution: 8,
            smooth_iterations: 2,
            growth_iterations: 0,
            leaf_preset: None,
        }
    }
}

impl GenerationConfig {
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Missing fields take their default value
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::Error;

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = GenerationConfig {
            seed: -3,
            preset: "PINE".to_string(),
            radial_resolution: 12,
            smooth_iterations: 0,
            growth_iterations: 2,
            leaf_preset: Some("Birch".to_string()),
        };
        config.save(&path).unwrap();
        assert_eq!(GenerationConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "seed": 7 }"#).unwrap();
        let config = GenerationConfig::load(&path).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.preset, "OAK");
        assert_eq!(config.radial_resolution, 8);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = GenerationConfig::load(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(Error::Io(_))));

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(GenerationConfig::load(&path), Err(Error::Config(_))));
    }
}
