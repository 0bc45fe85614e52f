//! Leaf species presets

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::leaf::LeafShapeGenerator;

/// Shape of the leaf edge
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarginType {
    #[default]
    Entire,
    /// Asymmetric teeth leaning towards the tip
    Serrate,
    /// Symmetric triangular teeth
    Dentate,
    /// Rounded scallops
    Crenate,
    Lobed,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VenationType {
    /// Tree-like veins
    #[default]
    Open,
    /// Veins reconnect into loops
    Closed,
}

/// Named parameter set for [`LeafShapeGenerator`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeafPreset {
    pub name: Cow<'static, str>,
    pub m: f32,
    pub a: f32,
    pub b: f32,
    pub n1: f32,
    pub n2: f32,
    pub n3: f32,
    pub aspect_ratio: f32,
    pub margin_type: MarginType,
    pub tooth_count: u32,
    pub tooth_depth: f32,
    pub tooth_sharpness: f32,
    pub enable_venation: bool,
    pub venation_type: VenationType,
    pub vein_density: f32,
    pub kill_distance: f32,
    pub midrib_curvature: f32,
    pub cross_curvature: f32,
    pub edge_curl: f32,
}

impl LeafPreset {
    /// Copy the preset parameters into `generator`, leaving the others untouched
    pub fn apply(&self, generator: &mut LeafShapeGenerator) {
        generator.m = self.m;
        generator.a = self.a;
        generator.b = self.b;
        generator.n1 = self.n1;
        generator.n2 = self.n2;
        generator.n3 = self.n3;
        generator.aspect_ratio = self.aspect_ratio;
        generator.margin_type = self.margin_type;
        generator.tooth_count = self.tooth_count;
        generator.tooth_depth = self.tooth_depth;
        generator.tooth_sharpness = self.tooth_sharpness;
        generator.enable_venation = self.enable_venation;
        generator.venation_type = self.venation_type;
        generator.vein_density = self.vein_density;
        generator.kill_distance = self.kill_distance;
        generator.midrib_curvature = self.midrib_curvature;
        generator.cross_curvature = self.cross_curvature;
        generator.edge_curl = self.edge_curl;
    }
}

#[allow(clippy::too_many_arguments)]
const fn preset(
    name: &'static str,
    shape: [f32; 7],
    margin_type: MarginType,
    tooth_count: u32,
    tooth_depth: f32,
    enable_venation: bool,
    vein_density: f32,
    kill_distance: f32,
) -> LeafPreset {
    LeafPreset {
        name: Cow::Borrowed(name),
        m: shape[0],
        a: shape[1],
        b: shape[2],
        n1: shape[3],
        n2: shape[4],
        n3: shape[5],
        aspect_ratio: shape[6],
        margin_type,
        tooth_count,
        tooth_depth,
        tooth_sharpness: 0.5,
        enable_venation,
        venation_type: VenationType::Open,
        vein_density,
        kill_distance,
        midrib_curvature: 0.0,
        cross_curvature: 0.0,
        edge_curl: 0.0,
    }
}

static LEAF_PRESETS: [LeafPreset; 5] = [
    preset("Oak", [7.0, 1.0, 1.0, 2.0, 4.0, 4.0, 0.7], MarginType::Lobed, 7, 0.3, true, 800.0, 0.03),
    preset("Maple", [5.0, 1.0, 1.0, 1.5, 3.0, 3.0, 0.95], MarginType::Lobed, 5, 0.5, true, 1000.0, 0.025),
    preset("Birch", [2.0, 1.0, 0.6, 2.5, 8.0, 8.0, 0.6], MarginType::Serrate, 24, 0.05, true, 600.0, 0.03),
    preset("Willow", [2.0, 1.0, 0.3, 3.0, 10.0, 10.0, 0.2], MarginType::Entire, 0, 0.0, true, 400.0, 0.04),
    preset("Pine", [2.0, 1.0, 0.05, 4.0, 20.0, 20.0, 0.05], MarginType::Entire, 0, 0.0, false, 0.0, 0.0),
];

pub fn get_leaf_preset_names() -> Vec<&'static str> {
    LEAF_PRESETS.iter().map(|p| &*p.name).collect()
}

/// Look up a preset by name, ignoring ASCII case
pub fn get_leaf_preset(name: &str) -> Option<&'static LeafPreset> {
    LEAF_PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}
