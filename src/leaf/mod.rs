//! Leaf generation: parametric blade meshes, venation and LOD proxies

pub mod contour;
pub mod lod;
pub mod presets;
pub mod shape;
pub mod triangulate;
pub mod venation;

pub use lod::LeafLODGenerator;
pub use presets::{LeafPreset, MarginType, VenationType, get_leaf_preset, get_leaf_preset_names};
pub use shape::LeafShapeGenerator;
pub use venation::{SpatialHash2D, VeinNode, VenationGenerator};
