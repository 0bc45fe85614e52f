//! Polygon mesh produced by the tree mesher and the leaf generators
//!
//! Polygons are always quads. Triangles are stored as degenerate quads whose
//! last index repeats the third one.

pub mod obj;

use std::collections::BTreeMap;

use crate::core::error::Error;
use crate::core::types::{Result, Vec2, Vec3};
use crate::math::Aabb;

/// Names of the per-vertex attributes written by the generators
pub mod attributes {
    pub const RADIUS: &str = "radius";
    pub const DIRECTION: &str = "direction";
    pub const STEM_ID: &str = "stem_id";
    pub const HIERARCHY_DEPTH: &str = "hierarchy_depth";
    pub const BRANCH_EXTENT: &str = "branch_extent";
    pub const PIVOT_POSITION: &str = "pivot_position";
    pub const PHYLLOTAXIS_ANGLE: &str = "phyllotaxis_angle";
    pub const SMOOTH_AMOUNT: &str = "smooth_amount";
    pub const VEIN_DISTANCE: &str = "vein_distance";
}

/// Per-vertex attribute values
#[derive(Clone, Debug, PartialEq)]
pub enum Attribute {
    Float(Vec<f32>),
    Vector3(Vec<Vec3>),
}

impl Attribute {
    pub fn len(&self) -> usize {
        match self {
            Attribute::Float(values) => values.len(),
            Attribute::Vector3(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vec3>,
    pub polygons: Vec<[u32; 4]>,
    pub uvs: Vec<Vec2>,
    /// UV indices of each polygon corner, parallel to `polygons`
    pub uv_loops: Vec<[u32; 4]>,
    attributes: BTreeMap<String, Attribute>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Add a triangle as a degenerate quad, with UV indices matching the vertex indices
    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.polygons.push([a, b, c, c]);
        self.uv_loops.push([a, b, c, c]);
    }

    /// Vertex positions, 3 floats per vertex
    pub fn get_vertices(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Polygon vertex indices, 4 per polygon
    pub fn get_polygons(&self) -> &[u32] {
        bytemuck::cast_slice(&self.polygons)
    }

    /// UV coordinates, 2 floats per UV
    pub fn get_uvs(&self) -> &[f32] {
        bytemuck::cast_slice(&self.uvs)
    }

    /// UV indices, 4 per polygon
    pub fn get_uv_loops(&self) -> &[u32] {
        bytemuck::cast_slice(&self.uv_loops)
    }

    /// Set a float attribute; it must have one value per vertex
    pub fn set_float_attribute(&mut self, name: &str, values: Vec<f32>) -> Result<()> {
        self.set_attribute(name, Attribute::Float(values))
    }

    /// Store values whose length matches the vertex count by construction
    pub(crate) fn insert_float_attribute(&mut self, name: &str, values: Vec<f32>) {
        debug_assert_eq!(values.len(), self.vertices.len());
        self.attributes.insert(name.to_string(), Attribute::Float(values));
    }

    /// Set a vector attribute; it must have one value per vertex
    pub fn set_vector3_attribute(&mut self, name: &str, values: Vec<Vec3>) -> Result<()> {
        self.set_attribute(name, Attribute::Vector3(values))
    }

    fn set_attribute(&mut self, name: &str, attribute: Attribute) -> Result<()> {
        if attribute.len() != self.vertices.len() {
            return Err(Error::AttributeLength {
                name: name.to_string(),
                expected: self.vertices.len(),
                actual: attribute.len(),
            });
        }
        self.attributes.insert(name.to_string(), attribute);
        Ok(())
    }

    pub fn has_float_attribute(&self, name: &str) -> bool {
        matches!(self.attributes.get(name), Some(Attribute::Float(_)))
    }

    pub fn has_vector3_attribute(&self, name: &str) -> bool {
        matches!(self.attributes.get(name), Some(Attribute::Vector3(_)))
    }

    pub fn get_float_attribute(&self, name: &str) -> Option<&[f32]> {
        match self.attributes.get(name) {
            Some(Attribute::Float(values)) => Some(values.as_slice()),
            _ => None,
        }
    }

    /// Vector attribute values, 3 floats per vertex
    pub fn get_vector3_attribute(&self, name: &str) -> Option<&[f32]> {
        match self.attributes.get(name) {
            Some(Attribute::Vector3(values)) => Some(bytemuck::cast_slice(values)),
            _ => None,
        }
    }

    pub fn get_vector3_values(&self, name: &str) -> Option<&[Vec3]> {
        match self.attributes.get(name) {
            Some(Attribute::Vector3(values)) => Some(values.as_slice()),
            _ => None,
        }
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<Attribute> {
        self.attributes.remove(name)
    }

    pub fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(&self.vertices)
    }

    /// True when every polygon and UV loop index is in range
    pub fn indices_valid(&self) -> bool {
        let vertex_count = self.vertices.len() as u32;
        let uv_count = self.uvs.len() as u32;
        self.uv_loops.len() == self.polygons.len()
            && self.polygons.iter().flatten().all(|&i| i < vertex_count)
            && self.uv_loops.iter().flatten().all(|&i| i < uv_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.vertices = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        mesh.uvs = vec![Vec2::ZERO, Vec2::X, Vec2::Y];
        mesh.add_triangle(0, 1, 2);
        mesh
    }

    #[test]
    fn test_flat_accessors() {
        let mesh = triangle();
        assert_eq!(mesh.get_vertices(), &[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(mesh.get_polygons(), &[0, 1, 2, 2]);
        assert_eq!(mesh.get_uvs().len(), 6);
        assert_eq!(mesh.get_uv_loops().len(), 4);
        assert!(mesh.indices_valid());
    }

    #[test]
    fn test_attribute_length_is_checked() {
        let mut mesh = triangle();
        let err = mesh.set_float_attribute(attributes::RADIUS, vec![1.0]).unwrap_err();
        assert!(matches!(err, Error::AttributeLength { expected: 3, actual: 1, .. }));
        assert!(!mesh.has_float_attribute(attributes::RADIUS));
    }

    #[test]
    fn test_attribute_kinds() {
        let mut mesh = triangle();
        mesh.set_float_attribute(attributes::RADIUS, vec![1.0, 2.0, 3.0]).unwrap();
        mesh.set_vector3_attribute(attributes::DIRECTION, vec![Vec3::Z; 3]).unwrap();

        assert!(mesh.has_float_attribute(attributes::RADIUS));
        assert!(!mesh.has_vector3_attribute(attributes::RADIUS));
        assert_eq!(mesh.get_float_attribute(attributes::RADIUS), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(mesh.get_vector3_attribute(attributes::DIRECTION).map(|v| v.len()), Some(9));
        assert_eq!(mesh.attribute_names().collect::<Vec<_>>(), vec!["direction", "radius"]);
    }

    #[test]
    fn test_invalid_indices() {
        let mut mesh = triangle();
        mesh.polygons.push([0, 1, 5, 5]);
        mesh.uv_loops.push([0, 1, 2, 2]);
        assert!(!mesh.indices_valid());
    }
}
