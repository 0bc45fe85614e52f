//! Pivot Painter 2.0 data packing
//!
//! Turns the per-vertex branch attributes written by the mesher into the
//! layouts wind shaders expect: Unity vertex colors, or two square float
//! RGBA textures indexed by stem id for Unreal. Pixel buffers only, image
//! encoding is left to the caller.

use std::collections::HashSet;

use crate::core::error::Error;
use crate::core::types::{Result, Vec2, Vec3};
use crate::mesh::{Mesh, attributes};

/// Golden ratio conjugate, spreads consecutive stem ids over [0, 1)
pub const GOLDEN_RATIO_CONJUGATE: f32 = 0.618_033_988_75;

pub const DEFAULT_TEXTURE_SIZE: u32 = 1024;

const DIRECTION_EPSILON: f32 = 1e-6;

pub fn stem_id_hash(stem_id: f32) -> f32 {
    (stem_id * GOLDEN_RATIO_CONJUGATE).rem_euclid(1.0)
}

/// Divide by the largest value, never by less than `min_divisor`
pub fn normalize_with_minimum(values: &[f32], min_divisor: f32) -> Vec<f32> {
    let max = values.iter().copied().fold(min_divisor, f32::max);
    values.iter().map(|v| v / max).collect()
}

pub fn stem_id_to_pixel_coords(stem_id: u32, texture_size: u32) -> (u32, u32) {
    let size = texture_size.max(1);
    (stem_id % size, stem_id / size)
}

/// Center of the stem's pixel in UV space
pub fn stem_id_to_uv_coords(stem_id: u32, texture_size: u32) -> Vec2 {
    let size = texture_size.max(1);
    let (px, py) = stem_id_to_pixel_coords(stem_id, size);
    Vec2::new((px as f32 + 0.5) / size as f32, (py as f32 + 0.5) / size as f32)
}

/// Unit direction, `+Z` for (near) zero input
pub fn normalize_direction(direction: Vec3) -> Vec3 {
    let length = direction.length();
    if length > DIRECTION_EPSILON {
        (direction / length).clamp(Vec3::splat(-1.0), Vec3::splat(1.0))
    } else {
        Vec3::Z
    }
}

fn float_attribute<'a>(mesh: &'a Mesh, name: &str) -> Result<&'a [f32]> {
    mesh.get_float_attribute(name).ok_or_else(|| Error::MissingAttribute(name.to_string()))
}

fn vector3_attribute<'a>(mesh: &'a Mesh, name: &str) -> Result<&'a [Vec3]> {
    mesh.get_vector3_values(name).ok_or_else(|| Error::MissingAttribute(name.to_string()))
}

/// Unity vertex colors: R depth, G extent (both normalized), B stem hash, A 1
pub fn pack_unity_vertex_colors(mesh: &Mesh) -> Result<Vec<[f32; 4]>> {
    let stem_ids = float_attribute(mesh, attributes::STEM_ID)?;
    let depths = normalize_with_minimum(float_attribute(mesh, attributes::HIERARCHY_DEPTH)?, 1.0);
    let extents = normalize_with_minimum(float_attribute(mesh, attributes::BRANCH_EXTENT)?, 1.0);

    Ok(stem_ids
        .iter()
        .zip(depths.iter().zip(&extents))
        .map(|(&id, (&depth, &extent))| [depth, extent, stem_id_hash(id), 1.0])
        .collect())
}

/// Square RGBA float image, row-major
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    pub size: u32,
    pub pixels: Vec<[f32; 4]>,
}

impl PixelBuffer {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            pixels: vec![[0.0; 4]; size as usize * size as usize],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.size || y >= self.size {
            return None;
        }
        self.pixels.get((y * self.size + x) as usize).copied()
    }

    /// Flat RGBA floats
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Write one pixel per stem from the first vertex of that stem.
    /// Stems that do not fit in the texture are dropped.
    fn fill_per_stem(&mut self, stem_ids: &[f32], mut value: impl FnMut(usize) -> [f32; 4]) {
        let mut seen = HashSet::new();
        for (vertex, &id) in stem_ids.iter().enumerate() {
            let id = id.max(0.0) as u32;
            if !seen.insert(id) {
                continue;
            }
            let (px, py) = stem_id_to_pixel_coords(id, self.size);
            if py < self.size {
                self.pixels[(py * self.size + px) as usize] = value(vertex);
            }
        }
    }
}

/// `PivotPos_Index`: RGB branch pivot position, A hierarchy depth
pub fn create_pivot_index_pixels(mesh: &Mesh, texture_size: u32) -> Result<PixelBuffer> {
    let stem_ids = float_attribute(mesh, attributes::STEM_ID)?;
    let pivots = vector3_attribute(mesh, attributes::PIVOT_POSITION)?;
    let depths = float_attribute(mesh, attributes::HIERARCHY_DEPTH)?;

    let mut buffer = PixelBuffer::new(texture_size);
    buffer.fill_per_stem(stem_ids, |i| {
        let p = pivots[i];
        [p.x, p.y, p.z, depths[i]]
    });
    Ok(buffer)
}

/// `XVector_Extent`: RGB normalized branch direction, A branch extent
pub fn create_xvector_extent_pixels(mesh: &Mesh, texture_size: u32) -> Result<PixelBuffer> {
    let stem_ids = float_attribute(mesh, attributes::STEM_ID)?;
    let directions = vector3_attribute(mesh, attributes::DIRECTION)?;
    let extents = float_attribute(mesh, attributes::BRANCH_EXTENT)?;

    let mut buffer = PixelBuffer::new(texture_size);
    buffer.fill_per_stem(stem_ids, |i| {
        let d = normalize_direction(directions[i]);
        [d.x, d.y, d.z, extents[i]]
    });
    Ok(buffer)
}

/// Per-vertex texture lookup coordinates of each vertex's stem
pub fn stem_uvs(mesh: &Mesh, texture_size: u32) -> Result<Vec<Vec2>> {
    let stem_ids = float_attribute(mesh, attributes::STEM_ID)?;
    Ok(stem_ids
        .iter()
        .map(|&id| stem_id_to_uv_coords(id.max(0.0) as u32, texture_size))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch_mesh() -> Mesh {
        let mut mesh = Mesh::new();
        mesh.vertices = vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z];
        mesh.set_float_attribute(attributes::STEM_ID, vec![0.0, 0.0, 1.0, 5.0]).unwrap();
        mesh.set_float_attribute(attributes::HIERARCHY_DEPTH, vec![0.0, 0.0, 1.0, 2.0]).unwrap();
        mesh.set_float_attribute(attributes::BRANCH_EXTENT, vec![0.0, 0.5, 0.25, 1.0]).unwrap();
        mesh.set_vector3_attribute(
            attributes::PIVOT_POSITION,
            vec![Vec3::ZERO, Vec3::ZERO, Vec3::new(0.0, 0.0, 3.0), Vec3::new(1.0, 2.0, 4.0)],
        )
        .unwrap();
        mesh.set_vector3_attribute(
            attributes::DIRECTION,
            vec![Vec3::new(0.0, 0.0, 2.0), Vec3::Z, Vec3::ZERO, Vec3::new(3.0, 0.0, 4.0)],
        )
        .unwrap();
        mesh
    }

    #[test]
    fn test_stem_id_hash() {
        assert_eq!(stem_id_hash(0.0), 0.0);
        assert!((stem_id_hash(1.0) - 0.618_034).abs() < 1e-5);
        for id in 0..100 {
            let h = stem_id_hash(id as f32);
            assert!((0.0..1.0).contains(&h));
        }
    }

    #[test]
    fn test_normalize_with_minimum() {
        assert_eq!(normalize_with_minimum(&[0.5, 0.25], 1.0), vec![0.5, 0.25]);
        assert_eq!(normalize_with_minimum(&[1.0, 4.0], 1.0), vec![0.25, 1.0]);
        assert!(normalize_with_minimum(&[], 1.0).is_empty());
    }

    #[test]
    fn test_pixel_and_uv_coords() {
        assert_eq!(stem_id_to_pixel_coords(5, 4), (1, 1));
        assert_eq!(stem_id_to_uv_coords(5, 4), Vec2::new(0.375, 0.375));
        assert_eq!(stem_id_to_uv_coords(0, 1024), Vec2::splat(0.5 / 1024.0));
    }

    #[test]
    fn test_normalize_direction() {
        assert_eq!(normalize_direction(Vec3::ZERO), Vec3::Z);
        assert!((normalize_direction(Vec3::new(3.0, 0.0, 4.0)) - Vec3::new(0.6, 0.0, 0.8)).length() < 1e-6);
    }

    #[test]
    fn test_unity_colors() {
        let colors = pack_unity_vertex_colors(&branch_mesh()).unwrap();
        assert_eq!(colors.len(), 4);
        assert_eq!(colors[3], [1.0, 1.0, stem_id_hash(5.0), 1.0]);
        assert_eq!(colors[1][1], 0.5);
        assert!(colors.iter().all(|c| c[3] == 1.0));
    }

    #[test]
    fn test_missing_attribute() {
        let mesh = Mesh::new();
        assert!(matches!(pack_unity_vertex_colors(&mesh), Err(Error::MissingAttribute(_))));
    }

    #[test]
    fn test_pivot_index_pixels() {
        let buffer = create_pivot_index_pixels(&branch_mesh(), 4).unwrap();
        assert_eq!(buffer.pixels.len(), 16);
        assert_eq!(buffer.as_floats().len(), 64);
        assert_eq!(buffer.pixel(1, 0), Some([0.0, 0.0, 3.0, 1.0]));
        assert_eq!(buffer.pixel(1, 1), Some([1.0, 2.0, 4.0, 2.0]));
        assert_eq!(buffer.pixel(2, 0), Some([0.0; 4]));
    }

    #[test]
    fn test_xvector_first_vertex_wins() {
        let buffer = create_xvector_extent_pixels(&branch_mesh(), 4).unwrap();
        assert_eq!(buffer.pixel(0, 0), Some([0.0, 0.0, 1.0, 0.0]));
        assert_eq!(buffer.pixel(1, 0), Some([0.0, 0.0, 1.0, 0.25]));
        let p = buffer.pixel(1, 1).unwrap();
        assert!((p[0] - 0.6).abs() < 1e-6 && (p[2] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_stems_outside_texture_are_dropped() {
        let buffer = create_pivot_index_pixels(&branch_mesh(), 2).unwrap();
        assert_eq!(buffer.pixels.len(), 4);
        assert_eq!(buffer.pixel(1, 0), Some([0.0, 0.0, 3.0, 1.0]));
    }

    #[test]
    fn test_stem_uvs() {
        let uvs = stem_uvs(&branch_mesh(), 4).unwrap();
        assert_eq!(uvs.len(), 4);
        assert_eq!(uvs[0], uvs[1]);
        assert_eq!(uvs[3], Vec2::new(0.375, 0.375));
    }
}
