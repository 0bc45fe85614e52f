//! Leaf levels of detail: flat cards, billboard clouds and impostor views

use std::f32::consts::PI;

use crate::core::types::{Vec2, Vec3};
use crate::math::Aabb;
use crate::math::geometry::GOLDEN_ANGLE;
use crate::mesh::Mesh;

/// Smallest half size of a billboard cloud plane
const MIN_BILLBOARD_HALF_SIZE: f32 = 0.5;

pub struct LeafLODGenerator;

impl LeafLODGenerator {
    /// Single quad covering the XY extent of `source` at its mid height
    pub fn generate_card(source: &Mesh) -> Mesh {
        let bounds = source.bounding_box().unwrap_or_else(|| {
            log::warn!("Leaf card requested for an empty mesh, emitting a zero-sized card");
            Aabb::new(Vec3::ZERO, Vec3::ZERO)
        });
        let z = bounds.center().z;

        let mut card = Mesh::new();
        card.vertices = vec![
            Vec3::new(bounds.min.x, bounds.min.y, z),
            Vec3::new(bounds.max.x, bounds.min.y, z),
            Vec3::new(bounds.max.x, bounds.max.y, z),
            Vec3::new(bounds.min.x, bounds.max.y, z),
        ];
        card.uvs = vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)];
        card.add_triangle(0, 1, 2);
        card.add_triangle(0, 2, 3);
        card
    }

    /// `num_planes` vertical quads through the centroid, rotated about +Z by `PI * i / num_planes`
    pub fn generate_billboard_cloud(positions: &[Vec3], num_planes: usize) -> Mesh {
        let mut mesh = Mesh::new();
        if num_planes == 0 {
            return mesh;
        }

        let center = if positions.is_empty() {
            Vec3::ZERO
        } else {
            positions.iter().copied().sum::<Vec3>() / positions.len() as f32
        };
        let radius = positions.iter().map(|p| p.distance(center)).fold(0.0, f32::max);
        let half = radius.max(MIN_BILLBOARD_HALF_SIZE);

        for i in 0..num_planes {
            let angle = PI * i as f32 / num_planes as f32;
            let axis = Vec3::new(angle.cos(), angle.sin(), 0.0) * half;
            let up = Vec3::Z * half;

            let base = mesh.vertices.len() as u32;
            mesh.vertices.extend([center - axis - up, center + axis - up, center + axis + up, center - axis + up]);
            mesh.uvs.extend([Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)]);
            mesh.add_triangle(base, base + 1, base + 2);
            mesh.add_triangle(base, base + 2, base + 3);
        }
        mesh
    }

    /// `resolution²` unit directions spread over the upper hemisphere
    pub fn get_impostor_view_directions(resolution: usize) -> Vec<Vec3> {
        let count = resolution * resolution;
        (0..count)
            .map(|i| {
                // Fibonacci spiral; z stays strictly above the horizon
                let z = 1.0 - (i as f32 + 0.5) / count as f32;
                let ring = (1.0 - z * z).max(0.0).sqrt();
                let phi = GOLDEN_ANGLE * i as f32;
                Vec3::new(ring * phi.cos(), ring * phi.sin(), z).normalize()
            })
            .collect()
    }
}
