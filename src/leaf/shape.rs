//! Leaf blade generator
//!
//! Pipeline: superformula outline, margin teeth, ear clipping, planar UVs,
//! optional venation and finally an out-of-plane deformation.

use rayon::prelude::*;

use crate::core::types::{Vec2, Vec3};
use crate::leaf::contour::{MAX_CONTOUR_RESOLUTION, distance_to_contour};
use crate::leaf::presets::{MarginType, VenationType};
use crate::leaf::triangulate::triangulate;
use crate::leaf::venation::VenationGenerator;
use crate::math::Rect;
use crate::mesh::{Mesh, attributes};

const MIN_N1: f32 = 0.001;
const MIN_SCALE: f32 = 0.001;
const MAX_TOOTH_DEPTH: f32 = 5.0;
const MAX_TOOTH_COUNT: u32 = 1000;
const MIN_CONTOUR_RESOLUTION: usize = 8;

const MIDRIB_SCALE: f32 = 0.5;
const CROSS_SCALE: f32 = 0.3;
const EDGE_CURL_SCALE: f32 = 0.2;
const VEIN_DISPLACEMENT_SCALE: f32 = 0.05;
/// Edge curl band, as a fraction of the leaf width
const EDGE_BAND: f32 = 0.15;
/// Vein falloff distance, as a fraction of the leaf width
const VEIN_FALLOFF: f32 = 0.05;

/// Parametric leaf shape. Assign the fields, then call [`generate`](Self::generate).
#[derive(Clone, Debug, PartialEq)]
pub struct LeafShapeGenerator {
    // Superformula
    pub m: f32,
    pub a: f32,
    pub b: f32,
    pub n1: f32,
    pub n2: f32,
    pub n3: f32,
    /// Width over length
    pub aspect_ratio: f32,

    // Margin
    pub margin_type: MarginType,
    pub tooth_count: u32,
    pub tooth_depth: f32,
    pub tooth_sharpness: f32,
    /// Non-zero jitters each tooth depth
    pub asymmetry_seed: i32,

    // Venation
    pub enable_venation: bool,
    pub venation_type: VenationType,
    pub vein_density: f32,
    pub kill_distance: f32,
    pub attraction_distance: f32,
    pub growth_step_size: f32,

    // Deformation
    pub midrib_curvature: f32,
    pub cross_curvature: f32,
    pub vein_displacement: f32,
    pub edge_curl: f32,

    pub contour_resolution: usize,
    pub seed: i32,
}

impl Default for LeafShapeGenerator {
    fn default() -> Self {
        Self {
            m: 2.0,
            a: 1.0,
            b: 1.0,
            n1: 3.0,
            n2: 3.0,
            n3: 3.0,
            aspect_ratio: 0.5,
            margin_type: MarginType::Entire,
            tooth_count: 0,
            tooth_depth: 0.1,
            tooth_sharpness: 0.5,
            asymmetry_seed: 0,
            enable_venation: false,
            venation_type: VenationType::Open,
            vein_density: 800.0,
            kill_distance: 0.03,
            attraction_distance: 0.08,
            growth_step_size: 0.01,
            midrib_curvature: 0.0,
            cross_curvature: 0.0,
            vein_displacement: 0.0,
            edge_curl: 0.0,
            contour_resolution: 64,
            seed: 42,
        }
    }
}

fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

/// Keep `value` at least `min` away from zero, preserving its sign
fn away_from_zero(value: f32, min: f32) -> f32 {
    if value.abs() >= min {
        value
    } else if value < 0.0 {
        -min
    } else {
        min
    }
}

impl LeafShapeGenerator {
    /// Copy with every parameter forced into its valid range
    fn sanitized(&self) -> Self {
        let d = Self::default();
        Self {
            m: finite_or(self.m, d.m),
            a: away_from_zero(finite_or(self.a, d.a), MIN_SCALE).abs(),
            b: away_from_zero(finite_or(self.b, d.b), MIN_SCALE).abs(),
            n1: away_from_zero(finite_or(self.n1, d.n1), MIN_N1),
            n2: finite_or(self.n2, d.n2),
            n3: finite_or(self.n3, d.n3),
            aspect_ratio: finite_or(self.aspect_ratio, d.aspect_ratio).max(0.0),
            margin_type: self.margin_type,
            tooth_count: self.tooth_count.min(MAX_TOOTH_COUNT),
            tooth_depth: finite_or(self.tooth_depth, d.tooth_depth).clamp(0.0, MAX_TOOTH_DEPTH),
            tooth_sharpness: finite_or(self.tooth_sharpness, d.tooth_sharpness).clamp(0.01, 0.99),
            asymmetry_seed: self.asymmetry_seed,
            enable_venation: self.enable_venation,
            venation_type: self.venation_type,
            vein_density: finite_or(self.vein_density, d.vein_density).max(0.0),
            kill_distance: finite_or(self.kill_distance, d.kill_distance).max(0.0),
            attraction_distance: finite_or(self.attraction_distance, d.attraction_distance).max(0.0),
            growth_step_size: finite_or(self.growth_step_size, d.growth_step_size).max(0.0),
            midrib_curvature: finite_or(self.midrib_curvature, d.midrib_curvature),
            cross_curvature: finite_or(self.cross_curvature, d.cross_curvature),
            vein_displacement: finite_or(self.vein_displacement, d.vein_displacement),
            edge_curl: finite_or(self.edge_curl, d.edge_curl),
            contour_resolution: self.contour_resolution.clamp(MIN_CONTOUR_RESOLUTION, MAX_CONTOUR_RESOLUTION),
            seed: self.seed,
        }
    }

    fn venation_generator(&self) -> VenationGenerator {
        VenationGenerator {
            venation_type: self.venation_type,
            vein_density: self.vein_density,
            kill_distance: self.kill_distance,
            growth_step_size: self.growth_step_size,
            attraction_distance: self.attraction_distance,
            seed: self.seed,
            ..Default::default()
        }
    }

    /// Build the leaf mesh in the XY plane, base at the bottom, tip towards +Y
    pub fn generate(&self) -> Mesh {
        let params = self.sanitized();

        let contour = params.apply_margin(params.sample_contour());
        let mut mesh = triangulate(&contour);
        if mesh.vertices.is_empty() {
            return mesh;
        }

        let points: Vec<Vec2> = mesh.vertices.iter().map(|v| v.truncate()).collect();
        let Some(bounds) = Rect::from_points(&points) else {
            return mesh;
        };
        let size = Vec2::new(bounds.width(), bounds.height()).max(Vec2::splat(1e-6));

        mesh.uvs = points
            .iter()
            .map(|&p| ((p - bounds.min) / size).clamp(Vec2::ZERO, Vec2::ONE))
            .collect();
        mesh.uv_loops = mesh.polygons.clone();

        let vein_distances = if params.enable_venation {
            let generator = params.venation_generator();
            let veins = generator.generate_veins(&contour);
            let distances = generator.compute_vein_distances(&points, &veins);
            // One distance per mesh vertex
            mesh.insert_float_attribute(attributes::VEIN_DISTANCE, distances.clone());
            Some(distances)
        } else {
            None
        };

        params.deform(&mut mesh, &contour, &bounds, vein_distances.as_deref());

        log::debug!(
            "Leaf: {} contour points, {} vertices, {} triangles",
            contour.len(),
            mesh.vertex_count(),
            mesh.polygon_count()
        );
        mesh
    }

    /// Bend the flat blade along the midrib, across the blade and at the edges
    fn deform(&self, mesh: &mut Mesh, contour: &[Vec2], bounds: &Rect, vein_distances: Option<&[f32]>) {
        let has_deformation = self.midrib_curvature != 0.0
            || self.cross_curvature != 0.0
            || self.edge_curl != 0.0
            || (self.vein_displacement != 0.0 && vein_distances.is_some());
        if !has_deformation {
            return;
        }

        let width = bounds.width().max(1e-6);
        let height = bounds.height().max(1e-6);
        let center_x = bounds.center().x;
        let edge_band = EDGE_BAND * width;
        let vein_falloff = VEIN_FALLOFF * width;

        let edge_distances: Vec<f32> = if self.edge_curl != 0.0 {
            mesh.vertices
                .par_iter()
                .map(|v| distance_to_contour(v.truncate(), contour))
                .collect()
        } else {
            Vec::new()
        };

        for (i, vertex) in mesh.vertices.iter_mut().enumerate() {
            let nx = (vertex.x - center_x) / (width * 0.5);
            let ny = (vertex.y - bounds.min.y) / height;

            let mut z = self.midrib_curvature * ny * ny * MIDRIB_SCALE
                + self.cross_curvature * nx * nx * CROSS_SCALE;
            if let Some(&edge_distance) = edge_distances.get(i) {
                let edge = 1.0 - (edge_distance / edge_band).clamp(0.0, 1.0);
                z += self.edge_curl * edge * edge * EDGE_CURL_SCALE;
            }
            if let Some(&vein_distance) = vein_distances.and_then(|d| d.get(i)) {
                z += self.vein_displacement * (-vein_distance / vein_falloff).exp() * VEIN_DISPLACEMENT_SCALE;
            }
            *vertex = Vec3::new(vertex.x, vertex.y, finite_or(z, 0.0));
        }
    }
}
