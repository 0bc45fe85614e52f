//! Leaf outline: superformula sampling, margin teeth and polygon helpers

use std::f32::consts::TAU;

use crate::core::types::Vec2;
use crate::leaf::LeafShapeGenerator;
use crate::leaf::presets::MarginType;
use crate::math::SimpleRng;

/// Largest contour radius the superformula may produce
pub const MAX_RADIUS: f32 = 1e4;
/// Samples per tooth when a margin is active
pub const SAMPLES_PER_TOOTH: usize = 8;
pub const MAX_CONTOUR_RESOLUTION: usize = 4096;
/// Segments turning more than this (as a direction dot product) get a midpoint
const REFINE_DOT: f32 = 0.95;
const ASYMMETRY_RANGE: f32 = 0.3;

impl LeafShapeGenerator {
    /// Superformula radius at `theta`, always finite
    pub fn superformula_radius(&self, theta: f32) -> f32 {
        let ct = (self.m * theta / 4.0).cos();
        let st = (self.m * theta / 4.0).sin();
        let sum = (ct / self.a).abs().powf(self.n2) + (st / self.b).abs().powf(self.n3);
        if !(sum >= 1e-10) {
            return 1.0;
        }
        let r = sum.powf(-1.0 / self.n1);
        if r.is_nan() { 1.0 } else { r.min(MAX_RADIUS) }
    }

    fn contour_point(&self, theta: f32) -> Vec2 {
        let r = self.superformula_radius(theta);
        Vec2::new(r * theta.cos() * self.aspect_ratio, r * theta.sin())
    }

    pub(crate) fn has_margin(&self) -> bool {
        self.margin_type != MarginType::Entire && self.tooth_count > 0
    }

    /// Number of base samples around the outline
    pub(crate) fn effective_resolution(&self) -> usize {
        let mut resolution = self.contour_resolution;
        if self.has_margin() {
            resolution = resolution.max(self.tooth_count as usize * SAMPLES_PER_TOOTH);
        }
        resolution.clamp(8, MAX_CONTOUR_RESOLUTION)
    }

    /// Sample the outline counter-clockwise, refining sharp turns with midpoints
    pub(crate) fn sample_contour(&self) -> Vec<Vec2> {
        let resolution = self.effective_resolution();
        let points: Vec<Vec2> = (0..resolution)
            .map(|i| self.contour_point(TAU * i as f32 / resolution as f32))
            .collect();

        let mut refined = Vec::with_capacity(points.len() * 2);
        for i in 0..points.len() {
            let prev = points[(i + points.len() - 1) % points.len()];
            let next = points[(i + 1) % points.len()];
            refined.push(points[i]);

            let d1 = (points[i] - prev).normalize_or_zero();
            let d2 = (next - points[i]).normalize_or_zero();
            if d1.dot(d2) < REFINE_DOT {
                refined.push(self.contour_point(TAU * (i as f32 + 0.5) / resolution as f32));
            }
        }
        refined
    }

    /// Push every contour point outwards by the tooth profile at its angle
    pub(crate) fn apply_margin(&self, contour: Vec<Vec2>) -> Vec<Vec2> {
        if !self.has_margin() {
            return contour;
        }
        let mut rng = SimpleRng::from_seed(self.asymmetry_seed);
        let teeth = self.tooth_count as f32;
        let sharpness = self.tooth_sharpness;

        contour
            .into_iter()
            .map(|point| {
                let r = point.length();
                if r < 1e-10 {
                    return point;
                }
                let mut theta = point.y.atan2(point.x);
                if theta < 0.0 {
                    theta += TAU;
                }
                let t = theta * teeth / TAU;
                let frac = t - t.floor();
                let asymmetry = if self.asymmetry_seed != 0 {
                    rng.range(-ASYMMETRY_RANGE, ASYMMETRY_RANGE)
                } else {
                    0.0
                };
                let depth = self.tooth_depth * (1.0 + asymmetry);

                let profile = match self.margin_type {
                    MarginType::Entire => 0.0,
                    MarginType::Serrate => {
                        if frac < sharpness {
                            frac / sharpness
                        } else {
                            (1.0 - frac) / (1.0 - sharpness)
                        }
                    }
                    MarginType::Dentate => 1.0 - 2.0 * (frac - 0.5).abs(),
                    MarginType::Crenate => 0.5 * (1.0 + (TAU * frac).sin()),
                    MarginType::Lobed => 0.5 * (1.0 + (TAU * frac).cos()),
                };
                let new_r = r * (1.0 + depth * profile);
                Vec2::new(new_r * theta.cos(), new_r * theta.sin())
            })
            .collect()
    }
}

/// Twice the signed area of triangle `o, a, b`; positive when counter-clockwise
pub fn cross2d(o: Vec2, a: Vec2, b: Vec2) -> f32 {
    (a - o).perp_dot(b - o)
}

/// Signed polygon area, positive for counter-clockwise winding
pub fn signed_area(contour: &[Vec2]) -> f32 {
    let n = contour.len();
    (0..n)
        .map(|i| contour[i].perp_dot(contour[(i + 1) % n]))
        .sum::<f32>()
        * 0.5
}

/// Even-odd point in polygon test
pub fn point_in_contour(point: Vec2, contour: &[Vec2]) -> bool {
    let mut inside = false;
    let mut j = contour.len().wrapping_sub(1);
    for i in 0..contour.len() {
        let (pi, pj) = (contour[i], contour[j]);
        if (pi.y > point.y) != (pj.y > point.y) && point.x < (pj.x - pi.x) * (point.y - pi.y) / (pj.y - pi.y) + pi.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

pub fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-10 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// Distance from `p` to the closest edge of the closed polyline `contour`
pub fn distance_to_contour(p: Vec2, contour: &[Vec2]) -> f32 {
    let n = contour.len();
    (0..n)
        .map(|i| distance_to_segment(p, contour[i], contour[(i + 1) % n]))
        .fold(f32::MAX, f32::min)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Vec2> {
        vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(0.0, 1.0)]
    }

    #[test]
    fn test_circle_radius() {
        let generator = LeafShapeGenerator { m: 0.0, n1: 2.0, n2: 2.0, n3: 2.0, ..Default::default() };
        for i in 0..8 {
            assert!((generator.superformula_radius(i as f32) - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_radius_is_bounded() {
        let generator = LeafShapeGenerator { n1: 0.001, n2: 40.0, n3: 40.0, m: 13.0, ..Default::default() };
        for i in 0..100 {
            let r = generator.superformula_radius(i as f32 * 0.063);
            assert!(r.is_finite() && r <= MAX_RADIUS);
        }
    }

    #[test]
    fn test_effective_resolution() {
        let mut generator = LeafShapeGenerator { contour_resolution: 64, ..Default::default() };
        assert_eq!(generator.effective_resolution(), 64);
        generator.margin_type = MarginType::Serrate;
        generator.tooth_count = 20;
        assert_eq!(generator.effective_resolution(), 160);
        generator.tooth_count = 10_000;
        assert_eq!(generator.effective_resolution(), MAX_CONTOUR_RESOLUTION);
    }

    #[test]
    fn test_refinement_adds_points_on_sharp_shapes() {
        let round = LeafShapeGenerator { m: 0.0, contour_resolution: 64, ..Default::default() };
        assert_eq!(round.sample_contour().len(), 64);
        let spiky = LeafShapeGenerator { m: 7.0, n1: 0.3, contour_resolution: 64, ..Default::default() };
        assert!(spiky.sample_contour().len() > 64);
    }

    #[test]
    fn test_margin_only_grows_radius() {
        for margin_type in [MarginType::Serrate, MarginType::Dentate, MarginType::Crenate, MarginType::Lobed] {
            let generator = LeafShapeGenerator { margin_type, tooth_count: 6, tooth_depth: 0.2, ..Default::default() };
            let contour = generator.sample_contour();
            let toothed = generator.apply_margin(contour.clone());
            assert_eq!(toothed.len(), contour.len());
            for (p, q) in contour.iter().zip(&toothed) {
                assert!(q.length() >= p.length() - 1e-5);
                assert!(q.length() <= p.length() * 1.2 + 1e-5);
            }
        }
    }

    #[test]
    fn test_entire_margin_is_identity() {
        let generator = LeafShapeGenerator { tooth_count: 12, ..Default::default() };
        let contour = generator.sample_contour();
        assert_eq!(generator.apply_margin(contour.clone()), contour);
    }

    #[test]
    fn test_polygon_helpers() {
        let square = square();
        assert!((signed_area(&square) - 1.0).abs() < 1e-6);
        assert!(point_in_contour(Vec2::new(0.5, 0.5), &square));
        assert!(!point_in_contour(Vec2::new(1.5, 0.5), &square));
        assert!((distance_to_contour(Vec2::new(0.5, 0.4), &square) - 0.4).abs() < 1e-6);
        assert!(cross2d(square[0], square[1], square[2]) > 0.0);
    }
}
