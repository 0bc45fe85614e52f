//! Leaf venation by space colonization
//!
//! Auxin sources scattered inside the outline attract the vein tips; veins
//! step towards the average direction of the sources they are closest to,
//! and sources die once a vein gets close enough.

use rayon::prelude::*;

use crate::core::types::Vec2;
use crate::leaf::contour::{distance_to_segment, point_in_contour, signed_area};
use crate::leaf::presets::VenationType;
use crate::math::{Rect, SimpleRng};

const MAX_AUXINS: usize = 5000;
/// Sampling attempts per requested auxin
const AUXIN_ATTEMPTS: usize = 10;
/// Root height above the leaf base, as a fraction of the leaf length
const ROOT_OFFSET: f32 = 0.02;
/// Grid cells per axis are capped; larger domains get coarser cells
const MAX_GRID_CELLS: f32 = 256.0;

/// Uniform grid over a bounded domain for radius queries
#[derive(Clone, Debug)]
pub struct SpatialHash2D {
    cell_size: f32,
    min_bound: Vec2,
    width: usize,
    height: usize,
    cells: Vec<Vec<(usize, Vec2)>>,
}

impl SpatialHash2D {
    pub fn new(cell_size: f32, min_bound: Vec2, max_bound: Vec2) -> Self {
        let range = (max_bound - min_bound).max(Vec2::ZERO);
        let cell_size = cell_size.max(range.max_element() / MAX_GRID_CELLS).max(1e-6);
        let width = ((range.x / cell_size).ceil() as usize + 1).max(1);
        let height = ((range.y / cell_size).ceil() as usize + 1).max(1);
        Self {
            cell_size,
            min_bound,
            width,
            height,
            cells: vec![Vec::new(); width * height],
        }
    }

    fn to_cell(&self, position: Vec2) -> (usize, usize) {
        let cell = ((position - self.min_bound) / self.cell_size).floor();
        // Negative and NaN coordinates saturate to 0
        let cx = (cell.x.max(0.0) as usize).min(self.width - 1);
        let cy = (cell.y.max(0.0) as usize).min(self.height - 1);
        (cx, cy)
    }

    pub fn insert(&mut self, id: usize, position: Vec2) {
        let (cx, cy) = self.to_cell(position);
        self.cells[cy * self.width + cx].push((id, position));
    }

    /// Ids of all entries within `radius` of `center`
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<usize> {
        let radius_sq = radius * radius;
        let (x0, y0) = self.to_cell(center - Vec2::splat(radius));
        let (x1, y1) = self.to_cell(center + Vec2::splat(radius));
        let mut result = Vec::new();
        for cy in y0..=y1 {
            for cx in x0..=x1 {
                result.extend(
                    self.cells[cy * self.width + cx]
                        .iter()
                        .filter(|(_, p)| p.distance_squared(center) <= radius_sq)
                        .map(|(id, _)| *id),
                );
            }
        }
        result
    }

    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(Vec::clear);
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VeinNode {
    pub position: Vec2,
    /// `None` for the root
    pub parent: Option<usize>,
    /// Pipe model width: square root of the number of tips fed by this node
    pub width: f32,
}

#[derive(Clone, Copy, Debug)]
struct Auxin {
    position: Vec2,
    active: bool,
}

#[derive(Clone, Debug)]
pub struct VenationGenerator {
    pub venation_type: VenationType,
    /// Auxin sources per unit area
    pub vein_density: f32,
    pub kill_distance: f32,
    pub growth_step_size: f32,
    pub attraction_distance: f32,
    pub max_iterations: usize,
    pub seed: i32,
}

impl Default for VenationGenerator {
    fn default() -> Self {
        Self {
            venation_type: VenationType::Open,
            vein_density: 800.0,
            kill_distance: 0.03,
            growth_step_size: 0.01,
            attraction_distance: 0.08,
            max_iterations: 300,
            seed: 42,
        }
    }
}

impl VenationGenerator {
    /// Grow a vein network inside `contour`, root first, parents before children.
    ///
    /// Empty only when the contour has fewer than 3 points.
    pub fn generate_veins(&self, contour: &[Vec2]) -> Vec<VeinNode> {
        let Some(bounds) = Rect::from_points(contour).filter(|_| contour.len() >= 3) else {
            return Vec::new();
        };
        let mut rng = SimpleRng::from_seed(self.seed);
        let mut auxins = self.generate_auxins(contour, &bounds, &mut rng);

        let root = root_position(contour, &bounds, self.growth_step_size);
        let mut veins = vec![VeinNode { position: root, parent: None, width: 1.0 }];

        let attraction = self.attraction_distance.max(1e-4);
        let step = self.growth_step_size.max(1e-5);
        let padded = bounds.padded(attraction);
        let mut vein_hash = SpatialHash2D::new(attraction, padded.min, padded.max);
        vein_hash.insert(0, root);

        let kill_distance = match self.venation_type {
            VenationType::Open => self.kill_distance,
            VenationType::Closed => self.kill_distance * 0.5,
        };
        let kill_sq = kill_distance * kill_distance;

        for _ in 0..self.max_iterations {
            let mut growth_dirs = vec![Vec2::ZERO; veins.len()];
            let mut growth_counts = vec![0usize; veins.len()];
            let mut active = 0;

            for auxin in auxins.iter().filter(|a| a.active) {
                active += 1;
                let nearest = vein_hash
                    .query_radius(auxin.position, attraction)
                    .into_iter()
                    .min_by(|&a, &b| {
                        let da = veins[a].position.distance_squared(auxin.position);
                        let db = veins[b].position.distance_squared(auxin.position);
                        da.total_cmp(&db)
                    });
                if let Some(nearest) = nearest {
                    let dir = auxin.position - veins[nearest].position;
                    let len = dir.length();
                    if len > 1e-10 {
                        growth_dirs[nearest] += dir / len;
                        growth_counts[nearest] += 1;
                    }
                }
            }
            if active == 0 {
                break;
            }

            let old_size = veins.len();
            for vi in 0..old_size {
                if growth_counts[vi] == 0 {
                    continue;
                }
                let average = growth_dirs[vi] / growth_counts[vi] as f32;
                if average.length() < 1e-10 {
                    continue;
                }
                let new_position = veins[vi].position + average.normalize() * step;
                if !point_in_contour(new_position, contour) {
                    continue;
                }

                // Closed venation joins nearby unrelated veins to form loops
                let mut parent = vi;
                if self.venation_type == VenationType::Closed {
                    if let Some(other) = vein_hash
                        .query_radius(new_position, step * 3.0)
                        .into_iter()
                        .find(|&n| n != vi && !is_ancestor(&veins, vi, n) && !is_ancestor(&veins, n, vi))
                    {
                        parent = other;
                    }
                }

                let id = veins.len();
                veins.push(VeinNode { position: new_position, parent: Some(parent), width: 1.0 });
                vein_hash.insert(id, new_position);
            }
            if veins.len() == old_size {
                break;
            }

            for vein in &veins[old_size..] {
                for auxin in auxins.iter_mut().filter(|a| a.active) {
                    if auxin.position.distance_squared(vein.position) <= kill_sq {
                        auxin.active = false;
                    }
                }
            }
        }

        compute_pipe_widths(&mut veins);
        log::debug!("Venation: {} auxins, {} vein nodes", auxins.len(), veins.len());
        veins
    }

    /// Rejection-sample auxin sources inside the contour
    fn generate_auxins(&self, contour: &[Vec2], bounds: &Rect, rng: &mut SimpleRng) -> Vec<Auxin> {
        let area = signed_area(contour).abs();
        let wanted = (self.vein_density.max(0.0) * area).min(MAX_AUXINS as f32) as usize;
        let mut auxins = Vec::with_capacity(wanted);
        let mut attempts = 0;
        while auxins.len() < wanted && attempts < wanted * AUXIN_ATTEMPTS {
            let position = Vec2::new(
                rng.range(bounds.min.x, bounds.max.x),
                rng.range(bounds.min.y, bounds.max.y),
            );
            if point_in_contour(position, contour) {
                auxins.push(Auxin { position, active: true });
            }
            attempts += 1;
        }
        auxins
    }

    /// Distance from every point to the closest vein segment, in input order
    pub fn compute_vein_distances(&self, points: &[Vec2], veins: &[VeinNode]) -> Vec<f32> {
        points
            .par_iter()
            .map(|&p| {
                veins
                    .iter()
                    .map(|vein| match vein.parent {
                        Some(parent) => distance_to_segment(p, veins[parent].position, vein.position),
                        None => p.distance(vein.position),
                    })
                    .fold(f32::MAX, f32::min)
            })
            .collect()
    }
}

/// Leaf base, moved inside the outline when the base point falls outside
fn root_position(contour: &[Vec2], bounds: &Rect, step: f32) -> Vec2 {
    let root = Vec2::new(0.0, bounds.min.y + bounds.height() * ROOT_OFFSET);
    if point_in_contour(root, contour) {
        return root;
    }
    let target = Vec2::new(0.0, bounds.min.y);
    let closest = contour
        .iter()
        .copied()
        .min_by(|a, b| a.distance_squared(target).total_cmp(&b.distance_squared(target)))
        .unwrap_or(target);
    let centroid = contour.iter().copied().sum::<Vec2>() / contour.len().max(1) as f32;
    closest + (centroid - closest).normalize_or_zero() * step
}

/// True when `ancestor` is `node` or on its path to the root
fn is_ancestor(veins: &[VeinNode], node: usize, ancestor: usize) -> bool {
    let mut current = Some(node);
    while let Some(id) = current {
        if id == ancestor {
            return true;
        }
        current = veins[id].parent;
    }
    false
}

/// Pipe model: width is the square root of the number of tips downstream
fn compute_pipe_widths(veins: &mut [VeinNode]) {
    let mut child_count = vec![0usize; veins.len()];
    for vein in veins.iter() {
        if let Some(parent) = vein.parent {
            child_count[parent] += 1;
        }
    }
    for (vein, &count) in veins.iter_mut().zip(&child_count) {
        vein.width = if count == 0 { 1.0 } else { 0.0 };
    }
    // Parents always precede their children, so one backward pass accumulates
    for i in (0..veins.len()).rev() {
        if let Some(parent) = veins[i].parent {
            let width = veins[i].width;
            veins[parent].width += width;
        }
    }
    for vein in veins.iter_mut() {
        vein.width = vein.width.max(1.0).sqrt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ellipse(n: usize) -> Vec<Vec2> {
        (0..n)
            .map(|i| {
                let a = i as f32 / n as f32 * std::f32::consts::TAU;
                Vec2::new(0.4 * a.cos(), a.sin())
            })
            .collect()
    }

    #[test]
    fn test_spatial_hash_query() {
        let mut hash = SpatialHash2D::new(0.1, Vec2::ZERO, Vec2::ONE);
        hash.insert(0, Vec2::new(0.5, 0.5));
        hash.insert(1, Vec2::new(0.55, 0.5));
        hash.insert(2, Vec2::new(0.9, 0.9));
        let mut found = hash.query_radius(Vec2::new(0.5, 0.5), 0.1);
        found.sort();
        assert_eq!(found, vec![0, 1]);
        hash.clear();
        assert!(hash.query_radius(Vec2::new(0.5, 0.5), 1.0).is_empty());
    }

    #[test]
    fn test_veins_grow_inside_contour() {
        let contour = ellipse(64);
        let veins = VenationGenerator::default().generate_veins(&contour);
        assert!(veins.len() > 10);
        assert_eq!(veins[0].parent, None);
        for vein in &veins {
            assert!(point_in_contour(vein.position, &contour));
        }
        for (i, vein) in veins.iter().enumerate().skip(1) {
            assert!(vein.parent.unwrap() < i);
        }
    }

    #[test]
    fn test_root_exists_without_auxins() {
        let generator = VenationGenerator { vein_density: 0.0, ..Default::default() };
        let veins = generator.generate_veins(&ellipse(32));
        assert_eq!(veins.len(), 1);
        assert!(veins[0].position.y < -0.9);
    }

    #[test]
    fn test_pipe_widths() {
        let veins = VenationGenerator::default().generate_veins(&ellipse(64));
        let root_width = veins[0].width;
        assert!(veins.iter().all(|v| v.width >= 1.0 && v.width <= root_width));
    }

    #[test]
    fn test_closed_venation() {
        let generator = VenationGenerator { venation_type: VenationType::Closed, ..Default::default() };
        let veins = generator.generate_veins(&ellipse(64));
        assert!(veins.len() > 10);
        assert!(veins.iter().all(|v| v.width.is_finite()));
    }

    #[test]
    fn test_vein_distances() {
        let veins = vec![
            VeinNode { position: Vec2::ZERO, parent: None, width: 1.0 },
            VeinNode { position: Vec2::new(0.0, 1.0), parent: Some(0), width: 1.0 },
        ];
        let points = [Vec2::new(0.5, 0.5), Vec2::new(0.0, 2.0)];
        let distances = VenationGenerator::default().compute_vein_distances(&points, &veins);
        assert!((distances[0] - 0.5).abs() < 1e-6);
        assert!((distances[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_deterministic() {
        let contour = ellipse(48);
        let a = VenationGenerator::default().generate_veins(&contour);
        let b = VenationGenerator::default().generate_veins(&contour);
        assert_eq!(a, b);
    }
}
