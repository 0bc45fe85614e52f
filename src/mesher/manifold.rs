//! Manifold tube mesher
//!
//! Every branch (a chain of continuation nodes) becomes one closed tube: rings
//! swept along the branch with parallel-transport frames, a fan cap at the
//! base and one at the tip. Lateral branches start on their parent's
//! centerline so the tube base is buried inside the parent and junctions show
//! no gap. Each tube is a closed 2-manifold on its own; the tree mesh is a set
//! of interpenetrating shells, not one joined surface.
//!
//! Every ring carries a golden-angle `phyllotaxis_angle` (ring index times the
//! golden angle, wrapped to [0, 2pi)) for leaf placement, and a `smooth_amount`
//! holding how far smoothing moved the ring center.

use std::collections::VecDeque;
use std::f32::consts::TAU;

use rayon::prelude::*;

use crate::core::error::Error;
use crate::core::types::{Result, Vec2, Vec3};
use crate::math::geometry::{GOLDEN_ANGLE, normalize_or, orthogonal_vector, project_on_plane, rotation_arc};
use crate::mesh::{Mesh, attributes};
use crate::mesher::TreeMesher;
use crate::skeleton::{NodeId, NodeType, Skeleton, Tree};

const MIN_RADIAL_RESOLUTION: usize = 3;
const SMOOTHING_FACTOR: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ManifoldMesher {
    /// Vertices per ring
    pub radial_resolution: usize,
    /// Laplacian passes over the ring centers of each branch
    pub smooth_iterations: usize,
}

impl Default for ManifoldMesher {
    fn default() -> Self {
        Self { radial_resolution: 8, smooth_iterations: 2 }
    }
}

impl ManifoldMesher {
    pub fn new(radial_resolution: usize, smooth_iterations: usize) -> Self {
        Self { radial_resolution, smooth_iterations }
    }

    fn build_branch(&self, skeleton: &Skeleton, branch: &BranchPath, stem_id: usize) -> BranchGeometry {
        let n = self.radial_resolution.max(MIN_RADIAL_RESOLUTION);
        let rings = self.build_rings(skeleton, branch);
        let total_length = rings.last().map_or(0.0, |r| r.distance);
        let pivot = rings.first().map_or(Vec3::ZERO, |r| r.center);

        let mut geometry = BranchGeometry::default();
        let push_vertex = |geometry: &mut BranchGeometry, position: Vec3, ring: &Ring| {
            geometry.vertices.push(position);
            geometry.radius.push(ring.radius);
            geometry.direction.push(ring.tangent);
            geometry.extent.push(if total_length > 0.0 { ring.distance / total_length } else { 0.0 });
            geometry.phyllotaxis.push(ring.phyllotaxis);
            geometry.smooth_amount.push(ring.smooth_amount);
        };

        // Ring vertices and UVs, with a seam UV column so u spans [0, 1]
        let mut normal = orthogonal_vector(rings[0].tangent);
        let mut previous_tangent = rings[0].tangent;
        for ring in &rings {
            normal = rotation_arc(previous_tangent, ring.tangent) * normal;
            normal = normalize_or(project_on_plane(normal, ring.tangent), orthogonal_vector(ring.tangent));
            let binormal = ring.tangent.cross(normal);
            previous_tangent = ring.tangent;

            for j in 0..n {
                let angle = TAU * j as f32 / n as f32;
                let offset = (normal * angle.cos() + binormal * angle.sin()) * ring.radius;
                push_vertex(&mut geometry, ring.center + offset, ring);
            }
            for j in 0..=n {
                geometry.uvs.push(Vec2::new(j as f32 / n as f32, ring.distance));
            }
        }

        let ring_count = rings.len() as u32;
        let n32 = n as u32;
        let vertex = |ring: u32, j: u32| ring * n32 + j % n32;
        let uv = |ring: u32, j: u32| ring * (n32 + 1) + j;

        for i in 0..ring_count - 1 {
            for j in 0..n32 {
                geometry.polygons.push([vertex(i, j), vertex(i, j + 1), vertex(i + 1, j + 1), vertex(i + 1, j)]);
                geometry.uv_loops.push([uv(i, j), uv(i, j + 1), uv(i + 1, j + 1), uv(i + 1, j)]);
            }
        }

        // Caps: fans around a center vertex, stored as degenerate quads
        let base = &rings[0];
        let tip = &rings[rings.len() - 1];
        let base_center = geometry.vertices.len() as u32;
        push_vertex(&mut geometry, base.center, base);
        let tip_center = base_center + 1;
        push_vertex(&mut geometry, tip.center, tip);
        let base_uv = geometry.uvs.len() as u32;
        geometry.uvs.push(Vec2::new(0.5, base.distance));
        let tip_uv = base_uv + 1;
        geometry.uvs.push(Vec2::new(0.5, tip.distance));

        let last = ring_count - 1;
        for j in 0..n32 {
            geometry.polygons.push([vertex(0, j + 1), vertex(0, j), base_center, base_center]);
            geometry.uv_loops.push([uv(0, j + 1), uv(0, j), base_uv, base_uv]);
            geometry.polygons.push([vertex(last, j), vertex(last, j + 1), tip_center, tip_center]);
            geometry.uv_loops.push([uv(last, j), uv(last, j + 1), tip_uv, tip_uv]);
        }

        geometry.stem_id = stem_id;
        geometry.depth = branch.depth;
        geometry.pivot = pivot;
        geometry
    }

    /// One ring at the start of every node plus one at the branch tip
    fn build_rings(&self, skeleton: &Skeleton, branch: &BranchPath) -> Vec<Ring> {
        let mut centers = Vec::with_capacity(branch.nodes.len() + 1);
        let mut radii = Vec::with_capacity(branch.nodes.len() + 1);
        let mut position = branch.start;
        for &id in &branch.nodes {
            let node = skeleton.node(id);
            centers.push(position);
            radii.push(node.radius);
            position += node.direction * node.length;
        }
        centers.push(position);
        radii.push(radii.last().copied().unwrap_or(0.0));
        let raw_centers = centers.clone();

        for _ in 0..self.smooth_iterations {
            let previous = centers.clone();
            for i in 1..centers.len().saturating_sub(1) {
                let average = (previous[i - 1] + previous[i + 1]) * 0.5;
                centers[i] = previous[i].lerp(average, SMOOTHING_FACTOR);
            }
        }

        let first_direction = skeleton.node(branch.nodes[0]).direction;
        let last_direction = branch.nodes.last().map_or(first_direction, |&id| skeleton.node(id).direction);
        let last = centers.len() - 1;
        let mut distance = 0.0;
        let mut rings = Vec::with_capacity(centers.len());
        for i in 0..centers.len() {
            if i > 0 {
                distance += centers[i].distance(centers[i - 1]);
            }
            let tangent = if i == 0 {
                first_direction
            } else if i == last {
                last_direction
            } else {
                let fallback = normalize_or(skeleton.node(branch.nodes[i]).direction, last_direction);
                normalize_or(centers[i + 1] - centers[i - 1], fallback)
            };
            rings.push(Ring {
                center: centers[i],
                tangent,
                radius: radii[i].max(0.0),
                distance,
                phyllotaxis: phyllotaxis_angle(i),
                smooth_amount: centers[i].distance(raw_centers[i]),
            });
        }
        rings
    }
}

impl TreeMesher for ManifoldMesher {
    fn mesh_tree(&self, tree: &Tree) -> Result<Mesh> {
        if !tree.is_executed() {
            return Err(Error::NotExecuted);
        }
        let skeleton = tree.skeleton();
        let branches = collect_branches(skeleton);

        let geometries: Vec<BranchGeometry> = branches
            .par_iter()
            .enumerate()
            .map(|(stem_id, branch)| self.build_branch(skeleton, branch, stem_id))
            .collect();

        let mesh = merge(geometries)?;
        log::debug!(
            "Meshed {} branches: {} vertices, {} polygons",
            branches.len(),
            mesh.vertex_count(),
            mesh.polygon_count()
        );
        Ok(mesh)
    }
}

/// Nodes of one branch, base to tip
struct BranchPath {
    nodes: Vec<NodeId>,
    start: Vec3,
    depth: u32,
}

#[derive(Clone, Copy)]
struct Ring {
    center: Vec3,
    tangent: Vec3,
    radius: f32,
    /// Distance from the branch base
    distance: f32,
    phyllotaxis: f32,
    smooth_amount: f32,
}

/// Golden-angle rotation of the ring at `index`, in [0, 2pi)
fn phyllotaxis_angle(index: usize) -> f32 {
    let angle = (index as f64 * GOLDEN_ANGLE as f64).rem_euclid(std::f64::consts::TAU) as f32;
    if angle < TAU { angle } else { 0.0 }
}

#[derive(Default)]
struct BranchGeometry {
    vertices: Vec<Vec3>,
    uvs: Vec<Vec2>,
    polygons: Vec<[u32; 4]>,
    uv_loops: Vec<[u32; 4]>,
    radius: Vec<f32>,
    direction: Vec<Vec3>,
    extent: Vec<f32>,
    phyllotaxis: Vec<f32>,
    smooth_amount: Vec<f32>,
    stem_id: usize,
    depth: u32,
    pivot: Vec3,
}

/// Split the skeleton into branches, breadth-first from the stems.
/// Dormant buds are not part of the visible tree.
fn collect_branches(skeleton: &Skeleton) -> Vec<BranchPath> {
    let mut branches = Vec::new();
    let mut queue: VecDeque<(NodeId, Vec3, u32)> = skeleton.stems().iter().map(|s| (s.node, s.position, 0)).collect();

    while let Some((start_id, start, depth)) = queue.pop_front() {
        let mut nodes = Vec::new();
        let mut position = start;
        let mut current = Some(start_id);
        while let Some(id) = current {
            let node = skeleton.node(id);
            nodes.push(id);
            let continuation = node.continuation();
            for child in &node.children {
                if Some(child.node) == continuation
                    || skeleton.node(child.node).growth.node_type() == Some(NodeType::Dormant)
                {
                    continue;
                }
                queue.push_back((child.node, skeleton.child_position(id, position, child.position_in_parent), depth + 1));
            }
            position += node.direction * node.length;
            current = continuation;
        }
        branches.push(BranchPath { nodes, start, depth });
    }
    branches
}

fn merge(geometries: Vec<BranchGeometry>) -> Result<Mesh> {
    let mut mesh = Mesh::new();
    let mut radius = Vec::new();
    let mut direction = Vec::new();
    let mut extent = Vec::new();
    let mut phyllotaxis = Vec::new();
    let mut smooth_amount = Vec::new();
    let mut stem_id = Vec::new();
    let mut depth = Vec::new();
    let mut pivot = Vec::new();

    for geometry in geometries {
        let vertex_offset = mesh.vertices.len() as u32;
        let uv_offset = mesh.uvs.len() as u32;
        let count = geometry.vertices.len();

        mesh.vertices.extend(geometry.vertices);
        mesh.uvs.extend(geometry.uvs);
        mesh.polygons.extend(geometry.polygons.iter().map(|p| p.map(|i| i + vertex_offset)));
        mesh.uv_loops.extend(geometry.uv_loops.iter().map(|p| p.map(|i| i + uv_offset)));

        radius.extend(geometry.radius);
        direction.extend(geometry.direction);
        extent.extend(geometry.extent);
        phyllotaxis.extend(geometry.phyllotaxis);
        smooth_amount.extend(geometry.smooth_amount);
        stem_id.extend(std::iter::repeat_n(geometry.stem_id as f32, count));
        depth.extend(std::iter::repeat_n(geometry.depth as f32, count));
        pivot.extend(std::iter::repeat_n(geometry.pivot, count));
    }

    mesh.set_float_attribute(attributes::RADIUS, radius)?;
    mesh.set_vector3_attribute(attributes::DIRECTION, direction)?;
    mesh.set_float_attribute(attributes::BRANCH_EXTENT, extent)?;
    mesh.set_float_attribute(attributes::PHYLLOTAXIS_ANGLE, phyllotaxis)?;
    mesh.set_float_attribute(attributes::SMOOTH_AMOUNT, smooth_amount)?;
    mesh.set_float_attribute(attributes::STEM_ID, stem_id)?;
    mesh.set_float_attribute(attributes::HIERARCHY_DEPTH, depth)?;
    mesh.set_vector3_attribute(attributes::PIVOT_POSITION, pivot)?;
    Ok(mesh)
}
