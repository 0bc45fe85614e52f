//! Branch function: grows lateral branches along the branches of its parent

use std::collections::VecDeque;

use crate::core::types::{Quat, Vec3};
use crate::functions::crown::{CrownShape, get_shape_ratio};
use crate::functions::{ShapeFunction, TreeFunction};
use crate::math::SimpleRng;
use crate::math::geometry::{axis_angle, normalize_or, orthogonal_vector, project_on_plane, random_vec};
use crate::property::PropertyWrapper;
use crate::skeleton::{BranchGrowthInfo, GrowthInfo, Node, NodeId, Skeleton, select_from_tree};

const EPSILON: f32 = 1e-3;

/// Where branches start along their parent
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistributionParams {
    /// Fraction of the parent length where branches start
    pub start: f32,
    /// Fraction of the parent length where branches stop
    pub end: f32,
    /// Branches per unit length
    pub density: f32,
    /// Rotation between consecutive branches, in degrees
    pub phillotaxis: f32,
}

impl Default for DistributionParams {
    fn default() -> Self {
        Self { start: 0.1, end: 1.0, density: 2.0, phillotaxis: 137.5 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GravityParams {
    pub strength: f32,
    pub stiffness: f32,
    pub up_attraction: f32,
}

impl Default for GravityParams {
    fn default() -> Self {
        Self { strength: 10.0, stiffness: 0.1, up_attraction: 0.25 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitParams {
    /// Chance per unit length to fork
    pub probability: f32,
    /// Radius multiplier of the forked child
    pub radius: f32,
    /// Angle of the fork, in degrees
    pub angle: f32,
}

impl Default for SplitParams {
    fn default() -> Self {
        Self { probability: 0.5, radius: 0.9, angle: 45.0 }
    }
}

/// Crown envelope modulating branch length and angle with height
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CrownParams {
    pub shape: CrownShape,
    /// Degrees added to the start angle at the crown base, removed at the top
    pub angle_variation: f32,
    /// Crown height; negative means the trunk length
    pub height: f32,
    /// Fraction of the crown height below the crown
    pub base_size: f32,
}

impl Default for CrownParams {
    fn default() -> Self {
        Self { shape: CrownShape::Cylindrical, angle_variation: 0.0, height: -1.0, base_size: 0.0 }
    }
}

#[derive(Clone, Debug)]
pub struct BranchFunction {
    pub seed: i32,
    pub length: PropertyWrapper,
    /// Radius relative to the parent node
    pub start_radius: PropertyWrapper,
    /// Tip radius relative to the branch start radius
    pub end_radius: f32,
    pub break_chance: f32,
    /// Nodes per unit length
    pub resolution: f32,
    pub randomness: PropertyWrapper,
    /// Reduces the vertical part of the random wander
    pub flatness: f32,
    /// Angle from the parent direction, in degrees
    pub start_angle: PropertyWrapper,
    pub distribution: DistributionParams,
    pub gravity: GravityParams,
    pub split: SplitParams,
    pub crown: CrownParams,
    pub children: Vec<ShapeFunction>,
}

impl Default for BranchFunction {
    fn default() -> Self {
        Self {
            seed: 42,
            length: PropertyWrapper::constant(9.0),
            start_radius: PropertyWrapper::constant(0.4),
            end_radius: 0.05,
            break_chance: 0.01,
            resolution: 3.0,
            randomness: PropertyWrapper::constant(0.4),
            flatness: 0.5,
            start_angle: PropertyWrapper::constant(45.0),
            distribution: DistributionParams::default(),
            gravity: GravityParams::default(),
            split: SplitParams::default(),
            crown: CrownParams::default(),
            children: Vec::new(),
        }
    }
}

impl BranchFunction {
    pub fn add_child(&mut self, child: impl Into<ShapeFunction>) {
        self.children.push(child.into());
    }
}

impl TreeFunction for BranchFunction {
    fn seed(&self) -> i32 {
        self.seed
    }

    fn children(&self) -> &[ShapeFunction] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut Vec<ShapeFunction> {
        &mut self.children
    }

    fn grow(&self, skeleton: &mut Skeleton, id: usize, parent_id: Option<usize>) {
        let Some(parent_id) = parent_id else {
            log::debug!("Branch function {} has no parent function, nothing to grow on", id);
            return;
        };
        let mut grower = BranchGrower {
            function: self,
            rng: SimpleRng::from_seed(self.seed),
            resolution: if self.resolution.is_finite() { self.resolution.max(0.01) } else { 1.0 },
            id,
        };
        let origins = grower.create_origins(skeleton, parent_id);
        log::debug!("Branch function {}: {} origins", id, origins.len());
        grower.grow_origins(skeleton, &origins);
    }
}

/// Per-execution state of a branch function
struct BranchGrower<'a> {
    function: &'a BranchFunction,
    rng: SimpleRng,
    resolution: f32,
    id: usize,
}

impl BranchGrower<'_> {
    /// Attach the first node of every new branch to the parent's branches.
    /// Returns the nodes that still have length to grow.
    fn create_origins(&mut self, skeleton: &mut Skeleton, parent_id: usize) -> Vec<NodeId> {
        let f = self.function;
        let selection = select_from_tree(skeleton, parent_id);
        let mut origins = Vec::new();

        let mut crown_height = f.crown.height;
        if crown_height < 0.0 && parent_id == 0 {
            if let Some(stem) = skeleton.stems().first() {
                crown_height = skeleton.branch_length(stem.node);
            }
        }
        let crown_start_z = crown_height * f.crown.base_size;
        let crown_zone_height = crown_height * (1.0 - f.crown.base_size);
        let needs_height = crown_zone_height > EPSILON
            && (f.crown.shape != CrownShape::Cylindrical || f.crown.angle_variation.abs() > EPSILON);

        let origins_dist = 1.0 / (f.distribution.density.max(0.0) + 0.001);

        for branch in &selection {
            let Some(first) = branch.first() else {
                continue;
            };
            let branch_length = skeleton.branch_length(first.node);
            let absolute_start = f.distribution.start * branch_length;
            let absolute_end = f.distribution.end * branch_length;
            let mut current_length = 0.0;
            let mut dist_to_next_origin = absolute_start;
            let mut tangent = orthogonal_vector(skeleton.node(first.node).direction);

            for branch_node in branch {
                let (node_direction, node_length, node_radius, node_tangent, has_children) = {
                    let node = skeleton.node(branch_node.node);
                    (node.direction, node.length, node.radius, node.tangent, !node.children.is_empty())
                };
                // A child on a tip would continue the branch instead of forking it
                if !has_children {
                    continue;
                }
                let phillotaxis = f.distribution.phillotaxis + (self.rng.next_float() - 0.5) * 2.0;
                let rotation = axis_angle(node_direction, phillotaxis.to_radians());

                if dist_to_next_origin > node_length {
                    dist_to_next_origin -= node_length;
                    current_length += node_length;
                    continue;
                }

                let mut remaining = node_length - dist_to_next_origin;
                current_length += dist_to_next_origin;
                let origins_to_create = (remaining / origins_dist) as usize + 1;
                let safe_length = node_length.max(1e-6);
                let mut position_in_parent = dist_to_next_origin / safe_length;
                let position_step = origins_dist / safe_length;

                for i in 0..origins_to_create {
                    if current_length > absolute_end {
                        break;
                    }
                    let factor = (current_length - absolute_start) / (absolute_end - absolute_start).max(EPSILON);
                    tangent = normalize_or(project_on_plane(rotation * tangent, node_direction), orthogonal_vector(node_direction));

                    let child_radius = node_radius * f.start_radius.evaluate(factor, &mut self.rng);
                    let mut length = f.length.evaluate(factor, &mut self.rng);
                    let mut start_angle = f.start_angle.evaluate(factor, &mut self.rng);
                    let child_position = branch_node.position + node_direction * node_length * position_in_parent;

                    if needs_height && child_position.z >= crown_start_z {
                        // 1 at the crown base, 0 at the top
                        let height_ratio = 1.0 - ((child_position.z - crown_start_z) / crown_zone_height).min(1.0);
                        if f.crown.shape != CrownShape::Cylindrical {
                            length *= get_shape_ratio(f.crown.shape, height_ratio);
                        }
                        if f.crown.angle_variation.abs() > EPSILON {
                            let conical = get_shape_ratio(CrownShape::Conical, height_ratio);
                            start_angle = (start_angle + f.crown.angle_variation * (1.0 - 2.0 * conical)).clamp(0.0, 180.0);
                        }
                    }

                    let child_direction = normalize_or(node_direction.lerp(tangent, start_angle / 90.0), tangent);
                    let first_length = length.min(1.0 / (self.resolution + 0.001)).max(0.0);
                    let mut child = Node::new(child_direction, node_tangent, first_length, child_radius, self.id);
                    child.growth = GrowthInfo::Branch(BranchGrowthInfo {
                        desired_length: length,
                        origin_radius: child_radius,
                        position: child_position,
                        current_length: first_length,
                        ..Default::default()
                    });
                    let child_id = skeleton.add_child(branch_node.node, child, position_in_parent.min(1.0));
                    if length - first_length > EPSILON {
                        origins.push(child_id);
                    }

                    position_in_parent += position_step;
                    if i > 0 {
                        current_length += origins_dist;
                    }
                }
                remaining -= (origins_to_create - 1) as f32 * origins_dist;
                dist_to_next_origin = origins_dist - remaining;
            }
        }
        origins
    }

    /// Grow all origins breadth-first, bending them under gravity after each batch
    fn grow_origins(&mut self, skeleton: &mut Skeleton, origins: &[NodeId]) {
        let mut extremities: VecDeque<NodeId> = origins.iter().copied().collect();
        let mut batch_size = extremities.len();
        while let Some(node_id) = extremities.pop_front() {
            if batch_size == 0 {
                // The popped node belongs to the next batch
                batch_size = extremities.len() + 1;
                for &origin in origins {
                    self.apply_gravity_to_branch(skeleton, origin);
                }
            }
            self.grow_node_once(skeleton, node_id, &mut extremities);
            batch_size -= 1;
        }
    }

    /// Extend an extremity by one node, possibly forking it
    fn grow_node_once(&mut self, skeleton: &mut Skeleton, node_id: NodeId, extremities: &mut VecDeque<NodeId>) {
        let f = self.function;
        if self.rng.next_float() * self.resolution < f.break_chance {
            mark_inactive(skeleton, node_id);
            return;
        }

        let node = skeleton.node(node_id);
        let Some(info) = node.growth.as_branch().copied() else {
            return;
        };
        let (direction, length, radius, tangent) = (node.direction, node.length, node.radius, node.tangent);

        let factor = info.current_length / info.desired_length.max(EPSILON);
        let child_radius = info.origin_radius + (info.origin_radius * f.end_radius - info.origin_radius) * factor.min(1.0);
        let child_length = (1.0 / self.resolution).min(info.desired_length - info.current_length).max(0.0);
        let randomness = f.randomness.evaluate(factor, &mut self.rng);

        let random_dir =
            normalize_or(random_vec(&mut self.rng, f.flatness), Vec3::X) + Vec3::Z * f.gravity.up_attraction;
        let mut child_direction = direction + random_dir * randomness / self.resolution;
        if avoid_floor(info.position, &mut child_direction, length) {
            mark_inactive(skeleton, node_id);
            return;
        }
        let child_direction = normalize_or(child_direction, direction);

        let current_length = info.current_length + child_length;
        let child_position = info.position + direction * length;
        let mut child = Node::new(child_direction, tangent, child_length, child_radius, self.id);
        child.growth = GrowthInfo::Branch(BranchGrowthInfo {
            position: child_position,
            current_length,
            ..info_for_child(&info)
        });
        let child_id = skeleton.add_child(node_id, child, 1.0);
        if current_length < info.desired_length {
            extremities.push_back(child_id);
        }

        if self.rng.next_float() * self.resolution < f.split.probability {
            let split_direction = self.split_direction(direction, info.position, length);
            let position_in_parent = self.rng.next_float();
            let mut split_child = Node::new(split_direction, tangent, child_length, radius * f.split.radius, self.id);
            split_child.growth = GrowthInfo::Branch(BranchGrowthInfo {
                origin_radius: info.origin_radius * f.split.radius,
                position: info.position + direction * length * position_in_parent,
                current_length,
                ..info_for_child(&info)
            });
            let split_id = skeleton.add_child(node_id, split_child, position_in_parent);
            if current_length < info.desired_length {
                extremities.push_back(split_id);
            }
        }
    }

    fn split_direction(&mut self, parent_direction: Vec3, parent_position: Vec3, parent_length: f32) -> Vec3 {
        let f = self.function;
        let mut direction = random_vec(&mut self.rng, 0.0).cross(parent_direction)
            + Vec3::Z * f.gravity.up_attraction * f.flatness;
        let flat_normal = normalize_or(Vec3::Z.cross(parent_direction).cross(parent_direction), Vec3::ZERO);
        direction -= flat_normal * direction.dot(flat_normal) * f.flatness;
        avoid_floor(parent_position, &mut direction, parent_length);
        normalize_or(parent_direction.lerp(direction, f.split.angle / 90.0), parent_direction)
    }

    fn apply_gravity_to_branch(&self, skeleton: &mut Skeleton, origin: NodeId) {
        let subtree = skeleton.subtree(origin);
        self.update_weights(skeleton, &subtree);
        self.apply_gravity(skeleton, origin);
        update_positions(skeleton, origin);
    }

    /// Accumulate subtree weights and propagate the inactive flag upwards
    fn update_weights(&self, skeleton: &mut Skeleton, subtree: &[NodeId]) {
        for &id in subtree.iter().rev() {
            let node = skeleton.node(id);
            let mut weight = node.length;
            let mut child_inactive = false;
            for child in &node.children {
                if let Some(info) = skeleton.node(child.node).growth.as_branch() {
                    weight += info.cumulated_weight;
                    child_inactive |= info.inactive;
                }
            }
            let has_children = !node.children.is_empty();
            if let Some(info) = skeleton.node_mut(id).growth.as_branch_mut() {
                info.cumulated_weight = weight;
                if has_children && !info.inactive {
                    info.inactive = child_inactive;
                }
            }
        }
    }

    /// Rotate every node down by its weight, each rotation carried to its descendants
    fn apply_gravity(&self, skeleton: &mut Skeleton, origin: NodeId) {
        let f = self.function;
        let resolution = self.resolution;
        let mut stack = vec![(origin, Quat::IDENTITY)];
        while let Some((id, parent_rotation)) = stack.pop() {
            let node = skeleton.node_mut(id);
            let direction = node.direction;
            let mut rotation = parent_rotation;
            if let Some(info) = node.growth.as_branch_mut() {
                let horizontality = 1.0 - direction.z.abs();
                info.age += 1.0 / resolution;
                let mut displacement = horizontality * info.cumulated_weight.max(0.0).sqrt() * f.gravity.strength
                    / resolution
                    / resolution
                    / 1000.0
                    / (1.0 + info.age);
                displacement *= (-(info.deviation_from_rest_pose / resolution * f.gravity.stiffness).abs()).exp();
                info.deviation_from_rest_pose += displacement;

                let axis = direction.cross(-Vec3::Z);
                rotation = axis_angle(axis, displacement) * rotation;
                node.direction = normalize_or(rotation * direction, direction);
            }
            stack.extend(node.children.iter().map(|c| (c.node, rotation)));
        }
    }
}

/// Growth state inherited by a new child
fn info_for_child(parent: &BranchGrowthInfo) -> BranchGrowthInfo {
    BranchGrowthInfo {
        desired_length: parent.desired_length,
        origin_radius: parent.origin_radius,
        ..Default::default()
    }
}

fn mark_inactive(skeleton: &mut Skeleton, id: NodeId) {
    if let Some(info) = skeleton.node_mut(id).growth.as_branch_mut() {
        info.inactive = true;
    }
}

/// Recompute the stored start position of every node below `origin`
fn update_positions(skeleton: &mut Skeleton, origin: NodeId) {
    let Some(start) = skeleton.node(origin).growth.as_branch().map(|i| i.position) else {
        return;
    };
    let mut stack = vec![(origin, start)];
    while let Some((id, position)) = stack.pop() {
        if let Some(info) = skeleton.node_mut(id).growth.as_branch_mut() {
            info.position = position;
        }
        let node = skeleton.node(id);
        for child in &node.children {
            stack.push((child.node, position + node.direction * node.length * child.position_in_parent));
        }
    }
}

/// Bend a downward direction back up near the floor.
/// Returns true when the branch heads into the floor too fast and should stop.
fn avoid_floor(position: Vec3, direction: &mut Vec3, parent_length: f32) -> bool {
    if direction.z < 0.0 {
        direction.z -= direction.z * 2.0 / (2.0 + position.z).max(EPSILON);
    }
    (position + *direction).z * parent_length * 4.0 < 0.0
}
