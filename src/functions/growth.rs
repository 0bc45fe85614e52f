//! Growth function: vigor-driven growth simulation
//!
//! Each iteration is a year of growth. Light flux collected by the tips flows
//! down to the stem, then vigor is redistributed upwards with apical
//! dominance deciding how much the continuation gets over lateral children.
//! Tips then grow, fork, get cut or turn into flowers depending on the vigor
//! they received.

use crate::core::types::{Quat, Vec3};
use crate::functions::{ShapeFunction, TreeFunction};
use crate::math::SimpleRng;
use crate::math::geometry::{axis_angle, look_at_rotation, normalize_or, random_vec};
use crate::skeleton::{BioNodeInfo, GrowthInfo, Node, NodeId, NodeType, Skeleton};

const EPSILON: f32 = 1e-3;
/// Light flux requested by a dormant bud
const DORMANT_BUD_ENERGY_REQUEST: f32 = 0.1;
/// Share of the parent vigor given to dormant buds
const DORMANT_BUD_VIGOR_FACTOR: f32 = 0.5;
const EXTENSION_TAPER: f32 = 0.9;
const SPLIT_TAPER: f32 = 0.8;
const GRAVITY_ANGLE_MULTIPLIER: f32 = 0.01;
/// Change of the working cut threshold per stem and iteration
const THRESHOLD_STEP: f32 = 0.01;
const LATERAL_RADIUS_RATIO: f32 = 0.6;

#[derive(Clone, Debug)]
pub struct GrowthFunction {
    pub seed: i32,
    pub iterations: u32,
    /// Stop after this many iterations when in `0..iterations`; negative runs all
    pub preview_iteration: i32,
    pub apical_dominance: f32,
    pub grow_threshold: f32,
    pub split_angle: f32,
    pub branch_length: f32,
    pub gravitropism: f32,
    pub randomness: f32,
    pub cut_threshold: f32,
    pub split_threshold: f32,
    pub gravity_strength: f32,
    /// Rotation between consecutive forks, in radians
    pub philotaxis_angle: f32,
    pub enable_lateral_branching: bool,
    pub lateral_start: f32,
    pub lateral_end: f32,
    pub lateral_density: f32,
    pub lateral_activation: f32,
    pub lateral_angle: f32,
    pub enable_flowering: bool,
    /// Tips with vigor between the cut threshold and this value flower
    pub flower_threshold: f32,
    pub children: Vec<ShapeFunction>,
}

impl Default for GrowthFunction {
    fn default() -> Self {
        Self {
            seed: 42,
            iterations: 5,
            preview_iteration: -1,
            apical_dominance: 0.7,
            grow_threshold: 0.5,
            split_angle: 60.0,
            branch_length: 1.0,
            gravitropism: 0.1,
            randomness: 0.1,
            cut_threshold: 0.2,
            split_threshold: 0.7,
            gravity_strength: 1.0,
            philotaxis_angle: 2.399,
            enable_lateral_branching: true,
            lateral_start: 0.1,
            lateral_end: 0.9,
            lateral_density: 2.0,
            lateral_activation: 0.4,
            lateral_angle: 45.0,
            enable_flowering: false,
            flower_threshold: 0.5,
            children: Vec::new(),
        }
    }
}

impl GrowthFunction {
    pub fn add_child(&mut self, child: impl Into<ShapeFunction>) {
        self.children.push(child.into());
    }

    /// Number of iterations actually simulated
    pub fn effective_iterations(&self) -> u32 {
        match u32::try_from(self.preview_iteration) {
            Ok(preview) if preview < self.iterations => preview,
            _ => self.iterations,
        }
    }
}

impl TreeFunction for GrowthFunction {
    fn seed(&self) -> i32 {
        self.seed
    }

    fn children(&self) -> &[ShapeFunction] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut Vec<ShapeFunction> {
        &mut self.children
    }

    fn grow(&self, skeleton: &mut Skeleton, id: usize, _parent_id: Option<usize>) {
        if self.enable_flowering && self.flower_threshold <= self.cut_threshold {
            log::debug!(
                "Growth function {}: flower threshold {} is not above cut threshold {}, no flowers will form",
                id,
                self.flower_threshold,
                self.cut_threshold
            );
        }

        let mut simulation = GrowthSimulation {
            function: self,
            rng: SimpleRng::from_seed(self.seed),
            cut_threshold: self.cut_threshold,
            id,
        };
        let stems = skeleton.stems().to_vec();

        for stem in &stems {
            simulation.setup_growth_information(skeleton, stem.node);
        }
        if self.enable_lateral_branching {
            for stem in &stems {
                simulation.create_lateral_buds(skeleton, stem.node);
            }
        }

        for i in 0..self.effective_iterations() {
            // Energy is not shared between stems
            for stem in &stems {
                let target_flux = 1.0 + (i as f32).powf(1.5);
                let flux = simulation.update_vigor_ratios(skeleton, stem.node);
                if target_flux > flux {
                    simulation.cut_threshold -= THRESHOLD_STEP;
                } else if target_flux < flux {
                    simulation.cut_threshold += THRESHOLD_STEP;
                }
                simulation.update_vigor(skeleton, stem.node, target_flux);
                simulation.simulate_growth(skeleton, stem.node);
                update_absolute_positions(skeleton, stem.node, stem.position);
                update_weights(skeleton, stem.node);
                simulation.apply_gravity(skeleton, stem.node);
            }
        }
        log::debug!(
            "Growth function {}: {} iterations, {} nodes",
            id,
            self.effective_iterations(),
            skeleton.node_count()
        );
    }
}

/// Per-execution state of a growth function
struct GrowthSimulation<'a> {
    function: &'a GrowthFunction,
    rng: SimpleRng,
    /// Working cut threshold, adapted to the light flux
    cut_threshold: f32,
    id: usize,
}

impl GrowthSimulation<'_> {
    fn setup_growth_information(&self, skeleton: &mut Skeleton, root: NodeId) {
        // Lateral buds take over from tips when lateral branching is on
        let tip_type = if self.function.enable_lateral_branching { NodeType::Ignored } else { NodeType::Meristem };
        for id in skeleton.subtree(root) {
            let node = skeleton.node_mut(id);
            let node_type = if node.is_leaf() { tip_type } else { NodeType::Ignored };
            node.growth = GrowthInfo::Bio(BioNodeInfo::new(node_type));
        }
    }

    /// Add dormant buds along the continuation chain starting at `root`
    fn create_lateral_buds(&self, skeleton: &mut Skeleton, root: NodeId) {
        let f = self.function;
        let total_length = skeleton.branch_length(root);
        let absolute_start = f.lateral_start * total_length;
        let absolute_end = f.lateral_end * total_length;
        let bud_spacing = 1.0 / (f.lateral_density.max(0.0) + EPSILON);

        let mut dist_to_next = absolute_start;
        let mut current_length = 0.0;
        let mut philotaxis = 0.0;
        let mut current = Some(root);

        while let Some(id) = current {
            let node = skeleton.node(id);
            let (direction, length, radius, tangent) = (node.direction, node.length, node.radius, node.tangent);
            let is_structure = node.growth.node_type() == Some(NodeType::Ignored) && !node.is_leaf();
            current = node.continuation();

            if is_structure && current_length + length >= absolute_start && current_length < absolute_end {
                let mut remaining = length;
                let mut position_in_node = 0.0;
                if current_length < absolute_start {
                    let skip = absolute_start - current_length;
                    remaining -= skip;
                    position_in_node = skip;
                    dist_to_next = 0.0;
                }

                while remaining > dist_to_next && current_length + position_in_node < absolute_end {
                    position_in_node += dist_to_next;
                    remaining -= dist_to_next;

                    philotaxis += f.philotaxis_angle;
                    let tangent_dir = look_at_rotation(direction) * Vec3::new(philotaxis.cos(), philotaxis.sin(), 0.0);
                    let bud_direction = normalize_or(direction.lerp(tangent_dir, f.lateral_angle / 90.0), tangent_dir);

                    let mut bud = Node::new(
                        bud_direction,
                        tangent,
                        f.branch_length * 0.5,
                        radius * LATERAL_RADIUS_RATIO,
                        self.id,
                    );
                    bud.growth = GrowthInfo::Bio(BioNodeInfo::with_angle(NodeType::Dormant, philotaxis));
                    let position_in_parent = (position_in_node / length.max(1e-6)).clamp(0.0, 1.0);
                    skeleton.add_child(id, bud, position_in_parent);

                    dist_to_next = bud_spacing;
                }
                dist_to_next -= remaining;
            } else if is_structure && current_length + length < absolute_start {
                dist_to_next = (absolute_start - (current_length + length)).max(0.0);
            }

            current_length += length;
        }
    }

    /// Collect light flux from the tips and set how vigor splits at every fork.
    /// Returns the flux reaching `root`.
    fn update_vigor_ratios(&self, skeleton: &mut Skeleton, root: NodeId) -> f32 {
        let t = self.function.apical_dominance;
        let subtree = skeleton.subtree(root);
        let mut flux = vec![0.0f32; skeleton.node_count()];

        for &id in subtree.iter().rev() {
            let node_type = skeleton.node(id).growth.node_type().unwrap_or(NodeType::Ignored);
            flux[id] = match node_type {
                NodeType::Meristem => 1.0,
                NodeType::Dormant => {
                    set_vigor_ratio(skeleton, id, DORMANT_BUD_ENERGY_REQUEST);
                    DORMANT_BUD_ENERGY_REQUEST
                }
                NodeType::Branch | NodeType::Ignored if !skeleton.node(id).is_leaf() => {
                    let children: Vec<NodeId> = skeleton.node(id).children.iter().map(|c| c.node).collect();
                    let mut light_flux = flux[children[0]];
                    let mut vigor_ratio = 1.0;
                    for &child in &children[1..] {
                        let child_flux = flux[child];
                        vigor_ratio = (t * light_flux) / (t * light_flux + (1.0 - t) * child_flux + EPSILON);
                        set_vigor_ratio(skeleton, child, 1.0 - vigor_ratio);
                        light_flux += child_flux;
                    }
                    set_vigor_ratio(skeleton, children[0], vigor_ratio);
                    light_flux
                }
                _ => {
                    set_vigor_ratio(skeleton, id, 0.0);
                    0.0
                }
            };
        }
        flux[root]
    }

    /// Distribute `vigor` from `root` to its descendants according to their ratios
    fn update_vigor(&self, skeleton: &mut Skeleton, root: NodeId, vigor: f32) {
        let dormant_share = (1.0 - self.function.apical_dominance) * DORMANT_BUD_VIGOR_FACTOR;
        let mut stack = vec![(root, vigor)];
        while let Some((id, vigor)) = stack.pop() {
            if let Some(info) = skeleton.node_mut(id).growth.as_bio_mut() {
                info.vigor = vigor;
            }
            for child in &skeleton.node(id).children {
                let child_vigor = match skeleton.node(child.node).growth.as_bio() {
                    Some(info) if info.node_type == NodeType::Dormant => vigor * dormant_share,
                    Some(info) => info.vigor_ratio * vigor,
                    None => 0.0,
                };
                stack.push((child.node, child_vigor));
            }
        }
    }

    /// Apply the growth rules to every node, parents first. Nodes created
    /// during this pass are not visited.
    fn simulate_growth(&mut self, skeleton: &mut Skeleton, root: NodeId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let child_count = skeleton.node(id).children.len();
            if self.grow_node(skeleton, id) {
                let node = skeleton.node(id);
                stack.extend(node.children[..child_count].iter().rev().map(|c| c.node));
            }
        }
    }

    /// Returns false when the node stopped growing this iteration
    fn grow_node(&mut self, skeleton: &mut Skeleton, id: NodeId) -> bool {
        let f = self.function;
        let Some(mut info) = skeleton.node(id).growth.as_bio().copied() else {
            return true;
        };

        let activate_dormant = info.node_type == NodeType::Dormant && info.vigor > f.lateral_activation;
        if activate_dormant {
            info.node_type = NodeType::Meristem;
            skeleton.node_mut(id).length = f.branch_length * (info.vigor + 0.1);
        }

        let is_meristem = info.node_type == NodeType::Meristem;
        // Newly activated buds always grow
        let primary_growth = is_meristem && (activate_dormant || info.vigor > f.grow_threshold);
        let secondary_growth = info.vigor > f.grow_threshold
            && info.node_type != NodeType::Ignored
            && info.node_type != NodeType::Dormant;
        let split = is_meristem && info.vigor > f.split_threshold;
        let cut = is_meristem && info.vigor < self.cut_threshold;
        let flower = f.enable_flowering
            && is_meristem
            && info.vigor < f.flower_threshold
            && info.vigor >= self.cut_threshold;

        if cut || flower {
            info.node_type = if cut { NodeType::Cut } else { NodeType::Flower };
            skeleton.node_mut(id).growth = GrowthInfo::Bio(info);
            return false;
        }

        info.age += 1;
        if secondary_growth {
            skeleton.node_mut(id).radius = (1.0 - (-(info.age as f32) * 0.01).exp() + 0.01) * 0.5;
        }

        let (direction, radius, tangent) = {
            let node = skeleton.node(id);
            (node.direction, node.radius, node.tangent)
        };

        if primary_growth {
            let child_direction = normalize_or(
                direction + Vec3::Z * f.gravitropism + random_vec(&mut self.rng, 0.0) * f.randomness,
                direction,
            );
            let child_angle = if split { info.philotaxis_angle + f.philotaxis_angle } else { info.philotaxis_angle };
            let mut child = Node::new(child_direction, tangent, f.branch_length, radius * EXTENSION_TAPER, self.id);
            child.growth = GrowthInfo::Bio(BioNodeInfo::with_angle(NodeType::Meristem, child_angle));
            skeleton.add_child(id, child, 1.0);
            info.node_type = NodeType::Branch;
        }

        if split {
            info.philotaxis_angle += f.philotaxis_angle;
            let angle = info.philotaxis_angle;
            let split_tangent = look_at_rotation(direction) * Vec3::new(angle.cos(), angle.sin(), 0.0);
            let child_direction = normalize_or(direction.lerp(split_tangent, f.split_angle / 90.0), split_tangent);
            let mut child = Node::new(child_direction, tangent, f.branch_length, radius * SPLIT_TAPER, self.id);
            child.growth = GrowthInfo::Bio(BioNodeInfo::new(NodeType::Meristem));
            skeleton.add_child(id, child, 1.0);
            info.node_type = NodeType::Branch;
        }

        skeleton.node_mut(id).growth = GrowthInfo::Bio(info);
        true
    }

    /// Bend grown nodes by the torque of the branch they carry
    fn apply_gravity(&self, skeleton: &mut Skeleton, root: NodeId) {
        let strength = self.function.gravity_strength;
        let mut stack = vec![(root, Quat::IDENTITY)];
        while let Some((id, parent_rotation)) = stack.pop() {
            let node = skeleton.node_mut(id);
            let mut rotation = parent_rotation;
            if let Some(info) = node.growth.as_bio()
                && info.node_type != NodeType::Ignored
            {
                let mut offset = info.center_of_mass - info.absolute_position;
                offset.z = 0.0;
                let torque = info.branch_weight * offset.length();
                let bendiness = (-(info.age as f32 / 2.0 + info.vigor)).exp();
                let angle = torque * bendiness * strength * GRAVITY_ANGLE_MULTIPLIER;
                rotation = rotation * axis_angle(node.direction.cross(-Vec3::Z), angle);
                node.direction = normalize_or(rotation * node.direction, node.direction);
            }
            stack.extend(node.children.iter().map(|c| (c.node, rotation)));
        }
    }
}

fn set_vigor_ratio(skeleton: &mut Skeleton, id: NodeId, ratio: f32) {
    if let Some(info) = skeleton.node_mut(id).growth.as_bio_mut() {
        info.vigor_ratio = ratio;
    }
}

fn update_absolute_positions(skeleton: &mut Skeleton, root: NodeId, position: Vec3) {
    let mut stack = vec![(root, position)];
    while let Some((id, position)) = stack.pop() {
        let node = skeleton.node_mut(id);
        if let Some(info) = node.growth.as_bio_mut() {
            info.absolute_position = position;
        }
        for child in &node.children {
            stack.push((child.node, position + node.direction * node.length * child.position_in_parent));
        }
    }
}

/// Weight (length times radius squared) and center of mass of every subtree
fn update_weights(skeleton: &mut Skeleton, root: NodeId) {
    for id in skeleton.subtree(root).into_iter().rev() {
        let node = skeleton.node(id);
        let Some(info) = node.growth.as_bio() else {
            continue;
        };
        let segment_weight = node.length * node.radius * node.radius;
        let mut center_of_mass = (info.absolute_position + node.direction * node.length * 0.5) * segment_weight;
        let mut total_weight = segment_weight;
        for child in &node.children {
            if let Some(child_info) = skeleton.node(child.node).growth.as_bio() {
                center_of_mass += child_info.center_of_mass * child_info.branch_weight;
                total_weight += child_info.branch_weight;
            }
        }
        let center_of_mass = if total_weight > f32::EPSILON {
            center_of_mass / total_weight
        } else {
            info.absolute_position
        };

        if let Some(info) = skeleton.node_mut(id).growth.as_bio_mut() {
            info.center_of_mass = center_of_mass;
            info.branch_weight = total_weight;
        }
    }
}
