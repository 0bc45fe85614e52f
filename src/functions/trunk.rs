//! Trunk function: a single stem rising from the origin

use crate::core::types::Vec3;
use crate::functions::{ShapeFunction, TreeFunction};
use crate::math::SimpleRng;
use crate::math::geometry::{normalize_or, random_vec};
use crate::property::PropertyWrapper;
use crate::skeleton::{Node, Skeleton};

#[derive(Clone, Debug)]
pub struct TrunkFunction {
    pub seed: i32,
    pub length: f32,
    pub start_radius: f32,
    pub end_radius: f32,
    /// Exponent of the radius taper along the trunk
    pub shape: f32,
    /// Segments per unit length
    pub resolution: f32,
    pub up_attraction: PropertyWrapper,
    pub randomness: PropertyWrapper,
    pub children: Vec<ShapeFunction>,
}

impl Default for TrunkFunction {
    fn default() -> Self {
        Self {
            seed: 42,
            length: 10.0,
            start_radius: 0.3,
            end_radius: 0.05,
            shape: 0.5,
            resolution: 3.0,
            up_attraction: PropertyWrapper::constant(0.6),
            randomness: PropertyWrapper::constant(0.1),
            children: Vec::new(),
        }
    }
}

impl TrunkFunction {
    pub fn add_child(&mut self, child: impl Into<ShapeFunction>) {
        self.children.push(child.into());
    }

    fn radius_at(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0).powf(self.shape.max(0.0));
        let radius = self.start_radius + (self.end_radius - self.start_radius) * t;
        radius.max(0.0)
    }
}

impl TreeFunction for TrunkFunction {
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
        let mut rng = SimpleRng::from_seed(self.seed);
        let resolution = if self.resolution.is_finite() { self.resolution.max(0.01) } else { 1.0 };
        let length = if self.length.is_finite() { self.length.max(0.0) } else { 0.0 };
        let segments = ((length * resolution).round() as usize).max(1);
        let segment_length = length / segments as f32;

        let mut direction = Vec3::Z;
        let mut node_id = skeleton.add_stem(
            Node::new(direction, Vec3::X, segment_length, self.radius_at(0.0), id),
            Vec3::ZERO,
        );

        for i in 1..segments {
            let t = i as f32 / segments as f32;
            let randomness = self.randomness.evaluate(t, &mut rng);
            let up_attraction = self.up_attraction.evaluate(t, &mut rng);
            let random_dir = normalize_or(random_vec(&mut rng, 0.0), Vec3::X);
            direction = normalize_or(
                direction + random_dir * randomness / resolution + Vec3::Z * up_attraction / resolution,
                direction,
            );
            let parent_tangent = skeleton.node(node_id).tangent;
            let node = Node::new(direction, parent_tangent, segment_length, self.radius_at(t), id);
            node_id = skeleton.add_child(node_id, node, 1.0);
        }
    }
}
