//! Mathematical utilities and data structures

pub mod aabb;
pub mod geometry;
pub mod rng;

pub use aabb::{Aabb, Rect};
pub use rng::SimpleRng;
