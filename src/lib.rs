//! mtree - procedural tree and leaf generation
//!
//! Trees are described by a tree of shape functions (trunk, branches, growth)
//! that populate a node skeleton, which the manifold mesher turns into a
//! polygon mesh. Leaves are generated independently from superformula
//! outlines.

pub mod core;
pub mod math;
pub mod property;
pub mod skeleton;
pub mod functions;
pub mod mesh;
pub mod mesher;
pub mod leaf;
pub mod presets;
pub mod pivot;
pub mod config;
pub mod engine;

pub use config::GenerationConfig;
pub use engine::Engine;
