//! Shape functions
//!
//! A shape function grows nodes onto the skeleton produced by its parent
//! function. Functions form a tree owned by value: the trunk function at the
//! root, branch and growth functions below it.

pub mod branch;
pub mod crown;
pub mod growth;
pub mod trunk;

pub use branch::{BranchFunction, CrownParams, DistributionParams, GravityParams, SplitParams};
pub use crown::{CrownShape, get_shape_ratio};
pub use growth::GrowthFunction;
pub use trunk::TrunkFunction;

use crate::skeleton::Skeleton;

/// Deepest function tree `Tree::execute_functions` accepts
pub const MAX_FUNCTION_DEPTH: usize = 32;

/// Behavior shared by every shape function
pub trait TreeFunction {
    fn seed(&self) -> i32;

    fn children(&self) -> &[ShapeFunction];

    fn children_mut(&mut self) -> &mut Vec<ShapeFunction>;

    /// Grow this function's nodes. `parent_id` is the id of the function
    /// whose nodes this one builds upon (`None` for the root).
    fn grow(&self, skeleton: &mut Skeleton, id: usize, parent_id: Option<usize>);
}

/// Any node of a function tree
#[derive(Clone, Debug)]
pub enum ShapeFunction {
    Trunk(TrunkFunction),
    Branch(BranchFunction),
    Growth(GrowthFunction),
}

impl ShapeFunction {
    fn as_function(&self) -> &dyn TreeFunction {
        match self {
            ShapeFunction::Trunk(f) => f,
            ShapeFunction::Branch(f) => f,
            ShapeFunction::Growth(f) => f,
        }
    }

    fn as_function_mut(&mut self) -> &mut dyn TreeFunction {
        match self {
            ShapeFunction::Trunk(f) => f,
            ShapeFunction::Branch(f) => f,
            ShapeFunction::Growth(f) => f,
        }
    }

    pub fn seed(&self) -> i32 {
        self.as_function().seed()
    }

    pub fn children(&self) -> &[ShapeFunction] {
        self.as_function().children()
    }

    pub fn add_child(&mut self, child: impl Into<ShapeFunction>) {
        self.as_function_mut().children_mut().push(child.into());
    }

    /// Number of levels in the function tree rooted here
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self, 1)];
        while let Some((function, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            stack.extend(function.children().iter().map(|child| (child, depth + 1)));
        }
        max_depth
    }

    /// Run this function then its children, depth-first, assigning pre-order ids
    pub(crate) fn execute(&self, skeleton: &mut Skeleton, next_id: &mut usize, parent_id: Option<usize>) {
        let id = *next_id;
        *next_id += 1;
        self.as_function().grow(skeleton, id, parent_id);
        for child in self.children() {
            child.execute(skeleton, next_id, Some(id));
        }
    }
}

impl From<TrunkFunction> for ShapeFunction {
    fn from(f: TrunkFunction) -> Self {
        ShapeFunction::Trunk(f)
    }
}

impl From<BranchFunction> for ShapeFunction {
    fn from(f: BranchFunction) -> Self {
        ShapeFunction::Branch(f)
    }
}

impl From<GrowthFunction> for ShapeFunction {
    fn from(f: GrowthFunction) -> Self {
        ShapeFunction::Growth(f)
    }
}
