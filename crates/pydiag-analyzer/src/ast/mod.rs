pub mod nodes;
pub mod visitor;

pub use nodes::*;
pub use visitor::{walk, walk_with_limit, Visitor, WalkError, MAX_WALK_DEPTH};
