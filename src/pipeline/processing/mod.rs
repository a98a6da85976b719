// Per-tree stages, in the order the pipeline runs them

pub mod parser;
pub mod degrade;
pub mod normalize;
pub mod flatten;
