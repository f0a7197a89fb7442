//! Convenient graph manipulation.
//! We use petgraph for cycle detection, but keep our own
//! storage since we need parallel edges and stable indices.

#[allow(clippy::module_inception)]
pub mod graph;

pub mod finalized;
pub mod util;
