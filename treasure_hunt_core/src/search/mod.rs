//! Target search: candidate discovery, ranking and path finding over the
//! tile graph.

pub mod find;
pub mod heuristic;
pub mod path;
pub mod prioritize;

pub use find::find;
pub use path::{Avoid, find_path};
pub use prioritize::prioritize;
