pub mod lattice;
pub mod node;
pub mod resolver;

pub use lattice::Graph;
pub use node::Node;
pub use resolver::{Candidate, ForcedSlice, GraphResolver};
