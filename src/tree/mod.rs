//! Project Structure Tree
//!
//! Snapshot of the four-level physical hierarchy (component, riser, floor, unit) together
//! with the attributes persisted on each node at load time.

pub mod builder;
pub mod node;
pub mod walker;

pub use builder::{TreeBuilder, TreeModel};
pub use node::{Node, Persisted};
pub use walker::{Ancestors, Descendants};
