//! Domain layer: the tree itself.
//!
//! Independent of external concerns (no I/O, no config loading).

pub mod arena;
pub mod builder;
pub mod entities;
pub mod error;
pub mod node_ref;

pub use arena::{Node, TreeArena};
pub use builder::NodeBuilder;
pub use entities::{NodeId, NodeKey, Payload};
pub use error::{StructureViolation, TreeError, TreeResult};
pub use node_ref::{Children, NodeRef};
