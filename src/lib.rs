//! Ordered, mutable trees with parent back-references.
//!
//! Nodes live in a [`TreeArena`] and are addressed by [`NodeId`] handles.
//! Every structural change (append, prepend, positional insert, removal,
//! reparenting) keeps the parent and children links consistent and refuses to
//! put a node below itself.
//!
//! ```
//! use serde_json::json;
//! use twig::{NodeBuilder, Payload, TreeArena};
//!
//! let mut arena = TreeArena::new();
//! let root = arena.new_node(Payload::new());
//! let a = NodeBuilder::new().data(json!({"name": "a"})).build(&mut arena).unwrap();
//! let b = NodeBuilder::new().data(json!({"name": "b"})).build(&mut arena).unwrap();
//!
//! arena.append(root, b).unwrap();
//! arena.prepend(root, a).unwrap();
//! assert!(arena.append(a, root).is_err());
//!
//! let names: Vec<_> = arena.node(root).unwrap().map(|n| n.data().get("name").cloned());
//! assert_eq!(names, vec![Some(json!("a")), Some(json!("b"))]);
//! ```

pub mod config;
pub mod domain;
pub mod tree_traits;
pub mod util;

pub use config::Settings;
pub use domain::{
    Children, Node, NodeBuilder, NodeId, NodeKey, NodeRef, Payload, StructureViolation,
    TreeArena, TreeError, TreeResult,
};
pub use tree_traits::TreeNodeConvert;
