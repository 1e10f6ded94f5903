//! Tree errors

use thiserror::Error;

use crate::domain::entities::{NodeId, NodeKey};

/// An operation would break one of the tree invariants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureViolation {
    #[error("node {node} is {target} or one of its ancestors")]
    Cycle { node: NodeKey, target: NodeKey },

    #[error("node {node} is already a child of {parent}")]
    AlreadyChild { node: NodeKey, parent: NodeKey },

    #[error("node {node} is not a child of {parent}")]
    NotAChild { node: NodeKey, parent: NodeKey },

    #[error("node {0} listed more than once")]
    DuplicateChild(NodeKey),
}

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("structure violation: {0}")]
    StructureViolation(#[from] StructureViolation),

    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl TreeError {
    pub fn is_structure_violation(&self) -> bool {
        matches!(self, TreeError::StructureViolation(_))
    }

    pub fn violation(&self) -> Option<&StructureViolation> {
        match self {
            TreeError::StructureViolation(v) => Some(v),
            _ => None,
        }
    }
}

pub type TreeResult<T> = Result<T, TreeError>;
