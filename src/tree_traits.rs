use serde_json::Value;
use termtree::Tree;
use tracing::instrument;

use crate::config::Settings;
use crate::domain::{NodeId, NodeRef, TreeArena, TreeError, TreeResult};

pub trait TreeNodeConvert {
    fn to_tree_string(&self, label_key: &str) -> Tree<String>;
}

impl TreeNodeConvert for NodeRef<'_> {
    #[instrument(level = "trace", skip(self))]
    fn to_tree_string(&self, label_key: &str) -> Tree<String> {
        let leaves: Vec<_> = self
            .iter()
            .map(|child| child.to_tree_string(label_key))
            .collect();

        Tree::new(label(self, label_key)).with_leaves(leaves)
    }
}

/// String payload values are shown bare, everything else as JSON text.
fn label(node: &NodeRef<'_>, label_key: &str) -> String {
    match node.data().get(label_key) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => node.key().to_string(),
    }
}

impl TreeArena {
    /// Renders the subtree rooted at `node` as an indented tree.
    pub fn render(&self, node: NodeId, settings: &Settings) -> TreeResult<String> {
        let view = self.node(node).ok_or(TreeError::NodeNotFound(node))?;
        Ok(view.to_tree_string(&settings.label_key).to_string())
    }
}
