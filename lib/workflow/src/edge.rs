//! Directed connections between workflow nodes.

use trading_maven_core::{EdgeId, NodeId};

/// A connection from one node's output to another node's input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowEdge {
    /// Unique identifier for this connection.
    pub id: EdgeId,
    /// The upstream node.
    pub source: NodeId,
    /// The downstream node.
    pub target: NodeId,
    /// Render the connection with flow animation (editor only).
    pub animated: bool,
}

impl WorkflowEdge {
    /// Creates an animated connection with a fresh ID, as drawn in the editor.
    #[must_use]
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self {
            id: EdgeId::generate(),
            source,
            target,
            animated: true,
        }
    }

    /// Creates a connection with a specific ID and no animation.
    #[must_use]
    pub fn with_id(id: EdgeId, source: NodeId, target: NodeId) -> Self {
        Self {
            id,
            source,
            target,
            animated: false,
        }
    }
}
