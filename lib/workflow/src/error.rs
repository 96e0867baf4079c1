//! Error types for the workflow crate.
//!
//! `GraphError` covers every rejected edit of a workflow graph. A rejected
//! edit never leaves the graph half-modified. Callers add workflow-level
//! context with rootcause's `.context()` when they need it.

use std::fmt;
use trading_maven_core::{EdgeId, NodeId};

/// Errors from graph and editor operations.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Node with the given ID was not found in the graph.
    NodeNotFound { node_id: NodeId },
    /// Connection with the given ID was not found in the graph.
    EdgeNotFound { edge_id: EdgeId },
    /// The value does not fit the parameter's declared kind.
    InvalidConfigValue {
        type_id: String,
        key: String,
        reason: String,
    },
    /// A configuration edit was attempted with no node selected.
    NoNodeSelected,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeNotFound { node_id } => {
                write!(f, "node not found: {node_id}")
            }
            Self::EdgeNotFound { edge_id } => {
                write!(f, "connection not found: {edge_id}")
            }
            Self::InvalidConfigValue {
                type_id,
                key,
                reason,
            } => {
                write!(f, "invalid value for '{type_id}.{key}': {reason}")
            }
            Self::NoNodeSelected => write!(f, "no node selected"),
        }
    }
}

impl std::error::Error for GraphError {}
