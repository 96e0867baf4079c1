//! Workflow nodes as placed on the canvas.
//!
//! A node has:
//! - A unique ID within the workflow
//! - The catalog type it was created from
//! - A canvas position, changed by dragging
//! - Its own configuration, seeded from the type's defaults

use crate::config::NodeConfig;
use serde::{Deserialize, Serialize};
use trading_maven_core::NodeId;

/// Canvas coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Creates a position.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns this position shifted by the given offsets.
    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// A workflow node.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowNode {
    /// Unique identifier for this node within the workflow.
    pub id: NodeId,
    /// Catalog type this node was created from.
    pub type_id: String,
    /// Display label (editor only, never sent to the backend).
    pub label: String,
    /// Canvas position.
    pub position: Position,
    /// Current configuration.
    pub config: NodeConfig,
}

impl WorkflowNode {
    /// Creates a node with a freshly generated ID.
    #[must_use]
    pub fn new(
        type_id: impl Into<String>,
        label: impl Into<String>,
        position: Position,
        config: NodeConfig,
    ) -> Self {
        Self::with_id(NodeId::generate(), type_id, label, position, config)
    }

    /// Creates a node with a specific ID.
    #[must_use]
    pub fn with_id(
        id: NodeId,
        type_id: impl Into<String>,
        label: impl Into<String>,
        position: Position,
        config: NodeConfig,
    ) -> Self {
        Self {
            id,
            type_id: type_id.into(),
            label: label.into(),
            position,
            config,
        }
    }
}
