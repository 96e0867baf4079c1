//! Request and response bodies of the workflow endpoints.
//!
//! These mirror the backend's JSON exactly. Conversion to and from the
//! in-memory graph lives in [`crate::graph`] and [`crate::definition`].

use crate::definition::TriggerType;
use crate::node::Position;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use trading_maven_core::{EdgeId, NodeId, WorkflowId};

/// A node as sent to and returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireNode {
    /// Client-generated node id.
    pub id: NodeId,
    /// Catalog type identifier.
    #[serde(rename = "type")]
    pub type_id: String,
    /// The node's configuration.
    #[serde(default)]
    pub data: serde_json::Map<String, JsonValue>,
    /// Canvas position.
    #[serde(default)]
    pub position: Position,
}

/// A connection as sent to and returned by the backend.
///
/// Older records carry no connection id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireConnection {
    /// Connection id, absent on older records.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EdgeId>,
    /// Upstream node.
    pub source: NodeId,
    /// Downstream node.
    pub target: NodeId,
}

/// Body of `POST /agentic/workflows` and `PUT /agentic/workflows/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowPayload {
    /// Workflow name.
    pub name: String,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Every node of the graph.
    pub nodes: Vec<WireNode>,
    /// Every connection of the graph.
    pub connections: Vec<WireConnection>,
    /// How the workflow is started.
    pub trigger_type: TriggerType,
}

/// A workflow as returned by the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkflowRecord {
    /// Backend id.
    pub id: WorkflowId,
    /// Workflow name.
    #[serde(default)]
    pub name: String,
    /// Optional free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Stored nodes.
    #[serde(default)]
    pub nodes: Vec<WireNode>,
    /// Stored connections.
    #[serde(default)]
    pub connections: Vec<WireConnection>,
    /// Trigger key, e.g. `"manual"`.
    #[serde(default)]
    pub trigger_type: Option<String>,
    /// Whether the backend will run the workflow.
    #[serde(default)]
    pub is_active: Option<bool>,
}
