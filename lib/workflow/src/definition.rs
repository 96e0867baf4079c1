//! Workflow definition types.
//!
//! A workflow is a named automation that consists of:
//! - Metadata (name, description, trigger type)
//! - A directed graph of nodes
//! - The backend identity, once it has been saved

use crate::catalog::NodeCatalog;
use crate::graph::WorkflowGraph;
use crate::wire::{WorkflowPayload, WorkflowRecord};
use serde::{Deserialize, Serialize};
use trading_maven_core::WorkflowId;

/// How a workflow is started.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerType {
    /// Started on demand from the editor.
    #[default]
    Manual,
    /// Started by the backend's scheduler.
    Schedule,
}

impl TriggerType {
    /// Reads a backend trigger string; anything unrecognized is manual.
    #[must_use]
    pub fn from_key(key: &str) -> Self {
        match key {
            "schedule" => Self::Schedule,
            _ => Self::Manual,
        }
    }
}

/// A workflow being edited.
///
/// A workflow without a server id is a draft. The first successful save
/// assigns one, and later saves update that record.
#[derive(Debug, Clone, Default)]
pub struct Workflow {
    server_id: Option<WorkflowId>,
    /// Human-readable name.
    pub name: String,
    /// Description of what this workflow does.
    pub description: Option<String>,
    /// The nodes and connections.
    pub graph: WorkflowGraph,
    /// How the workflow is started.
    pub trigger_type: TriggerType,
}

impl Workflow {
    /// Creates an empty draft.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the backend identity, if the workflow has been saved.
    #[must_use]
    pub fn server_id(&self) -> Option<WorkflowId> {
        self.server_id
    }

    /// Whether the workflow has never been saved.
    #[must_use]
    pub fn is_draft(&self) -> bool {
        self.server_id.is_none()
    }

    /// Records the identity assigned by the backend.
    pub fn adopt_server_id(&mut self, id: WorkflowId) {
        self.server_id = Some(id);
    }

    /// Builds the create/update request body.
    #[must_use]
    pub fn to_payload(&self) -> WorkflowPayload {
        let (nodes, connections) = self.graph.to_wire();
        WorkflowPayload {
            name: self.name.clone(),
            description: self.description.clone(),
            nodes,
            connections,
            trigger_type: self.trigger_type,
        }
    }

    /// Rebuilds a workflow from a backend record.
    #[must_use]
    pub fn from_record(catalog: &NodeCatalog, record: WorkflowRecord) -> Self {
        Self {
            server_id: Some(record.id),
            name: record.name,
            description: record.description,
            graph: WorkflowGraph::from_wire(catalog, record.nodes, record.connections),
            trigger_type: record
                .trigger_type
                .as_deref()
                .map(TriggerType::from_key)
                .unwrap_or_default(),
        }
    }

    /// Builds a draft from a request body, e.g. one read from a file.
    #[must_use]
    pub fn from_payload(catalog: &NodeCatalog, payload: WorkflowPayload) -> Self {
        Self {
            server_id: None,
            name: payload.name,
            description: payload.description,
            graph: WorkflowGraph::from_wire(catalog, payload.nodes, payload.connections),
            trigger_type: payload.trigger_type,
        }
    }
}
