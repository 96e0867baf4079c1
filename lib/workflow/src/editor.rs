//! Editor interaction state: palette drops, connections, selection and
//! configuration edits.
//!
//! The editor holds only the ephemeral selection. Everything it changes is
//! applied to the workflow's graph, which remains the single source of truth.

use crate::catalog::{CategoryGroup, NodeCatalog};
use crate::config::ParamValue;
use crate::console::ExecutionConsole;
use crate::definition::Workflow;
use crate::edge::WorkflowEdge;
use crate::error::GraphError;
use crate::node::{Position, WorkflowNode};
use trading_maven_core::{EdgeId, NodeId};

/// Node dimensions used to center a dropped node under the cursor.
pub const NODE_WIDTH: f64 = 160.0;
pub const NODE_HEIGHT: f64 = 60.0;

/// Selection state of the editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditorState {
    #[default]
    Idle,
    /// The configuration panel is bound to this node.
    NodeSelected(NodeId),
}

/// A workflow open in the editor.
#[derive(Debug)]
pub struct WorkflowEditor {
    catalog: NodeCatalog,
    workflow: Workflow,
    state: EditorState,
    console: ExecutionConsole,
}

impl WorkflowEditor {
    /// Opens a workflow for editing.
    #[must_use]
    pub fn new(catalog: NodeCatalog, workflow: Workflow) -> Self {
        Self {
            catalog,
            workflow,
            state: EditorState::Idle,
            console: ExecutionConsole::new(),
        }
    }

    /// Palette sections to render.
    #[must_use]
    pub fn palette(&self) -> &[CategoryGroup] {
        self.catalog.categories()
    }

    #[must_use]
    pub fn catalog(&self) -> &NodeCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    #[must_use]
    pub fn state(&self) -> &EditorState {
        &self.state
    }

    #[must_use]
    pub fn console(&self) -> &ExecutionConsole {
        &self.console
    }

    /// Borrows the workflow and console together for save and execute.
    pub fn split_mut(&mut self) -> (&mut Workflow, &mut ExecutionConsole) {
        (&mut self.workflow, &mut self.console)
    }

    /// Drops a palette entry with the cursor at `cursor`.
    ///
    /// The new node is centered under the cursor. Selection is unchanged.
    pub fn drop_node(&mut self, type_id: &str, cursor: Position) -> NodeId {
        let label = self
            .catalog
            .node_type(type_id)
            .map_or_else(|| type_id.to_string(), |t| t.display_name.clone());
        let position = cursor.offset(-NODE_WIDTH / 2.0, -NODE_HEIGHT / 2.0);

        let node_id = self
            .workflow
            .graph
            .add_node(&self.catalog, type_id, position, label.clone());
        self.console.info(format!("Added node {label}"));
        node_id
    }

    /// Connects an output handle to an input handle.
    ///
    /// # Errors
    ///
    /// Returns an error if either node doesn't exist.
    pub fn connect_handles(
        &mut self,
        source: &NodeId,
        target: &NodeId,
    ) -> Result<WorkflowEdge, GraphError> {
        let edge = self.workflow.graph.connect(source, target)?;
        let source_label = self.label_of(source);
        let target_label = self.label_of(target);
        self.console
            .info(format!("Connected {source_label} to {target_label}"));
        Ok(edge)
    }

    /// Selects a node and binds the configuration panel to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the node doesn't exist.
    pub fn click_node(&mut self, node_id: &NodeId) -> Result<(), GraphError> {
        if !self.workflow.graph.contains_node(node_id) {
            return Err(GraphError::NodeNotFound {
                node_id: node_id.clone(),
            });
        }
        self.state = EditorState::NodeSelected(node_id.clone());
        Ok(())
    }

    /// Clears the selection.
    pub fn click_background(&mut self) {
        self.state = EditorState::Idle;
    }

    /// Moves a node by a drag delta.
    ///
    /// # Errors
    ///
    /// Returns an error if the node doesn't exist.
    pub fn drag_node(&mut self, node_id: &NodeId, dx: f64, dy: f64) -> Result<(), GraphError> {
        let current = self
            .workflow
            .graph
            .get_node(node_id)
            .map(|n| n.position)
            .ok_or_else(|| GraphError::NodeNotFound {
                node_id: node_id.clone(),
            })?;
        self.workflow
            .graph
            .move_node(node_id, current.offset(dx, dy))
    }

    /// The currently selected node, if any.
    #[must_use]
    pub fn selected_node(&self) -> Option<&WorkflowNode> {
        match &self.state {
            EditorState::Idle => None,
            EditorState::NodeSelected(id) => self.workflow.graph.get_node(id),
        }
    }

    /// Applies one configuration panel edit to the selected node.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is selected or the value is rejected.
    pub fn edit_selected_config(
        &mut self,
        key: &str,
        value: impl Into<ParamValue>,
    ) -> Result<(), GraphError> {
        let EditorState::NodeSelected(node_id) = &self.state else {
            return Err(GraphError::NoNodeSelected);
        };
        self.workflow
            .graph
            .update_node_config(&self.catalog, node_id, key, value.into())
    }

    /// Deletes the selected node and returns to idle.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is selected.
    pub fn delete_selected(&mut self) -> Result<WorkflowNode, GraphError> {
        let EditorState::NodeSelected(node_id) = std::mem::take(&mut self.state) else {
            return Err(GraphError::NoNodeSelected);
        };
        self.delete_node(&node_id)
    }

    /// Deletes a node and its connections.
    ///
    /// # Errors
    ///
    /// Returns an error if the node doesn't exist.
    pub fn delete_node(&mut self, node_id: &NodeId) -> Result<WorkflowNode, GraphError> {
        let node = self
            .workflow
            .graph
            .delete_node(node_id)
            .ok_or_else(|| GraphError::NodeNotFound {
                node_id: node_id.clone(),
            })?;
        if self.state == EditorState::NodeSelected(node_id.clone()) {
            self.state = EditorState::Idle;
        }
        self.console.info(format!("Removed node {}", node.label));
        Ok(node)
    }

    /// Removes one connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection doesn't exist.
    pub fn remove_connection(&mut self, edge_id: &EdgeId) -> Result<(), GraphError> {
        self.workflow.graph.remove_edge(edge_id)?;
        self.console.info("Removed connection");
        Ok(())
    }

    fn label_of(&self, node_id: &NodeId) -> String {
        self.workflow
            .graph
            .get_node(node_id)
            .map_or_else(|| node_id.to_string(), |n| n.label.clone())
    }
}
