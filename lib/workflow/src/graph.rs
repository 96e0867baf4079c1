//! Workflow graph implementation using petgraph.
//!
//! Workflows are directed graphs where:
//! - Nodes are trading-automation steps placed from the catalog
//! - Edges run from an upstream node to a downstream node
//!
//! A stable graph is used so that removing a node never renumbers the
//! remaining ones. Every edge references two present nodes at all times.

use crate::catalog::NodeCatalog;
use crate::config::{NodeConfig, ParamValue};
use crate::edge::WorkflowEdge;
use crate::error::GraphError;
use crate::node::{Position, WorkflowNode};
use crate::wire::{WireConnection, WireNode};
use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use trading_maven_core::{EdgeId, NodeId};

/// A workflow graph using petgraph's stable directed graph.
#[derive(Debug, Clone, Default)]
pub struct WorkflowGraph {
    /// The underlying directed graph.
    graph: StableDiGraph<WorkflowNode, WorkflowEdge>,
    /// Map from NodeId to petgraph's NodeIndex for O(1) lookup.
    node_index_map: HashMap<NodeId, NodeIndex>,
    /// Map from EdgeId to petgraph's EdgeIndex.
    edge_index_map: HashMap<EdgeId, EdgeIndex>,
}

impl WorkflowGraph {
    /// Creates a new empty workflow graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Places a new node of the given catalog type.
    ///
    /// The node gets a fresh ID and the type's default configuration. Unknown
    /// types are accepted with an empty configuration.
    pub fn add_node(
        &mut self,
        catalog: &NodeCatalog,
        type_id: &str,
        position: Position,
        label: impl Into<String>,
    ) -> NodeId {
        let node = WorkflowNode::new(
            type_id,
            label,
            position,
            catalog.default_config(type_id),
        );
        self.insert_node(node)
    }

    /// Inserts a fully built node.
    ///
    /// A node whose ID is already present replaces the existing node's data
    /// and keeps its connections.
    pub fn insert_node(&mut self, node: WorkflowNode) -> NodeId {
        let node_id = node.id.clone();
        if let Some(&index) = self.node_index_map.get(&node_id) {
            self.graph[index] = node;
            return node_id;
        }
        let index = self.graph.add_node(node);
        self.node_index_map.insert(node_id.clone(), index);
        node_id
    }

    /// Moves a node. Connections are unaffected.
    ///
    /// # Errors
    ///
    /// Returns an error if the node doesn't exist.
    pub fn move_node(&mut self, node_id: &NodeId, position: Position) -> Result<(), GraphError> {
        let node = self.get_node_mut(node_id).ok_or_else(|| GraphError::NodeNotFound {
            node_id: node_id.clone(),
        })?;
        node.position = position;
        Ok(())
    }

    /// Replaces one configuration entry of a node.
    ///
    /// When the catalog knows the node's type and declares the key, the value
    /// must fit the parameter's kind. Undeclared keys and nodes of unknown
    /// types accept any value.
    ///
    /// # Errors
    ///
    /// Returns an error if the node doesn't exist or the entry is rejected by
    /// the type's schema. The configuration is unchanged on error.
    pub fn update_node_config(
        &mut self,
        catalog: &NodeCatalog,
        node_id: &NodeId,
        key: &str,
        value: ParamValue,
    ) -> Result<(), GraphError> {
        let node = self.get_node_mut(node_id).ok_or_else(|| GraphError::NodeNotFound {
            node_id: node_id.clone(),
        })?;

        if let Some(node_type) = catalog.node_type(&node.type_id) {
            match node_type.param(key) {
                Some(spec) => {
                    spec.check(&value)
                        .map_err(|reason| GraphError::InvalidConfigValue {
                            type_id: node.type_id.clone(),
                            key: key.to_string(),
                            reason,
                        })?;
                }
                None => {
                    tracing::debug!(type_id = %node.type_id, key, "setting undeclared config key");
                }
            }
        }

        node.config.set(key, value);
        Ok(())
    }

    /// Connects two nodes with a new animated edge.
    ///
    /// Self-loops and repeated connections between the same pair are allowed.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving the graph unchanged, if either node doesn't
    /// exist.
    pub fn connect(
        &mut self,
        source_id: &NodeId,
        target_id: &NodeId,
    ) -> Result<WorkflowEdge, GraphError> {
        let edge = WorkflowEdge::new(source_id.clone(), target_id.clone());
        self.insert_edge(edge.clone())?;
        Ok(edge)
    }

    /// Inserts a fully built edge.
    ///
    /// # Errors
    ///
    /// Returns an error if either endpoint doesn't exist.
    pub fn insert_edge(&mut self, edge: WorkflowEdge) -> Result<(), GraphError> {
        let source_index = *self
            .node_index_map
            .get(&edge.source)
            .ok_or_else(|| GraphError::NodeNotFound {
                node_id: edge.source.clone(),
            })?;

        let target_index = *self
            .node_index_map
            .get(&edge.target)
            .ok_or_else(|| GraphError::NodeNotFound {
                node_id: edge.target.clone(),
            })?;

        if let Some(old) = self.edge_index_map.remove(&edge.id) {
            self.graph.remove_edge(old);
        }
        let edge_id = edge.id.clone();
        let index = self.graph.add_edge(source_index, target_index, edge);
        self.edge_index_map.insert(edge_id, index);
        Ok(())
    }

    /// Removes a single connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection doesn't exist.
    pub fn remove_edge(&mut self, edge_id: &EdgeId) -> Result<WorkflowEdge, GraphError> {
        let index = self
            .edge_index_map
            .remove(edge_id)
            .ok_or_else(|| GraphError::EdgeNotFound {
                edge_id: edge_id.clone(),
            })?;
        self.graph
            .remove_edge(index)
            .ok_or_else(|| GraphError::EdgeNotFound {
                edge_id: edge_id.clone(),
            })
    }

    /// Removes a node together with every edge that touches it.
    pub fn delete_node(&mut self, node_id: &NodeId) -> Option<WorkflowNode> {
        let index = self.node_index_map.remove(node_id)?;

        let incident: Vec<EdgeId> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .chain(self.graph.edges_directed(index, Direction::Incoming))
            .map(|e| e.weight().id.clone())
            .collect();
        for edge_id in &incident {
            self.edge_index_map.remove(edge_id);
        }

        // Removing the node drops its incident edges in the same step
        self.graph.remove_node(index)
    }

    /// Returns a reference to a node by its ID.
    #[must_use]
    pub fn get_node(&self, node_id: &NodeId) -> Option<&WorkflowNode> {
        let index = self.node_index_map.get(node_id)?;
        self.graph.node_weight(*index)
    }

    /// Returns a mutable reference to a node by its ID.
    pub fn get_node_mut(&mut self, node_id: &NodeId) -> Option<&mut WorkflowNode> {
        let index = self.node_index_map.get(node_id)?;
        self.graph.node_weight_mut(*index)
    }

    /// Returns a connection by its ID.
    #[must_use]
    pub fn get_edge(&self, edge_id: &EdgeId) -> Option<&WorkflowEdge> {
        let index = self.edge_index_map.get(edge_id)?;
        self.graph.edge_weight(*index)
    }

    /// Returns all nodes in the graph.
    pub fn nodes(&self) -> impl Iterator<Item = &WorkflowNode> {
        self.graph
            .node_indices()
            .filter_map(|idx| self.graph.node_weight(idx))
    }

    /// Returns all edges in the graph.
    pub fn edges(&self) -> impl Iterator<Item = &WorkflowEdge> {
        self.graph
            .edge_indices()
            .filter_map(|idx| self.graph.edge_weight(idx))
    }

    /// Returns whether the node exists.
    #[must_use]
    pub fn contains_node(&self, node_id: &NodeId) -> bool {
        self.node_index_map.contains_key(node_id)
    }

    /// Returns the number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns the number of edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Lists required parameters that are unset or blank, as
    /// `(node, parameter)` pairs. Nodes of unknown types are skipped.
    #[must_use]
    pub fn missing_required(&self, catalog: &NodeCatalog) -> Vec<(NodeId, String)> {
        self.nodes()
            .filter_map(|node| catalog.node_type(&node.type_id).map(|t| (node, t)))
            .flat_map(|(node, node_type)| {
                node_type
                    .params
                    .iter()
                    .filter(|p| p.required)
                    .filter(move |p| match node.config.get(&p.name) {
                        None => true,
                        Some(ParamValue::Text(s)) => s.trim().is_empty(),
                        Some(ParamValue::Number(_)) => false,
                    })
                    .map(move |p| (node.id.clone(), p.name.clone()))
            })
            .collect()
    }

    /// Returns nodes that have no incoming edges (entry points).
    pub fn entry_nodes(&self) -> Vec<&WorkflowNode> {
        self.graph
            .node_indices()
            .filter(|&idx| {
                self.graph
                    .edges_directed(idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .filter_map(|idx| self.graph.node_weight(idx))
            .collect()
    }

    /// Returns the successors (downstream nodes) of a given node.
    pub fn successors(&self, node_id: &NodeId) -> Vec<&WorkflowNode> {
        self.neighbors(node_id, Direction::Outgoing)
    }

    /// Returns the predecessors (upstream nodes) of a given node.
    pub fn predecessors(&self, node_id: &NodeId) -> Vec<&WorkflowNode> {
        self.neighbors(node_id, Direction::Incoming)
    }

    fn neighbors(&self, node_id: &NodeId, direction: Direction) -> Vec<&WorkflowNode> {
        let Some(&index) = self.node_index_map.get(node_id) else {
            return Vec::new();
        };

        self.graph
            .edges_directed(index, direction)
            .filter_map(|edge| {
                let other = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                self.graph.node_weight(other)
            })
            .collect()
    }

    /// Converts the graph to the backend's node and connection lists.
    ///
    /// Labels and styling flags stay behind.
    #[must_use]
    pub fn to_wire(&self) -> (Vec<WireNode>, Vec<WireConnection>) {
        let nodes = self
            .nodes()
            .map(|node| WireNode {
                id: node.id.clone(),
                type_id: node.type_id.clone(),
                data: node.config.to_json_map(),
                position: node.position,
            })
            .collect();

        let connections = self
            .edges()
            .map(|edge| WireConnection {
                id: Some(edge.id.clone()),
                source: edge.source.clone(),
                target: edge.target.clone(),
            })
            .collect();

        (nodes, connections)
    }

    /// Rebuilds a graph from the backend's node and connection lists.
    ///
    /// Node labels come from the catalog. Connections whose endpoints are
    /// missing are dropped; connections without an ID get a fresh one.
    #[must_use]
    pub fn from_wire(
        catalog: &NodeCatalog,
        nodes: Vec<WireNode>,
        connections: Vec<WireConnection>,
    ) -> Self {
        let mut graph = Self::new();

        for wire in nodes {
            let label = catalog
                .node_type(&wire.type_id)
                .map_or_else(|| wire.type_id.clone(), |t| t.display_name.clone());
            graph.insert_node(WorkflowNode::with_id(
                wire.id,
                wire.type_id,
                label,
                wire.position,
                NodeConfig::from_json_map(&wire.data),
            ));
        }

        for wire in connections {
            let id = wire.id.unwrap_or_else(EdgeId::generate);
            let edge = WorkflowEdge::with_id(id, wire.source, wire.target);
            if let Err(e) = graph.insert_edge(edge) {
                tracing::warn!(error = %e, "dropping connection with missing endpoint");
            }
        }

        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NodeTypesResponse;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashSet;

    fn catalog() -> NodeCatalog {
        NodeCatalog::fallback()
    }

    fn assert_no_dangling_edges(graph: &WorkflowGraph) {
        for edge in graph.edges() {
            assert!(graph.contains_node(&edge.source), "dangling source {}", edge.source);
            assert!(graph.contains_node(&edge.target), "dangling target {}", edge.target);
            assert!(graph.get_edge(&edge.id).is_some());
        }
    }

    #[test]
    fn add_node_seeds_default_config() {
        let mut graph = WorkflowGraph::new();
        let id = graph.add_node(&catalog(), "MarketOrder", Position::new(1.0, 2.0), "Market Order");

        let node = graph.get_node(&id).expect("node");
        assert_eq!(node.type_id, "MarketOrder");
        assert_eq!(node.config.get("symbol"), Some(&ParamValue::text("EURUSD")));
        assert_eq!(node.position, Position::new(1.0, 2.0));
    }

    #[test]
    fn add_unknown_type_has_empty_config() {
        let mut graph = WorkflowGraph::new();
        let id = graph.add_node(&catalog(), "Mystery", Position::default(), "Mystery");
        assert!(graph.get_node(&id).expect("node").config.is_empty());
    }

    #[test]
    fn move_node_leaves_edges_alone() {
        let mut graph = WorkflowGraph::new();
        let a = graph.add_node(&catalog(), "ManualTrigger", Position::default(), "a");
        let b = graph.add_node(&catalog(), "MarketOrder", Position::default(), "b");
        graph.connect(&a, &b).expect("connect");

        graph.move_node(&a, Position::new(50.0, 60.0)).expect("move");

        assert_eq!(graph.get_node(&a).expect("a").position, Position::new(50.0, 60.0));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn connect_rejects_missing_node() {
        let mut graph = WorkflowGraph::new();
        let a = graph.add_node(&catalog(), "ManualTrigger", Position::default(), "a");

        let result = graph.connect(&a, &NodeId::from("ghost"));
        assert_eq!(
            result.unwrap_err(),
            GraphError::NodeNotFound {
                node_id: NodeId::from("ghost")
            }
        );
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn connect_allows_self_loops_and_parallel_edges() {
        let mut graph = WorkflowGraph::new();
        let a = graph.add_node(&catalog(), "ManualTrigger", Position::default(), "a");
        let b = graph.add_node(&catalog(), "MarketOrder", Position::default(), "b");

        graph.connect(&a, &a).expect("self loop");
        let first = graph.connect(&a, &b).expect("first");
        let second = graph.connect(&a, &b).expect("second");

        assert_ne!(first.id, second.id);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn delete_node_cascades_to_incident_edges() {
        let mut graph = WorkflowGraph::new();
        let a = graph.add_node(&catalog(), "ManualTrigger", Position::default(), "a");
        let b = graph.add_node(&catalog(), "MarketOrder", Position::default(), "b");
        let c = graph.add_node(&catalog(), "DashboardNotification", Position::default(), "c");
        graph.connect(&a, &b).expect("a-b");
        let kept = graph.connect(&a, &c).expect("a-c");
        graph.connect(&b, &c).expect("b-c");
        graph.connect(&b, &b).expect("b-b");

        let removed = graph.delete_node(&b).expect("removed");

        assert_eq!(removed.id, b);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edges().next().map(|e| &e.id), Some(&kept.id));
        assert_no_dangling_edges(&graph);
    }

    #[test]
    fn remove_edge_by_id() {
        let mut graph = WorkflowGraph::new();
        let a = graph.add_node(&catalog(), "ManualTrigger", Position::default(), "a");
        let b = graph.add_node(&catalog(), "MarketOrder", Position::default(), "b");
        let edge = graph.connect(&a, &b).expect("connect");

        graph.remove_edge(&edge.id).expect("remove");
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.remove_edge(&edge.id).is_err());
    }

    #[test]
    fn update_config_validates_against_schema() {
        let catalog = catalog();
        let mut graph = WorkflowGraph::new();
        let order = graph.add_node(&catalog, "MarketOrder", Position::default(), "order");

        graph
            .update_node_config(&catalog, &order, "volume", ParamValue::text("0.05"))
            .expect("valid volume");
        assert_eq!(
            graph.get_node(&order).expect("order").config.get("volume"),
            Some(&ParamValue::text("0.05"))
        );

        graph
            .update_node_config(&catalog, &order, "leverage", ParamValue::Number(10.0))
            .expect("undeclared keys are kept");
        assert_eq!(
            graph.get_node(&order).expect("order").config.get("leverage"),
            Some(&ParamValue::Number(10.0))
        );

        let bad = graph.update_node_config(&catalog, &order, "order_type", ParamValue::text("HOLD"));
        assert!(matches!(bad, Err(GraphError::InvalidConfigValue { .. })));
        assert_eq!(
            graph.get_node(&order).expect("order").config.get("order_type"),
            Some(&ParamValue::text("BUY"))
        );
    }

    #[test]
    fn backend_catalog_accepts_undeclared_keys_and_checks_declared_ones() {
        let body = serde_json::json!({
            "categories": {
                "orders": {
                    "name": "Order Execution",
                    "nodes": [{
                        "type": "MarketOrder",
                        "name": "Market Order",
                        "config": {
                            "symbol": {"type": "string", "required": true},
                            "action": {"type": "select", "options": ["BUY", "SELL"], "required": true},
                            "volume": {"type": "number", "default": 0.01, "required": true}
                        }
                    }]
                }
            }
        });
        let response: NodeTypesResponse = serde_json::from_value(body).expect("decode");
        let catalog = NodeCatalog::from_response(response);
        let mut graph = WorkflowGraph::new();
        let order = graph.add_node(&catalog, "MarketOrder", Position::default(), "order");

        graph
            .update_node_config(&catalog, &order, "order_type", ParamValue::text("BUY"))
            .expect("open map");
        graph
            .update_node_config(&catalog, &order, "action", ParamValue::text("SELL"))
            .expect("declared option");

        let bad = graph.update_node_config(&catalog, &order, "action", ParamValue::text("HOLD"));
        assert!(matches!(bad, Err(GraphError::InvalidConfigValue { .. })));
        let bad = graph.update_node_config(&catalog, &order, "volume", ParamValue::text("lots"));
        assert!(matches!(bad, Err(GraphError::InvalidConfigValue { .. })));

        let config = &graph.get_node(&order).expect("order").config;
        assert_eq!(config.get("order_type"), Some(&ParamValue::text("BUY")));
        assert_eq!(config.get("action"), Some(&ParamValue::text("SELL")));
        assert_eq!(config.get("volume"), Some(&ParamValue::Number(0.01)));
    }

    #[test]
    fn missing_required_lists_blank_and_unset_params() {
        let catalog = catalog();
        let mut graph = WorkflowGraph::new();
        graph.add_node(&catalog, "ManualTrigger", Position::default(), "trigger");
        let order = graph.add_node(&catalog, "MarketOrder", Position::default(), "order");
        assert!(graph.missing_required(&catalog).is_empty());

        graph
            .update_node_config(&catalog, &order, "symbol", ParamValue::text("  "))
            .expect("blank text");
        assert_eq!(
            graph.missing_required(&catalog),
            vec![(order.clone(), "symbol".to_string())]
        );

        graph.add_node(&catalog, "CustomScript", Position::default(), "custom");
        assert_eq!(graph.missing_required(&catalog).len(), 1);
    }

    #[test]
    fn update_config_on_unknown_type_is_open() {
        let catalog = catalog();
        let mut graph = WorkflowGraph::new();
        let node = graph.add_node(&catalog, "CustomScript", Position::default(), "custom");

        graph
            .update_node_config(&catalog, &node, "anything", ParamValue::text("goes"))
            .expect("open map");
        assert_eq!(graph.get_node(&node).expect("node").config.len(), 1);
    }

    #[test]
    fn successors_and_entry_nodes() {
        let mut graph = WorkflowGraph::new();
        let a = graph.add_node(&catalog(), "ManualTrigger", Position::default(), "a");
        let b = graph.add_node(&catalog(), "MarketOrder", Position::default(), "b");
        graph.connect(&a, &b).expect("connect");

        let entries: Vec<&NodeId> = graph.entry_nodes().into_iter().map(|n| &n.id).collect();
        assert_eq!(entries, vec![&a]);
        assert_eq!(graph.successors(&a)[0].id, b);
        assert_eq!(graph.predecessors(&b)[0].id, a);
    }

    #[test]
    fn random_edits_never_leave_dangling_edges() {
        let catalog = catalog();
        let types = ["ManualTrigger", "MarketOrder", "DashboardNotification"];
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _ in 0..20 {
            let mut graph = WorkflowGraph::new();
            let mut ids: Vec<NodeId> = Vec::new();
            let mut seen = HashSet::new();

            for _ in 0..200 {
                match rng.random_range(0..3) {
                    0 => {
                        let t = types[rng.random_range(0..types.len())];
                        let id = graph.add_node(&catalog, t, Position::default(), t);
                        assert!(seen.insert(id.clone()), "node id reused");
                        ids.push(id);
                    }
                    1 if !ids.is_empty() => {
                        let victim = ids.swap_remove(rng.random_range(0..ids.len()));
                        assert!(graph.delete_node(&victim).is_some());
                    }
                    _ if !ids.is_empty() => {
                        let s = &ids[rng.random_range(0..ids.len())];
                        let t = &ids[rng.random_range(0..ids.len())];
                        graph.connect(s, t).expect("both present");
                    }
                    _ => {}
                }
                assert_no_dangling_edges(&graph);
            }
            assert_eq!(graph.node_count(), ids.len());
        }
    }

    #[test]
    fn wire_round_trip_preserves_nodes_and_edges() {
        let catalog = catalog();
        let mut graph = WorkflowGraph::new();
        let a = graph.add_node(&catalog, "ManualTrigger", Position::new(100.0, 50.0), "Start");
        let b = graph.add_node(&catalog, "MarketOrder", Position::new(320.5, 75.25), "Buy");
        let c = graph.add_node(&catalog, "Unlisted", Position::new(-4.0, 9.0), "Other");
        graph
            .update_node_config(&catalog, &b, "volume", ParamValue::text("0.01"))
            .expect("volume");
        graph
            .update_node_config(&catalog, &c, "depth", ParamValue::Number(3.0))
            .expect("open");
        graph.connect(&a, &b).expect("a-b");
        graph.connect(&b, &c).expect("b-c");

        let (nodes, connections) = graph.to_wire();
        let restored = WorkflowGraph::from_wire(&catalog, nodes, connections);

        assert_eq!(restored.node_count(), graph.node_count());
        for node in graph.nodes() {
            let back = restored.get_node(&node.id).expect("node survives");
            assert_eq!(back.type_id, node.type_id);
            assert_eq!(back.position, node.position);
            assert_eq!(back.config, node.config);
        }

        let edges = |g: &WorkflowGraph| -> HashSet<(EdgeId, NodeId, NodeId)> {
            g.edges()
                .map(|e| (e.id.clone(), e.source.clone(), e.target.clone()))
                .collect()
        };
        assert_eq!(edges(&restored), edges(&graph));
    }

    #[test]
    fn from_wire_drops_connections_to_missing_nodes() {
        let nodes = vec![WireNode {
            id: NodeId::from("a"),
            type_id: "RSI".to_string(),
            data: serde_json::Map::new(),
            position: Position::default(),
        }];
        let connections = vec![
            WireConnection {
                id: None,
                source: NodeId::from("a"),
                target: NodeId::from("a"),
            },
            WireConnection {
                id: None,
                source: NodeId::from("a"),
                target: NodeId::from("gone"),
            },
        ];

        let graph = WorkflowGraph::from_wire(&catalog(), nodes, connections);

        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.get_node(&NodeId::from("a")).expect("a").label, "RSI");
        assert_no_dangling_edges(&graph);
    }
}
