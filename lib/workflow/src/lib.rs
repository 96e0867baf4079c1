//! Workflow builder core for Trading Maven.
//!
//! This crate provides everything the visual workflow builder needs short of
//! talking to the backend:
//!
//! - **Node Catalog**: Node types grouped by category, with parameter schemas
//! - **Graph Model**: Directed graphs using petgraph with typed node configuration
//! - **Wire Format**: The backend's workflow request and response bodies
//! - **Editor**: Selection state machine over a workflow's graph
//! - **Console**: Capped log of status messages

pub mod catalog;
pub mod config;
pub mod console;
pub mod definition;
pub mod edge;
pub mod editor;
pub mod error;
pub mod graph;
pub mod node;
pub mod wire;

pub use catalog::{CategoryGroup, NodeCatalog, NodeCategory, NodeType, NodeTypesResponse};
pub use config::{NodeConfig, ParamKind, ParamSpec, ParamValue};
pub use console::{CONSOLE_CAPACITY, ConsoleEntry, ConsoleLevel, ExecutionConsole};
pub use definition::{TriggerType, Workflow};
pub use edge::WorkflowEdge;
pub use editor::{EditorState, WorkflowEditor};
pub use error::GraphError;
pub use graph::WorkflowGraph;
pub use node::{Position, WorkflowNode};
pub use wire::{WireConnection, WireNode, WorkflowPayload, WorkflowRecord};
