//! Subcommand implementations.

use rootcause::prelude::Report;
use std::fmt;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use trading_maven_client::{BrokerStatus, ClientError, WorkflowApi, WorkflowPersistence};
use trading_maven_core::{ExecutionId, WorkflowId};
use trading_maven_workflow::{ExecutionConsole, NodeCatalog, Workflow, WorkflowPayload};

/// Errors surfaced to the command line.
#[derive(Debug)]
pub enum CliError {
    /// A workflow file could not be read.
    ReadFile { path: PathBuf, details: String },
    /// A workflow file is not a valid workflow body.
    ParseFile { path: PathBuf, details: String },
    /// The backend call failed.
    Client(ClientError),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, details } => {
                write!(f, "failed to read {}: {details}", path.display())
            }
            Self::ParseFile { path, details } => {
                write!(f, "{} is not a workflow file: {details}", path.display())
            }
            Self::Client(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CliError {}

fn client_error(report: Report<ClientError>) -> CliError {
    CliError::Client(report.current_context().clone())
}

/// Reads a workflow body from a JSON file into a new draft.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub async fn read_workflow_file(
    catalog: &NodeCatalog,
    path: &Path,
) -> trading_maven_core::Result<Workflow, CliError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CliError::ReadFile {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;
    let payload: WorkflowPayload =
        serde_json::from_str(&raw).map_err(|e| CliError::ParseFile {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?;
    Ok(Workflow::from_payload(catalog, payload))
}

/// Renders the node palette, one section per category.
#[must_use]
pub fn render_palette(catalog: &NodeCatalog) -> String {
    let mut out = String::new();
    for group in catalog.categories() {
        let _ = writeln!(out, "{}", group.display_name);
        for node in &group.nodes {
            let _ = writeln!(out, "  {:<24} {}", node.type_id, node.description);
        }
    }
    out
}

/// Renders a workflow's nodes and connections.
#[must_use]
pub fn render_workflow(workflow: &Workflow) -> String {
    let mut out = String::new();
    let id = workflow
        .server_id()
        .map_or_else(|| "draft".to_string(), |id| id.to_string());
    let _ = writeln!(out, "{} ({id})", workflow.name);
    if let Some(description) = &workflow.description {
        let _ = writeln!(out, "  {description}");
    }
    let _ = writeln!(out, "nodes:");
    for node in workflow.graph.nodes() {
        let config: Vec<String> = node.config.iter().map(|(k, v)| format!("{k}={v}")).collect();
        let _ = writeln!(
            out,
            "  {} [{}] at ({}, {}) {}",
            node.id,
            node.type_id,
            node.position.x,
            node.position.y,
            config.join(" ")
        );
    }
    let _ = writeln!(out, "connections:");
    for edge in workflow.graph.edges() {
        let _ = writeln!(out, "  {} -> {}", edge.source, edge.target);
    }
    out
}

fn warn_missing_required(
    catalog: &NodeCatalog,
    workflow: &Workflow,
    console: &mut ExecutionConsole,
) {
    for (node_id, param) in workflow.graph.missing_required(catalog) {
        console.warn(format!("Node {node_id} has no value for required '{param}'"));
    }
}

/// Loads and renders a saved workflow.
///
/// # Errors
///
/// Returns an error if the backend cannot produce the workflow.
pub async fn show<A>(
    persistence: &WorkflowPersistence<A>,
    catalog: &NodeCatalog,
    id: WorkflowId,
) -> trading_maven_core::Result<String, CliError>
where
    A: WorkflowApi + ?Sized,
{
    let workflow = persistence
        .load(catalog, id)
        .await
        .map_err(client_error)?;
    Ok(render_workflow(&workflow))
}

/// Saves a workflow file, updating `id` when given.
///
/// # Errors
///
/// Returns an error if the file is unusable or the save fails.
pub async fn save<A>(
    persistence: &WorkflowPersistence<A>,
    catalog: &NodeCatalog,
    path: &Path,
    id: Option<WorkflowId>,
    console: &mut ExecutionConsole,
) -> trading_maven_core::Result<WorkflowId, CliError>
where
    A: WorkflowApi + ?Sized,
{
    let mut workflow = read_workflow_file(catalog, path).await?;
    if let Some(id) = id {
        workflow.adopt_server_id(id);
    }
    warn_missing_required(catalog, &workflow, console);
    let saved = persistence
        .save(&mut workflow, console)
        .await
        .map_err(client_error)?;
    Ok(saved)
}

/// Saves a workflow file and runs it.
///
/// # Errors
///
/// Returns an error if the file is unusable, the broker is disconnected, or
/// either backend step fails.
pub async fn execute<A>(
    persistence: &WorkflowPersistence<A>,
    catalog: &NodeCatalog,
    path: &Path,
    id: Option<WorkflowId>,
    broker: &BrokerStatus,
    test_mode: bool,
    console: &mut ExecutionConsole,
) -> trading_maven_core::Result<ExecutionId, CliError>
where
    A: WorkflowApi + ?Sized,
{
    let mut workflow = read_workflow_file(catalog, path).await?;
    if let Some(id) = id {
        workflow.adopt_server_id(id);
    }
    warn_missing_required(catalog, &workflow, console);
    let execution = persistence
        .execute(&mut workflow, console, broker, test_mode)
        .await
        .map_err(client_error)?;
    Ok(execution)
}
