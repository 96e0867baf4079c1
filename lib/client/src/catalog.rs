//! Loading the node catalog at editor start.

use crate::api::WorkflowApi;
use tracing::{info, warn};
use trading_maven_workflow::NodeCatalog;

/// Fetches the node catalog once.
///
/// Any failure, or an empty response, yields the built-in fallback catalog so
/// the editor always has something to offer.
pub async fn load_catalog<A>(api: &A) -> NodeCatalog
where
    A: WorkflowApi + ?Sized,
{
    match api.fetch_node_types().await {
        Ok(response) => {
            let catalog = NodeCatalog::from_response(response);
            if catalog.is_empty() {
                warn!("backend returned no node types, using built-in catalog");
                return NodeCatalog::fallback();
            }
            info!(node_types = catalog.len(), "loaded node catalog");
            catalog
        }
        Err(e) => {
            warn!(error = %e, "failed to load node catalog, using built-in catalog");
            NodeCatalog::fallback()
        }
    }
}
