//! HTTP client for the workflow backend.
//!
//! [`WorkflowApi`] is the seam the rest of the crate talks through;
//! [`ApiClient`] is the reqwest implementation. Every request carries the
//! session's bearer token and fails locally when there is none.

use crate::error::ClientError;
use crate::session::Session;
use crate::types::{ExecuteRequest, ExecuteResponse, MtAccount};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use rootcause::prelude::Report;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::{debug, instrument};
use trading_maven_core::WorkflowId;
use trading_maven_workflow::{NodeTypesResponse, WorkflowPayload, WorkflowRecord};

/// Operations the editor needs from the backend.
#[async_trait]
pub trait WorkflowApi: Send + Sync {
    /// `GET /agentic/nodes/types`
    async fn fetch_node_types(&self) -> Result<NodeTypesResponse, Report<ClientError>>;

    /// `GET /agentic/workflows/{id}`
    async fn get_workflow(&self, id: WorkflowId) -> Result<WorkflowRecord, Report<ClientError>>;

    /// `POST /agentic/workflows`
    async fn create_workflow(
        &self,
        payload: &WorkflowPayload,
    ) -> Result<WorkflowRecord, Report<ClientError>>;

    /// `PUT /agentic/workflows/{id}`
    async fn update_workflow(
        &self,
        id: WorkflowId,
        payload: &WorkflowPayload,
    ) -> Result<WorkflowRecord, Report<ClientError>>;

    /// `POST /agentic/executions/workflows/{id}/execute`
    async fn execute_workflow(
        &self,
        id: WorkflowId,
        test_mode: bool,
    ) -> Result<ExecuteResponse, Report<ClientError>>;

    /// `GET /mt5/accounts`
    async fn list_mt5_accounts(&self) -> Result<Vec<MtAccount>, Report<ClientError>>;
}

/// reqwest-backed [`WorkflowApi`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    /// Creates a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        session: Session,
        timeout: Duration,
    ) -> Result<Self, Report<ClientError>> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport {
                details: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        })
    }

    /// The session this client signs requests with.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, Report<ClientError>> {
        let token = self
            .session
            .bearer()
            .await
            .ok_or(ClientError::NotAuthenticated)?;

        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ClientError::Transport {
                details: e.to_string(),
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| ClientError::Transport {
            details: e.to_string(),
        })?;
        debug!(status = status.as_u16(), bytes = body.len(), "response received");

        let parsed: Option<JsonValue> = serde_json::from_slice(&body).ok();

        if !status.is_success() {
            let detail = parsed
                .as_ref()
                .and_then(error_detail)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| "request failed".to_string());
            return Err(ClientError::Backend {
                status: status.as_u16(),
                detail,
            }
            .into());
        }

        let value = parsed.ok_or_else(|| ClientError::Decode {
            details: "response body is not JSON".to_string(),
        })?;

        // Some endpoints report business failures with a 2xx status
        if value.get("success") == Some(&JsonValue::Bool(false)) {
            return Err(ClientError::Backend {
                status: status.as_u16(),
                detail: error_detail(&value).unwrap_or_else(|| "request failed".to_string()),
            }
            .into());
        }

        serde_json::from_value(value).map_err(|e| {
            ClientError::Decode {
                details: e.to_string(),
            }
            .into()
        })
    }
}

/// Reads the backend's `detail` (or `message`) field.
fn error_detail(body: &JsonValue) -> Option<String> {
    let detail = body.get("detail").or_else(|| body.get("message"))?;
    match detail {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Null => None,
        // Validation errors arrive as a list of objects
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl WorkflowApi for ApiClient {
    #[instrument(skip(self))]
    async fn fetch_node_types(&self) -> Result<NodeTypesResponse, Report<ClientError>> {
        self.send(self.request(Method::GET, "/agentic/nodes/types"))
            .await
    }

    #[instrument(skip(self), fields(workflow_id = %id))]
    async fn get_workflow(&self, id: WorkflowId) -> Result<WorkflowRecord, Report<ClientError>> {
        self.send(self.request(Method::GET, &format!("/agentic/workflows/{id}")))
            .await
    }

    #[instrument(skip(self, payload), fields(nodes = payload.nodes.len()))]
    async fn create_workflow(
        &self,
        payload: &WorkflowPayload,
    ) -> Result<WorkflowRecord, Report<ClientError>> {
        self.send(self.request(Method::POST, "/agentic/workflows").json(payload))
            .await
    }

    #[instrument(skip(self, payload), fields(workflow_id = %id, nodes = payload.nodes.len()))]
    async fn update_workflow(
        &self,
        id: WorkflowId,
        payload: &WorkflowPayload,
    ) -> Result<WorkflowRecord, Report<ClientError>> {
        self.send(
            self.request(Method::PUT, &format!("/agentic/workflows/{id}"))
                .json(payload),
        )
        .await
    }

    #[instrument(skip(self), fields(workflow_id = %id))]
    async fn execute_workflow(
        &self,
        id: WorkflowId,
        test_mode: bool,
    ) -> Result<ExecuteResponse, Report<ClientError>> {
        self.send(
            self.request(
                Method::POST,
                &format!("/agentic/executions/workflows/{id}/execute"),
            )
            .json(&ExecuteRequest { test_mode }),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn list_mt5_accounts(&self) -> Result<Vec<MtAccount>, Report<ClientError>> {
        self.send(self.request(Method::GET, "/mt5/accounts")).await
    }
}
