//! Request and response bodies of the execution and account endpoints.

use serde::{Deserialize, Serialize};
use trading_maven_core::{ExecutionId, MtAccountId};

/// Body of `POST /agentic/executions/workflows/{id}/execute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExecuteRequest {
    /// Simulate orders instead of placing them.
    pub test_mode: bool,
}

/// Response of the execute endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExecuteResponse {
    /// Id of the started execution.
    pub execution_id: ExecutionId,
    /// Initial execution status, e.g. `"running"`.
    #[serde(default)]
    pub status: Option<String>,
    /// Backend message.
    #[serde(default)]
    pub message: Option<String>,
}

/// A linked MT5 trading account.
///
/// Only `id` and `is_connected` matter here; the rest is informational.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MtAccount {
    /// Backend id.
    pub id: MtAccountId,
    /// Broker account number.
    #[serde(default)]
    pub account_number: String,
    /// Broker server name.
    #[serde(default)]
    pub server: String,
    /// Demo or live.
    #[serde(default)]
    pub account_type: Option<String>,
    /// Broker name.
    #[serde(default)]
    pub broker: Option<String>,
    /// Whether the terminal is currently connected.
    #[serde(default)]
    pub is_connected: bool,
    /// Account balance.
    #[serde(default)]
    pub balance: Option<f64>,
    /// Account equity.
    #[serde(default)]
    pub equity: Option<f64>,
    /// Account currency code.
    #[serde(default)]
    pub currency: Option<String>,
    /// Account leverage.
    #[serde(default)]
    pub leverage: Option<i64>,
}
