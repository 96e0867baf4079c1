//! Backend side of the Trading Maven workflow builder.
//!
//! This crate provides:
//!
//! - **Session**: The shared bearer token every request is signed with
//! - **API client**: reqwest implementation of the workflow endpoints
//! - **Catalog loading**: Node types from the backend, with a built-in fallback
//! - **Broker status**: Background polling of MT5 connectivity
//! - **Persistence**: Create/update fallback and save-then-execute sequencing

pub mod api;
pub mod catalog;
pub mod error;
pub mod persistence;
pub mod session;
pub mod status;
pub mod types;

pub use api::{ApiClient, WorkflowApi};
pub use catalog::load_catalog;
pub use error::ClientError;
pub use persistence::WorkflowPersistence;
pub use session::Session;
pub use status::{BrokerStatus, BrokerStatusMonitor};
pub use types::{ExecuteRequest, ExecuteResponse, MtAccount};
