//! Core types shared by the Trading Maven workflow builder crates.
//!
//! This crate provides the identifier types used on both sides of the
//! client/backend boundary and the `Result` alias used with rootcause.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{EdgeId, ExecutionId, MtAccountId, NodeId, ParseIdError, WorkflowId};
