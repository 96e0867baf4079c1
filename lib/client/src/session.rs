//! The signed-in session.
//!
//! A `Session` is created once at startup and shared by every client that
//! talks to the backend. Clearing it signs every holder out at once.

use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared handle to the current bearer token.
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Arc<RwLock<Option<String>>>,
}

impl Session {
    /// Creates a session, signed in when a token is given.
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: Arc::new(RwLock::new(token.filter(|t| !t.is_empty()))),
        }
    }

    /// Signs in with a new token.
    pub async fn start(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    /// Signs out.
    pub async fn end(&self) {
        *self.token.write().await = None;
    }

    /// The token to send, if signed in.
    pub async fn bearer(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }
}
