//! Backend client error types.

use std::fmt;

/// Errors from talking to the workflow backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// No session token; the request was never sent.
    NotAuthenticated,
    /// The MT5 account is not connected; execution was not attempted.
    BrokerDisconnected,
    /// The backend rejected the request.
    Backend {
        /// HTTP status code.
        status: u16,
        /// The backend's own explanation.
        detail: String,
    },
    /// The request did not complete.
    Transport {
        /// Error details.
        details: String,
    },
    /// The response body was not what was expected.
    Decode {
        /// Error details.
        details: String,
    },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAuthenticated => write!(f, "not signed in"),
            Self::BrokerDisconnected => {
                write!(f, "MT5 account is not connected")
            }
            Self::Backend { status, detail } => {
                write!(f, "backend error ({status}): {detail}")
            }
            Self::Transport { details } => {
                write!(f, "request failed: {details}")
            }
            Self::Decode { details } => {
                write!(f, "unexpected response: {details}")
            }
        }
    }
}

impl std::error::Error for ClientError {}
