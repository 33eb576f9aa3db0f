//! Query execution errors

use crate::api::transport::TransportError;
use crate::auth::{AuthError, StoreError};
use thiserror::Error;

/// Errors that can occur while executing a query
#[derive(Error, Debug)]
pub enum ExecuteError {
    /// Authorization (including an automatic refresh) failed
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// No usable token and no refresh was attempted
    #[error("No valid access token")]
    TokenUnavailable,

    /// The API answered with a non-2xx status
    #[error("Salesforce API error: {status_text}")]
    Api { status: u16, status_text: String },

    /// The request never produced a response
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The response body was not JSON
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// Token store could not be read
    #[error("Token store error: {0}")]
    Store(#[from] StoreError),
}

impl ExecuteError {
    /// Short machine-readable tag for message responses
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::TokenUnavailable => "token_unavailable",
            Self::Api { .. } => "api",
            Self::Transport(_) => "transport",
            Self::Decode(_) => "decode",
            Self::Store(_) => "store",
        }
    }
}
