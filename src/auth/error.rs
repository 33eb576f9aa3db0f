//! Auth error types

use thiserror::Error;

/// Errors from the durable key-value store behind the token cache
#[derive(Error, Debug)]
pub enum StoreError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// State file could not be read or written as JSON
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A lock guarding the store was poisoned
    #[error("Lock error: {0}")]
    Lock(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Errors that can occur while authorizing
#[derive(Error, Debug)]
pub enum AuthError {
    /// No client id configured, so no authorization URL can be built
    #[error("OAuth client id is not configured")]
    MissingClientId,

    /// The user closed or abandoned the authorization step
    #[error("Authorization cancelled by user")]
    Cancelled,

    /// The authorization server refused the request
    #[error("Authorization denied: {error}{}", .description.as_ref().map(|d| format!(" ({})", d)).unwrap_or_default())]
    Denied {
        error: String,
        description: Option<String>,
    },

    /// Redirect came back without an access token
    #[error("No access token in authorization response")]
    MissingToken,

    /// Redirect carried a state value we did not send
    #[error("Authorization response state does not match the request")]
    StateMismatch,

    /// The browser/redirect mechanism itself failed
    #[error("Authorization interaction failed: {0}")]
    Interaction(String),

    /// Token could not be persisted
    #[error("Token store error: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denied_display() {
        let err = AuthError::Denied {
            error: "access_denied".to_string(),
            description: Some("end-user denied authorization".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Authorization denied: access_denied (end-user denied authorization)"
        );

        let err = AuthError::Denied {
            error: "invalid_scope".to_string(),
            description: None,
        };
        assert_eq!(err.to_string(), "Authorization denied: invalid_scope");
    }

    #[test]
    fn test_store_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let auth_err: AuthError = StoreError::from(io_err).into();
        assert!(matches!(auth_err, AuthError::Store(StoreError::Io(_))));
    }
}
