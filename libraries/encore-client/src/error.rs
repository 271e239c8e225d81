//! Error types for the Encore backend client.

use encore_core::EncoreError;
use thiserror::Error;

/// Errors that can occur when talking to the hosted backend.
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Backend returned an error response
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Request needs a signed-in user (401)
    #[error("Authentication required")]
    AuthRequired,

    /// Credentials rejected by the auth endpoint
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Resource does not exist (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid backend URL or API key
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to parse backend response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Backend is offline or unreachable
    #[error("Server unreachable: {0}")]
    ServerUnreachable(String),

    /// Rate limited by backend (429)
    #[error("Rate limited, retry after {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },
}

impl ClientError {
    /// Wrap a transport error, separating unreachable hosts from the rest
    pub(crate) fn transport(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            Self::ServerUnreachable(e.to_string())
        } else {
            Self::Request(e)
        }
    }
}

impl From<ClientError> for EncoreError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::AuthRequired => EncoreError::AuthRequired,
            ClientError::AuthFailed(msg) => EncoreError::AuthFailed(msg),
            ClientError::NotFound(what) => EncoreError::not_found("Resource", what),
            ClientError::ServerUnreachable(msg) => EncoreError::network(msg),
            ClientError::Request(e) => EncoreError::network(e.to_string()),
            ClientError::InvalidConfig(msg) => EncoreError::invalid_input(msg),
            other => EncoreError::remote(other.to_string()),
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
