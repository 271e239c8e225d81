//! Types for backend requests and responses.

use encore_core::{TrackId, User, UserId};
use serde::{Deserialize, Serialize};

/// Configuration for connecting to the hosted backend.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Project URL (e.g., "https://abc.example.co")
    pub url: String,
    /// Public API key sent with every request
    pub api_key: String,
    /// Current access token (if signed in)
    pub access_token: Option<String>,
    /// Refresh token issued with the access token
    pub refresh_token: Option<String>,
}

impl ClientConfig {
    /// Create a new config with just the URL and API key.
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            access_token: None,
            refresh_token: None,
        }
    }

    /// Create a config with existing tokens.
    pub fn with_tokens(
        url: impl Into<String>,
        api_key: impl Into<String>,
        access_token: impl Into<String>,
        refresh_token: Option<String>,
    ) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            access_token: Some(access_token.into()),
            refresh_token,
        }
    }
}

// =============================================================================
// Authentication Types
// =============================================================================

/// Request body for the password grant.
#[derive(Debug, Serialize)]
pub(crate) struct PasswordGrant<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Request body for sign-up.
#[derive(Debug, Serialize)]
pub(crate) struct SignUpRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub data: UserMetadata,
}

/// Free-form user metadata stored by the auth provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// User object returned by the auth endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_metadata: UserMetadata,
}

impl AuthUser {
    pub fn into_user(self) -> User {
        User {
            id: UserId::new(self.id),
            email: self.email.unwrap_or_default(),
            display_name: self.user_metadata.display_name,
        }
    }
}

/// Session returned by a successful sign-in.
#[derive(Debug, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: AuthUser,
}

/// Sign-up answers with a session, or with the bare user when the
/// account still needs confirming.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SignUpResponse {
    Session(AuthSession),
    User(AuthUser),
}

// =============================================================================
// Row Types
// =============================================================================

/// Body of a liked-song insert.
#[derive(Debug, Serialize)]
pub(crate) struct LikedRow<'a> {
    pub user_id: &'a UserId,
    pub track_id: &'a TrackId,
}

/// Projection of `track_id`.
#[derive(Debug, Deserialize)]
pub(crate) struct TrackIdRow {
    pub track_id: TrackId,
}

/// Projection of `position`.
#[derive(Debug, Deserialize)]
pub(crate) struct PositionRow {
    pub position: i64,
}

/// Error body shapes used by the auth, rest and storage services.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

/// Human-readable message from an error response body
pub(crate) fn error_message(body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .message
        .or(parsed.msg)
        .or(parsed.error_description)
        .or(parsed.error)
        .unwrap_or_else(|| body.to_string())
}
