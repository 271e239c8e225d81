/// User domain type
use crate::types::UserId;
use serde::{Deserialize, Serialize};

/// Authenticated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable identifier from the auth provider
    pub id: UserId,

    /// Sign-in email
    pub email: String,

    /// Display name chosen at sign-up
    pub display_name: Option<String>,
}

impl User {
    /// Create a user without a display name
    pub fn new(id: UserId, email: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            display_name: None,
        }
    }
}
