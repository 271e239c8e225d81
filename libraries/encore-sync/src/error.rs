use encore_core::{EncoreError, ValidationErrors};
use thiserror::Error;

/// Errors returned by sync operations
///
/// Every operation has already recorded a notice and corrected local state
/// by the time one of these reaches the caller.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Sign in required")]
    AuthRequired,

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Remote error: {0}")]
    Remote(#[from] EncoreError),
}

impl SyncError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// True when the operation failed only because no user is signed in
    pub fn is_auth_required(&self) -> bool {
        matches!(self, Self::AuthRequired)
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
