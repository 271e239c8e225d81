//! Error types for playback management

use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The media output rejected a command
    #[error("Media output error: {0}")]
    Media(String),
}

impl PlaybackError {
    pub fn media(msg: impl Into<String>) -> Self {
        Self::Media(msg.into())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
