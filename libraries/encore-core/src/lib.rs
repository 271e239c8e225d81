//! Encore Core
//!
//! Platform-agnostic domain types, backend collaborator traits, validation
//! and error handling shared by the playback engine and the sync layer.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `Playlist`, `PlaylistTrack`, `User`, etc.
//! - **Collaborator Traits**: `RemoteStore`, `ObjectStorage`, `AuthProvider`
//! - **Error Handling**: Unified `EncoreError` and `Result` types
//! - **In-memory backend**: `MemoryBackend` for offline use and tests
//!
//! # Example
//!
//! ```rust
//! use encore_core::types::{CreatePlaylist, Track, UserId};
//!
//! let track = Track::new("demo-1", "Neon Harbor", "Glass Anchors", 243);
//! assert_eq!(encore_core::format_duration(track.duration), "4:03");
//!
//! let draft = CreatePlaylist::new(UserId::new("user-1"), "Road Trip", None);
//! assert_eq!(draft.name, "Road Trip");
//! ```

#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod memory;
pub mod storage;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use catalog::TrackCatalog;
pub use error::{EncoreError, Result};
pub use memory::MemoryBackend;
pub use storage::{AuthProvider, FetchedObject, ObjectStorage, RemoteStore, SignUp};
pub use validation::ValidationErrors;

pub use types::{
    format_duration, next_position, CreatePlaylist, CreateTrack, Playlist, PlaylistId,
    PlaylistTrack, PlaylistWithTracks, Track, TrackId, TrackMetadata, UploadedTrack, User, UserId,
    DEFAULT_COVER_URL, UNKNOWN_ALBUM,
};
