//! Encore Sync
//!
//! Optimistic synchronization of the signed-in user's library with the
//! remote store. Local state changes first, the store is asked second, and
//! a failed request puts the local state back.
//!
//! - `LikedSongs`: liked-track set
//! - `Playlists`: playlists and their track membership
//! - `UploadedTracks`: user uploads (object storage plus track rows)
//! - `AppContext`: session lifecycle and the views built on top

mod context;
mod error;
mod liked;
mod notice;
mod optimistic;
mod playlists;
mod session;
mod uploads;

use encore_core::TrackCatalog;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Track catalog shared by playlists and uploads
pub type SharedCatalog = Arc<RwLock<TrackCatalog>>;

// Public exports
pub use context::{AppContext, Backend, LibraryView, SearchResults};
pub use error::{Result, SyncError};
pub use liked::LikedSongs;
pub use notice::{Notice, NoticeLog, NoticeSink, Severity, TracingNotices};
pub use optimistic::{optimistic, EntityLocks};
pub use playlists::{PlaylistView, Playlists};
pub use session::Session;
pub use uploads::{
    extension_for_content_type, sanitize_file_stem, MediaFile, StorageMode, UploadedTracks,
    AUDIO_BUCKET, COVER_BUCKET,
};
