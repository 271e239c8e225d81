//! Backend collaborator traits
//!
//! The application is a thin client over a hosted backend: an auth
//! provider, a relational row store and an object store. These traits are
//! the only contact points, so the sync layer can run against the HTTP
//! client or the in-memory backend alike.

use crate::error::Result;
use crate::types::{
    CreatePlaylist, CreateTrack, Playlist, PlaylistId, PlaylistTrack, TrackId, UploadedTrack,
    User, UserId,
};
use async_trait::async_trait;

/// Relational store holding playlists, memberships, likes and uploads
#[async_trait]
pub trait RemoteStore: Send + Sync {
    // ========================================================================
    // Liked songs
    // ========================================================================

    /// Track ids liked by a user
    async fn get_liked_track_ids(&self, user_id: &UserId) -> Result<Vec<TrackId>>;

    /// Insert a liked-song row
    async fn insert_liked(&self, user_id: &UserId, track_id: &TrackId) -> Result<()>;

    /// Delete a liked-song row
    async fn delete_liked(&self, user_id: &UserId, track_id: &TrackId) -> Result<()>;

    // ========================================================================
    // Playlists
    // ========================================================================

    /// Playlists owned by a user, newest first
    async fn get_user_playlists(&self, user_id: &UserId) -> Result<Vec<Playlist>>;

    /// Insert a playlist and return the stored row
    async fn create_playlist(&self, playlist: CreatePlaylist) -> Result<Playlist>;

    /// Delete a playlist (membership rows cascade in the store)
    async fn delete_playlist(&self, id: &PlaylistId) -> Result<()>;

    // ========================================================================
    // Playlist membership
    // ========================================================================

    /// Membership rows of a playlist, ordered by ascending position
    async fn get_playlist_tracks(&self, playlist_id: &PlaylistId) -> Result<Vec<PlaylistTrack>>;

    /// Highest position in a playlist (None when empty)
    async fn get_max_position(&self, playlist_id: &PlaylistId) -> Result<Option<i64>>;

    /// Insert a membership row
    async fn add_playlist_track(&self, entry: PlaylistTrack) -> Result<()>;

    /// Delete every membership row of a track in a playlist
    async fn remove_playlist_track(
        &self,
        playlist_id: &PlaylistId,
        track_id: &TrackId,
    ) -> Result<()>;

    // ========================================================================
    // Uploaded tracks
    // ========================================================================

    /// All uploaded tracks, newest first
    async fn get_uploaded_tracks(&self) -> Result<Vec<UploadedTrack>>;

    /// Insert an uploaded track row and return it
    async fn create_track(&self, track: CreateTrack) -> Result<UploadedTrack>;

    /// Delete an uploaded track row
    async fn delete_track(&self, id: &TrackId) -> Result<()>;
}

/// Bytes fetched from a remote URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedObject {
    pub bytes: Vec<u8>,
    /// Content type reported by the server, if any
    pub content_type: Option<String>,
}

/// Binary object storage for audio and cover files
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload bytes under `bucket/path` and return the stored path
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String>;

    /// Publicly resolvable URL for a stored path
    fn public_url(&self, bucket: &str, path: &str) -> String;

    /// Fetch an arbitrary URL (used when importing audio by URL)
    async fn fetch(&self, url: &str) -> Result<FetchedObject>;
}

/// Sign-up form data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignUp {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

/// Authentication provider
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Register a new account and return the signed-in user
    async fn sign_up(&self, form: &SignUp) -> Result<User>;

    /// Sign in with email and password
    async fn sign_in(&self, email: &str, password: &str) -> Result<User>;

    /// End the current session
    async fn sign_out(&self) -> Result<()>;
}
