//! Collaborator trait implementations over HTTP.

use crate::client::EncoreClient;
use crate::rest::{Order, Select};
use crate::types::{LikedRow, PositionRow, TrackIdRow};
use async_trait::async_trait;
use encore_core::{
    AuthProvider, CreatePlaylist, CreateTrack, FetchedObject, ObjectStorage, Playlist, PlaylistId,
    PlaylistTrack, RemoteStore, Result, SignUp, TrackId, UploadedTrack, User, UserId,
};

const LIKED_SONGS: &str = "liked_songs";
const PLAYLISTS: &str = "playlists";
const PLAYLIST_TRACKS: &str = "playlist_tracks";
const TRACKS: &str = "tracks";

#[async_trait]
impl RemoteStore for EncoreClient {
    // ========================================================================
    // Liked songs
    // ========================================================================

    async fn get_liked_track_ids(&self, user_id: &UserId) -> Result<Vec<TrackId>> {
        let bearer = self.bearer().await;
        let rows: Vec<TrackIdRow> = self
            .rest(&bearer)
            .select(
                LIKED_SONGS,
                &Select::new()
                    .columns("track_id")
                    .eq("user_id", user_id.as_str()),
            )
            .await?;
        Ok(rows.into_iter().map(|r| r.track_id).collect())
    }

    async fn insert_liked(&self, user_id: &UserId, track_id: &TrackId) -> Result<()> {
        let bearer = self.bearer().await;
        self.rest(&bearer)
            .insert(LIKED_SONGS, &LikedRow { user_id, track_id })
            .await?;
        Ok(())
    }

    async fn delete_liked(&self, user_id: &UserId, track_id: &TrackId) -> Result<()> {
        let bearer = self.bearer().await;
        self.rest(&bearer)
            .delete(
                LIKED_SONGS,
                &Select::new()
                    .eq("user_id", user_id.as_str())
                    .eq("track_id", track_id.as_str()),
            )
            .await?;
        Ok(())
    }

    // ========================================================================
    // Playlists
    // ========================================================================

    async fn get_user_playlists(&self, user_id: &UserId) -> Result<Vec<Playlist>> {
        let bearer = self.bearer().await;
        let rows = self
            .rest(&bearer)
            .select(
                PLAYLISTS,
                &Select::new()
                    .eq("user_id", user_id.as_str())
                    .order("created_at", Order::Desc),
            )
            .await?;
        Ok(rows)
    }

    async fn create_playlist(&self, playlist: CreatePlaylist) -> Result<Playlist> {
        let bearer = self.bearer().await;
        let row = self
            .rest(&bearer)
            .insert_returning(PLAYLISTS, &playlist)
            .await?;
        Ok(row)
    }

    async fn delete_playlist(&self, id: &PlaylistId) -> Result<()> {
        let bearer = self.bearer().await;
        self.rest(&bearer)
            .delete(PLAYLISTS, &Select::new().eq("id", id.as_str()))
            .await?;
        Ok(())
    }

    // ========================================================================
    // Playlist membership
    // ========================================================================

    async fn get_playlist_tracks(&self, playlist_id: &PlaylistId) -> Result<Vec<PlaylistTrack>> {
        let bearer = self.bearer().await;
        let rows = self
            .rest(&bearer)
            .select(
                PLAYLIST_TRACKS,
                &Select::new()
                    .columns("playlist_id,track_id,position")
                    .eq("playlist_id", playlist_id.as_str())
                    .order("position", Order::Asc),
            )
            .await?;
        Ok(rows)
    }

    async fn get_max_position(&self, playlist_id: &PlaylistId) -> Result<Option<i64>> {
        let bearer = self.bearer().await;
        let rows: Vec<PositionRow> = self
            .rest(&bearer)
            .select(
                PLAYLIST_TRACKS,
                &Select::new()
                    .columns("position")
                    .eq("playlist_id", playlist_id.as_str())
                    .order("position", Order::Desc)
                    .limit(1),
            )
            .await?;
        Ok(rows.first().map(|r| r.position))
    }

    async fn add_playlist_track(&self, entry: PlaylistTrack) -> Result<()> {
        let bearer = self.bearer().await;
        self.rest(&bearer).insert(PLAYLIST_TRACKS, &entry).await?;
        Ok(())
    }

    async fn remove_playlist_track(
        &self,
        playlist_id: &PlaylistId,
        track_id: &TrackId,
    ) -> Result<()> {
        let bearer = self.bearer().await;
        self.rest(&bearer)
            .delete(
                PLAYLIST_TRACKS,
                &Select::new()
                    .eq("playlist_id", playlist_id.as_str())
                    .eq("track_id", track_id.as_str()),
            )
            .await?;
        Ok(())
    }

    // ========================================================================
    // Uploaded tracks
    // ========================================================================

    async fn get_uploaded_tracks(&self) -> Result<Vec<UploadedTrack>> {
        let bearer = self.bearer().await;
        let rows = self
            .rest(&bearer)
            .select(TRACKS, &Select::new().order("created_at", Order::Desc))
            .await?;
        Ok(rows)
    }

    async fn create_track(&self, track: CreateTrack) -> Result<UploadedTrack> {
        let bearer = self.bearer().await;
        let row = self.rest(&bearer).insert_returning(TRACKS, &track).await?;
        Ok(row)
    }

    async fn delete_track(&self, id: &TrackId) -> Result<()> {
        let bearer = self.bearer().await;
        self.rest(&bearer)
            .delete(TRACKS, &Select::new().eq("id", id.as_str()))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for EncoreClient {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        Ok(self.upload_object(bucket, path, bytes, content_type).await?)
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.object_url(bucket, path)
    }

    async fn fetch(&self, url: &str) -> Result<FetchedObject> {
        Ok(self.fetch_object(url).await?)
    }
}

#[async_trait]
impl AuthProvider for EncoreClient {
    async fn sign_up(&self, form: &SignUp) -> Result<User> {
        Ok(EncoreClient::sign_up(self, &form.email, &form.password, &form.display_name).await?)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<User> {
        Ok(EncoreClient::sign_in(self, email, password).await?)
    }

    async fn sign_out(&self) -> Result<()> {
        Ok(EncoreClient::sign_out(self).await?)
    }
}
