//! In-memory backend
//!
//! Implements every collaborator trait against process-local tables. Used by
//! the offline demo and by tests, which can inject failures and latency and
//! inspect the call log.

use crate::error::{EncoreError, Result};
use crate::storage::{AuthProvider, FetchedObject, ObjectStorage, RemoteStore, SignUp};
use crate::types::{
    CreatePlaylist, CreateTrack, Playlist, PlaylistId, PlaylistTrack, TrackId, UploadedTrack, User,
    UserId,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Default)]
struct Tables {
    accounts: HashMap<String, (User, String)>,
    current_user: Option<User>,
    liked: Vec<(UserId, TrackId)>,
    playlists: Vec<Playlist>,
    playlist_tracks: Vec<PlaylistTrack>,
    tracks: Vec<UploadedTrack>,
    objects: HashMap<String, (Vec<u8>, String)>,
    remote_objects: HashMap<String, FetchedObject>,
}

#[derive(Default)]
struct Faults {
    fail_reads: bool,
    fail_writes: bool,
    latency: Option<Duration>,
}

/// Process-local backend with failure injection
#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<Tables>,
    faults: Mutex<Faults>,
    calls: Mutex<Vec<String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account without signing in
    pub async fn register(&self, email: &str, password: &str, display_name: Option<&str>) -> User {
        let user = User {
            id: UserId::generate(),
            email: email.to_string(),
            display_name: display_name.map(str::to_string),
        };
        self.tables
            .lock()
            .await
            .accounts
            .insert(email.to_string(), (user.clone(), password.to_string()));
        user
    }

    /// Make every mutating call fail until reset
    pub async fn set_fail_writes(&self, fail: bool) {
        self.faults.lock().await.fail_writes = fail;
    }

    /// Make every query fail until reset
    pub async fn set_fail_reads(&self, fail: bool) {
        self.faults.lock().await.fail_reads = fail;
    }

    /// Delay every call by `latency` before it resolves
    pub async fn set_latency(&self, latency: Option<Duration>) {
        self.faults.lock().await.latency = latency;
    }

    /// Serve `object` for GETs of `url`
    pub async fn add_remote_object(&self, url: &str, object: FetchedObject) {
        self.tables
            .lock()
            .await
            .remote_objects
            .insert(url.to_string(), object);
    }

    /// Insert a playlist row directly, bypassing the call log
    pub async fn seed_playlist(&self, playlist: Playlist, entries: Vec<PlaylistTrack>) {
        let mut tables = self.tables.lock().await;
        tables.playlists.push(playlist);
        tables.playlist_tracks.extend(entries);
    }

    /// Names of every collaborator call made so far, in order
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    /// Number of recorded calls with the given name
    pub async fn call_count(&self, name: &str) -> usize {
        self.calls.lock().await.iter().filter(|c| *c == name).count()
    }

    pub async fn clear_calls(&self) {
        self.calls.lock().await.clear();
    }

    /// Liked rows for a user
    pub async fn liked_rows(&self, user_id: &UserId) -> Vec<TrackId> {
        self.tables
            .lock()
            .await
            .liked
            .iter()
            .filter(|(u, _)| u == user_id)
            .map(|(_, t)| t.clone())
            .collect()
    }

    /// All playlist rows
    pub async fn playlist_rows(&self) -> Vec<Playlist> {
        self.tables.lock().await.playlists.clone()
    }

    /// Membership rows of a playlist in insertion order
    pub async fn playlist_track_rows(&self, playlist_id: &PlaylistId) -> Vec<PlaylistTrack> {
        self.tables
            .lock()
            .await
            .playlist_tracks
            .iter()
            .filter(|e| &e.playlist_id == playlist_id)
            .cloned()
            .collect()
    }

    /// Uploaded track rows
    pub async fn track_rows(&self) -> Vec<UploadedTrack> {
        self.tables.lock().await.tracks.clone()
    }

    /// Stored object bytes and content type
    pub async fn object(&self, bucket: &str, path: &str) -> Option<(Vec<u8>, String)> {
        self.tables
            .lock()
            .await
            .objects
            .get(&format!("{}/{}", bucket, path))
            .cloned()
    }

    async fn begin_read(&self, name: &str) -> Result<()> {
        self.calls.lock().await.push(name.to_string());
        debug!(call = name, "memory backend read");

        let (fail, latency) = {
            let faults = self.faults.lock().await;
            (faults.fail_reads, faults.latency)
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if fail {
            return Err(EncoreError::remote(format!("{} failed: injected read failure", name)));
        }
        Ok(())
    }

    async fn begin_write(&self, name: &str) -> Result<()> {
        self.calls.lock().await.push(name.to_string());
        debug!(call = name, "memory backend write");

        let (fail, latency) = {
            let faults = self.faults.lock().await;
            (faults.fail_writes, faults.latency)
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if fail {
            return Err(EncoreError::remote(format!("{} failed: injected write failure", name)));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryBackend {
    async fn get_liked_track_ids(&self, user_id: &UserId) -> Result<Vec<TrackId>> {
        self.begin_read("get_liked_track_ids").await?;
        Ok(self.liked_rows(user_id).await)
    }

    async fn insert_liked(&self, user_id: &UserId, track_id: &TrackId) -> Result<()> {
        self.begin_write("insert_liked").await?;
        let mut tables = self.tables.lock().await;
        if tables
            .liked
            .iter()
            .any(|(u, t)| u == user_id && t == track_id)
        {
            return Err(EncoreError::remote(
                "duplicate key value violates unique constraint \"liked_songs_pkey\"",
            ));
        }
        tables.liked.push((user_id.clone(), track_id.clone()));
        Ok(())
    }

    async fn delete_liked(&self, user_id: &UserId, track_id: &TrackId) -> Result<()> {
        self.begin_write("delete_liked").await?;
        self.tables
            .lock()
            .await
            .liked
            .retain(|(u, t)| !(u == user_id && t == track_id));
        Ok(())
    }

    async fn get_user_playlists(&self, user_id: &UserId) -> Result<Vec<Playlist>> {
        self.begin_read("get_user_playlists").await?;
        // Rows are appended as they are created, so reverse order is newest first
        Ok(self
            .tables
            .lock()
            .await
            .playlists
            .iter()
            .rev()
            .filter(|p| &p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create_playlist(&self, playlist: CreatePlaylist) -> Result<Playlist> {
        self.begin_write("create_playlist").await?;
        let mut tables = self.tables.lock().await;
        if tables.playlists.iter().any(|p| p.id == playlist.id) {
            return Err(EncoreError::remote(
                "duplicate key value violates unique constraint \"playlists_pkey\"",
            ));
        }
        let row = Playlist::draft(&playlist);
        tables.playlists.push(row.clone());
        Ok(row)
    }

    async fn delete_playlist(&self, id: &PlaylistId) -> Result<()> {
        self.begin_write("delete_playlist").await?;
        let mut tables = self.tables.lock().await;
        tables.playlists.retain(|p| &p.id != id);
        tables.playlist_tracks.retain(|e| &e.playlist_id != id);
        Ok(())
    }

    async fn get_playlist_tracks(&self, playlist_id: &PlaylistId) -> Result<Vec<PlaylistTrack>> {
        self.begin_read("get_playlist_tracks").await?;
        let mut rows = self.playlist_track_rows(playlist_id).await;
        rows.sort_by_key(|e| e.position);
        Ok(rows)
    }

    async fn get_max_position(&self, playlist_id: &PlaylistId) -> Result<Option<i64>> {
        self.begin_read("get_max_position").await?;
        Ok(self
            .playlist_track_rows(playlist_id)
            .await
            .iter()
            .map(|e| e.position)
            .max())
    }

    async fn add_playlist_track(&self, entry: PlaylistTrack) -> Result<()> {
        self.begin_write("add_playlist_track").await?;
        self.tables.lock().await.playlist_tracks.push(entry);
        Ok(())
    }

    async fn remove_playlist_track(
        &self,
        playlist_id: &PlaylistId,
        track_id: &TrackId,
    ) -> Result<()> {
        self.begin_write("remove_playlist_track").await?;
        self.tables
            .lock()
            .await
            .playlist_tracks
            .retain(|e| !(&e.playlist_id == playlist_id && &e.track_id == track_id));
        Ok(())
    }

    async fn get_uploaded_tracks(&self) -> Result<Vec<UploadedTrack>> {
        self.begin_read("get_uploaded_tracks").await?;
        Ok(self.tables.lock().await.tracks.iter().rev().cloned().collect())
    }

    async fn create_track(&self, track: CreateTrack) -> Result<UploadedTrack> {
        self.begin_write("create_track").await?;
        let now = Utc::now();
        let row = UploadedTrack {
            id: TrackId::generate(),
            user_id: track.user_id,
            title: track.title,
            artist: track.artist,
            album: track.album,
            duration: track.duration,
            cover_url: track.cover_url,
            audio_url: track.audio_url,
            created_at: now,
            updated_at: now,
        };
        self.tables.lock().await.tracks.push(row.clone());
        Ok(row)
    }

    async fn delete_track(&self, id: &TrackId) -> Result<()> {
        self.begin_write("delete_track").await?;
        self.tables.lock().await.tracks.retain(|t| &t.id != id);
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for MemoryBackend {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String> {
        self.begin_write("upload").await?;
        let key = format!("{}/{}", bucket, path);
        let mut tables = self.tables.lock().await;
        if tables.objects.contains_key(&key) {
            return Err(EncoreError::storage("The resource already exists"));
        }
        tables
            .objects
            .insert(key, (bytes, content_type.to_string()));
        Ok(path.to_string())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("memory://{}/{}", bucket, path)
    }

    async fn fetch(&self, url: &str) -> Result<FetchedObject> {
        self.begin_read("fetch").await?;
        self.tables
            .lock()
            .await
            .remote_objects
            .get(url)
            .cloned()
            .ok_or_else(|| EncoreError::network(format!("GET {} returned 404", url)))
    }
}

#[async_trait]
impl AuthProvider for MemoryBackend {
    async fn sign_up(&self, form: &SignUp) -> Result<User> {
        self.begin_write("sign_up").await?;
        if self.tables.lock().await.accounts.contains_key(&form.email) {
            return Err(EncoreError::AuthFailed("User already registered".to_string()));
        }
        let user = self
            .register(&form.email, &form.password, Some(&form.display_name))
            .await;
        self.tables.lock().await.current_user = Some(user.clone());
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<User> {
        self.begin_read("sign_in").await?;
        let mut tables = self.tables.lock().await;
        let user = match tables.accounts.get(email) {
            Some((user, stored)) if stored == password => user.clone(),
            _ => {
                return Err(EncoreError::AuthFailed(
                    "Invalid login credentials".to_string(),
                ))
            }
        };
        tables.current_user = Some(user.clone());
        Ok(user)
    }

    async fn sign_out(&self) -> Result<()> {
        self.begin_write("sign_out").await?;
        self.tables.lock().await.current_user = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn liked_rows_are_unique() {
        let backend = MemoryBackend::new();
        let user = UserId::new("u1");
        let track = TrackId::new("t1");

        backend.insert_liked(&user, &track).await.unwrap();
        assert!(backend.insert_liked(&user, &track).await.is_err());

        backend.delete_liked(&user, &track).await.unwrap();
        assert!(backend.get_liked_track_ids(&user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn playlists_come_back_newest_first() {
        let backend = MemoryBackend::new();
        let user = UserId::new("u1");

        let first = backend
            .create_playlist(CreatePlaylist::new(user.clone(), "First", None))
            .await
            .unwrap();
        let second = backend
            .create_playlist(CreatePlaylist::new(user.clone(), "Second", None))
            .await
            .unwrap();

        let ids: Vec<PlaylistId> = backend
            .get_user_playlists(&user)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn deleting_playlist_cascades_membership() {
        let backend = MemoryBackend::new();
        let playlist = backend
            .create_playlist(CreatePlaylist::new(UserId::new("u1"), "Mix", None))
            .await
            .unwrap();
        backend
            .add_playlist_track(PlaylistTrack::new(playlist.id.clone(), TrackId::new("t1"), 0))
            .await
            .unwrap();

        backend.delete_playlist(&playlist.id).await.unwrap();
        assert!(backend.playlist_track_rows(&playlist.id).await.is_empty());
    }

    #[tokio::test]
    async fn max_position_tracks_highest_row() {
        let backend = MemoryBackend::new();
        let id = PlaylistId::new("p1");
        assert_eq!(backend.get_max_position(&id).await.unwrap(), None);

        for position in [0, 4, 2] {
            backend
                .add_playlist_track(PlaylistTrack::new(id.clone(), TrackId::generate(), position))
                .await
                .unwrap();
        }
        assert_eq!(backend.get_max_position(&id).await.unwrap(), Some(4));
    }

    #[tokio::test]
    async fn injected_failures_are_reported() {
        let backend = MemoryBackend::new();
        backend.set_fail_writes(true).await;

        let err = backend
            .insert_liked(&UserId::new("u1"), &TrackId::new("t1"))
            .await
            .unwrap_err();
        assert!(matches!(err, EncoreError::Remote(_)));
        assert_eq!(backend.call_count("insert_liked").await, 1);
        assert!(backend.liked_rows(&UserId::new("u1")).await.is_empty());
    }

    #[tokio::test]
    async fn sign_in_checks_password() {
        let backend = MemoryBackend::new();
        backend.register("a@b.co", "secret", None).await;

        assert!(backend.sign_in("a@b.co", "wrong").await.is_err());
        let user = backend.sign_in("a@b.co", "secret").await.unwrap();
        assert_eq!(user.email, "a@b.co");
    }

    #[tokio::test]
    async fn uploads_do_not_overwrite() {
        let backend = MemoryBackend::new();
        let path = backend
            .upload("song", "u1/1-a.mp3", vec![1, 2, 3], "audio/mpeg")
            .await
            .unwrap();
        assert_eq!(path, "u1/1-a.mp3");
        assert!(backend
            .upload("song", "u1/1-a.mp3", vec![4], "audio/mpeg")
            .await
            .is_err());
        assert_eq!(
            backend.public_url("song", &path),
            "memory://song/u1/1-a.mp3"
        );
    }
}
