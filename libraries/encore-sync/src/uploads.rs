//! User-uploaded tracks
//!
//! Uploading is not optimistic: the row only appears once the object
//! upload and the insert have both succeeded. Deleting is.

use crate::error::{Result, SyncError};
use crate::notice::{Notice, NoticeSink};
use crate::optimistic::optimistic;
use crate::session::Session;
use crate::SharedCatalog;
use chrono::Utc;
use encore_core::validation::validate_upload;
use encore_core::{
    CreateTrack, EncoreError, ObjectStorage, RemoteStore, Track, TrackId, TrackMetadata,
    UploadedTrack, UserId,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Bucket holding audio files
pub const AUDIO_BUCKET: &str = "song";

/// Bucket holding cover images
pub const COVER_BUCKET: &str = "album-covers";

const DEFAULT_AUDIO_CONTENT_TYPE: &str = "audio/mpeg";

/// A file picked by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub name: String,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl MediaFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>, content_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bytes,
            content_type: content_type.into(),
        }
    }
}

/// How a track added by URL is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// Keep the URL and stream from it
    Stream,
    /// Copy the audio into our own storage
    Download,
}

/// File extension for a fetched audio content type
pub fn extension_for_content_type(content_type: &str) -> &'static str {
    if content_type.contains("wav") {
        "wav"
    } else if content_type.contains("ogg") {
        "ogg"
    } else if content_type.contains("m4a") || content_type.contains("mp4") {
        "m4a"
    } else {
        "mp3"
    }
}

/// Title reduced to `[A-Za-z0-9_]` for use in a storage path
pub fn sanitize_file_stem(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Storage path `<user>/<unix millis>-<name>`
pub fn object_path(user_id: &UserId, file_name: &str) -> String {
    format!("{}/{}-{}", user_id, Utc::now().timestamp_millis(), file_name)
}

fn rounded_duration(seconds: f64) -> u32 {
    if seconds.is_finite() && seconds > 0.0 {
        seconds.round().min(f64::from(u32::MAX)) as u32
    } else {
        0
    }
}

/// Resets the uploading flag when an upload finishes either way
struct UploadingGuard<'a>(&'a AtomicBool);

impl<'a> UploadingGuard<'a> {
    fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for UploadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Every uploaded track, newest first
pub struct UploadedTracks {
    store: Arc<dyn RemoteStore>,
    objects: Arc<dyn ObjectStorage>,
    session: Arc<Session>,
    notices: Arc<dyn NoticeSink>,
    catalog: SharedCatalog,
    tracks: RwLock<Vec<UploadedTrack>>,
    loading: AtomicBool,
    uploading: AtomicBool,
}

impl UploadedTracks {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        objects: Arc<dyn ObjectStorage>,
        session: Arc<Session>,
        notices: Arc<dyn NoticeSink>,
        catalog: SharedCatalog,
    ) -> Self {
        Self {
            store,
            objects,
            session,
            notices,
            catalog,
            tracks: RwLock::new(Vec::new()),
            loading: AtomicBool::new(false),
            uploading: AtomicBool::new(false),
        }
    }

    /// Fetch all uploaded tracks and add them to the catalog
    pub async fn load(&self) -> Result<()> {
        self.loading.store(true, Ordering::SeqCst);
        let result = self.store.get_uploaded_tracks().await;
        self.loading.store(false, Ordering::SeqCst);

        match result {
            Ok(rows) => {
                debug!(count = rows.len(), "Uploaded tracks loaded");
                {
                    let mut catalog = self.catalog.write().await;
                    for row in &rows {
                        catalog.insert(row.to_track());
                    }
                }
                *self.tracks.write().await = rows;
                Ok(())
            }
            Err(e) => {
                error!("Error fetching tracks: {}", e);
                Err(SyncError::Remote(e))
            }
        }
    }

    pub async fn tracks(&self) -> Vec<UploadedTrack> {
        self.tracks.read().await.clone()
    }

    /// Tracks uploaded by one user
    pub async fn user_tracks(&self, user_id: &UserId) -> Vec<UploadedTrack> {
        self.tracks
            .read()
            .await
            .iter()
            .filter(|t| &t.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Uploaded tracks as playable tracks
    pub async fn player_tracks(&self) -> Vec<Track> {
        self.tracks
            .read()
            .await
            .iter()
            .map(UploadedTrack::to_track)
            .collect()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading.load(Ordering::SeqCst)
    }

    /// Upload an audio file (and optional cover) and record the track
    ///
    /// `duration_secs` is the probed length of the audio; it is stored
    /// rounded to whole seconds.
    pub async fn upload_track(
        &self,
        audio: MediaFile,
        cover: Option<MediaFile>,
        metadata: &TrackMetadata,
        duration_secs: f64,
    ) -> Result<UploadedTrack> {
        let Some(user_id) = self.session.user_id() else {
            self.notices
                .notify(Notice::sign_in_required("Please sign in to upload tracks"));
            return Err(SyncError::AuthRequired);
        };
        validate_upload(metadata, !audio.bytes.is_empty())?;

        let _uploading = UploadingGuard::start(&self.uploading);
        let result = self
            .store_upload(&user_id, audio, cover, metadata, duration_secs)
            .await;

        match result {
            Ok(track) => {
                self.record(track.clone()).await;
                info!(track_id = %track.id, title = %track.title, "Track uploaded");
                self.notices.notify(Notice::info(
                    "Track uploaded",
                    format!("\"{}\" has been uploaded successfully", metadata.title),
                ));
                Ok(track)
            }
            Err(e) => {
                error!("Error uploading track: {}", e);
                self.notices.notify(Notice::error(
                    "Upload failed",
                    "Failed to upload track. Please try again.",
                ));
                Err(SyncError::Remote(e))
            }
        }
    }

    async fn store_upload(
        &self,
        user_id: &UserId,
        audio: MediaFile,
        cover: Option<MediaFile>,
        metadata: &TrackMetadata,
        duration_secs: f64,
    ) -> encore_core::Result<UploadedTrack> {
        let audio_path = object_path(user_id, &audio.name);
        debug!(path = %audio_path, size = audio.bytes.len(), "Uploading audio");
        let stored = self
            .objects
            .upload(AUDIO_BUCKET, &audio_path, audio.bytes, &audio.content_type)
            .await?;
        let audio_url = self.objects.public_url(AUDIO_BUCKET, &stored);

        let cover_url = self.upload_cover(user_id, cover).await?;

        self.store
            .create_track(CreateTrack {
                user_id: user_id.clone(),
                title: metadata.title.clone(),
                artist: metadata.artist.clone(),
                album: metadata.album(),
                duration: rounded_duration(duration_secs),
                cover_url,
                audio_url,
            })
            .await
    }

    async fn upload_cover(
        &self,
        user_id: &UserId,
        cover: Option<MediaFile>,
    ) -> encore_core::Result<Option<String>> {
        let Some(cover) = cover else {
            return Ok(None);
        };

        let path = object_path(user_id, &cover.name);
        debug!(path = %path, "Uploading cover");
        let stored = self
            .objects
            .upload(COVER_BUCKET, &path, cover.bytes, &cover.content_type)
            .await?;
        Ok(Some(self.objects.public_url(COVER_BUCKET, &stored)))
    }

    /// Record a track found at a URL
    ///
    /// In `Stream` mode the URL is stored as is. In `Download` mode the
    /// audio is fetched and copied into the audio bucket first.
    pub async fn add_track_from_url(
        &self,
        url: &str,
        cover: Option<MediaFile>,
        metadata: &TrackMetadata,
        mode: StorageMode,
        duration_secs: f64,
    ) -> Result<UploadedTrack> {
        let Some(user_id) = self.session.user_id() else {
            self.notices
                .notify(Notice::sign_in_required("Please sign in to add tracks"));
            return Err(SyncError::AuthRequired);
        };
        validate_upload(metadata, !url.trim().is_empty())?;

        let _uploading = UploadingGuard::start(&self.uploading);
        let result = self
            .store_from_url(&user_id, url.trim(), cover, metadata, mode, duration_secs)
            .await;

        match result {
            Ok(track) => {
                self.record(track.clone()).await;
                info!(track_id = %track.id, ?mode, "Track added from URL");
                self.notices.notify(Notice::info(
                    "Track added",
                    format!("\"{}\" has been added successfully", metadata.title),
                ));
                Ok(track)
            }
            Err(e) => {
                error!(url, "Error adding track from URL: {}", e);
                self.notices
                    .notify(Notice::error("Failed to add track", e.to_string()));
                Err(SyncError::Remote(e))
            }
        }
    }

    async fn store_from_url(
        &self,
        user_id: &UserId,
        url: &str,
        cover: Option<MediaFile>,
        metadata: &TrackMetadata,
        mode: StorageMode,
        duration_secs: f64,
    ) -> encore_core::Result<UploadedTrack> {
        let audio_url = match mode {
            StorageMode::Stream => url.to_string(),
            StorageMode::Download => {
                let fetched = self.objects.fetch(url).await.map_err(|e| {
                    EncoreError::network(format!("Failed to fetch audio from URL: {}", e))
                })?;
                let content_type = fetched
                    .content_type
                    .unwrap_or_else(|| DEFAULT_AUDIO_CONTENT_TYPE.to_string());
                let file_name = format!(
                    "{}.{}",
                    sanitize_file_stem(&metadata.title),
                    extension_for_content_type(&content_type)
                );
                let path = object_path(user_id, &file_name);
                debug!(path = %path, size = fetched.bytes.len(), "Copying audio from URL");
                let stored = self
                    .objects
                    .upload(AUDIO_BUCKET, &path, fetched.bytes, &content_type)
                    .await?;
                self.objects.public_url(AUDIO_BUCKET, &stored)
            }
        };

        let cover_url = self.upload_cover(user_id, cover).await?;

        self.store
            .create_track(CreateTrack {
                user_id: user_id.clone(),
                title: metadata.title.clone(),
                artist: metadata.artist.clone(),
                album: metadata.album(),
                duration: rounded_duration(duration_secs),
                cover_url,
                audio_url,
            })
            .await
    }

    async fn record(&self, track: UploadedTrack) {
        self.catalog.write().await.insert(track.to_track());
        self.tracks.write().await.insert(0, track);
    }

    /// Delete an uploaded track row
    ///
    /// The track must be known locally. Stored objects are left in place.
    pub async fn delete_track(&self, id: &TrackId) -> Result<()> {
        if !self.session.is_signed_in() {
            self.notices
                .notify(Notice::sign_in_required("Please sign in to delete tracks"));
            return Err(SyncError::AuthRequired);
        }
        if !self.tracks.read().await.iter().any(|t| &t.id == id) {
            return Err(SyncError::not_found("Track", id));
        }

        let store = &self.store;
        let result = optimistic(
            &self.tracks,
            |tracks| {
                let index = tracks.iter().position(|t| &t.id == id)?;
                Some((index, tracks.remove(index)))
            },
            |_| async move {
                debug!(track_id = %id, "Deleting track");
                store.delete_track(id).await
            },
            |tracks, removed| {
                if let Some((index, track)) = removed {
                    tracks.insert(index.min(tracks.len()), track);
                }
            },
        )
        .await;

        match result {
            Ok(()) => {
                info!(track_id = %id, "Track deleted");
                self.notices
                    .notify(Notice::info("Track deleted", "The track has been removed"));
                Ok(())
            }
            Err(e) => {
                warn!(track_id = %id, "Error deleting track, reverted: {}", e);
                self.notices
                    .notify(Notice::error("Error", "Failed to delete track"));
                Err(SyncError::Remote(e))
            }
        }
    }
}
