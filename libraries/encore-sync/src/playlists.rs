use crate::error::{Result, SyncError};
use crate::notice::{Notice, NoticeSink};
use crate::optimistic::{optimistic, EntityLocks};
use crate::session::Session;
use crate::SharedCatalog;
use encore_core::{
    next_position, CreatePlaylist, Playlist, PlaylistId, PlaylistTrack, PlaylistWithTracks,
    RemoteStore, TrackId,
};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

/// What a playlist page shows for a given id
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PlaylistView {
    Found(PlaylistWithTracks),
    NotFound { id: PlaylistId },
}

/// The signed-in user's playlists, newest first
pub struct Playlists {
    store: Arc<dyn RemoteStore>,
    session: Arc<Session>,
    notices: Arc<dyn NoticeSink>,
    catalog: SharedCatalog,
    playlists: RwLock<Vec<PlaylistWithTracks>>,
    loading: AtomicBool,
    locks: EntityLocks<PlaylistId>,
}

impl Playlists {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        session: Arc<Session>,
        notices: Arc<dyn NoticeSink>,
        catalog: SharedCatalog,
    ) -> Self {
        Self {
            store,
            session,
            notices,
            catalog,
            playlists: RwLock::new(Vec::new()),
            loading: AtomicBool::new(false),
            locks: EntityLocks::new(),
        }
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Fetch the user's playlists and resolve their tracks
    ///
    /// A playlist whose membership rows cannot be fetched is kept with an
    /// empty track list.
    pub async fn load(&self) -> Result<()> {
        let Some((user_id, epoch)) = self.session.user_at_epoch() else {
            self.clear().await;
            return Ok(());
        };

        self.loading.store(true, Ordering::SeqCst);
        let result = self.fetch_all(&user_id).await;
        self.loading.store(false, Ordering::SeqCst);

        if !self.session.is_current(epoch) {
            debug!(user_id = %user_id, "Session changed, playlists discarded");
            return Ok(());
        }

        match result {
            Ok(loaded) => {
                debug!(count = loaded.len(), "Playlists loaded");
                *self.playlists.write().await = loaded;
                Ok(())
            }
            Err(e) => {
                error!(user_id = %user_id, "Error fetching playlists: {}", e);
                Err(SyncError::Remote(e))
            }
        }
    }

    async fn fetch_all(
        &self,
        user_id: &encore_core::UserId,
    ) -> encore_core::Result<Vec<PlaylistWithTracks>> {
        let rows = self.store.get_user_playlists(user_id).await?;
        let mut loaded = Vec::with_capacity(rows.len());

        for playlist in rows {
            let entries = match self.store.get_playlist_tracks(&playlist.id).await {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(playlist_id = %playlist.id, "Error fetching playlist tracks: {}", e);
                    Vec::new()
                }
            };
            let tracks = self.catalog.read().await.resolve(&entries);
            loaded.push(PlaylistWithTracks::new(playlist, tracks));
        }

        Ok(loaded)
    }

    /// Drop every playlist (sign-out)
    pub async fn clear(&self) {
        self.playlists.write().await.clear();
        self.loading.store(false, Ordering::SeqCst);
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn playlists(&self) -> Vec<PlaylistWithTracks> {
        self.playlists.read().await.clone()
    }

    pub async fn get_playlist(&self, id: &PlaylistId) -> Option<PlaylistWithTracks> {
        self.playlists
            .read()
            .await
            .iter()
            .find(|p| p.id() == id)
            .cloned()
    }

    pub async fn playlist_view(&self, id: &PlaylistId) -> PlaylistView {
        match self.get_playlist(id).await {
            Some(playlist) => PlaylistView::Found(playlist),
            None => PlaylistView::NotFound { id: id.clone() },
        }
    }

    /// Playlists whose name or description contains `query`
    pub async fn search(&self, query: &str) -> Vec<PlaylistWithTracks> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.playlists
            .read()
            .await
            .iter()
            .filter(|p| p.matches(&needle))
            .cloned()
            .collect()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Create a playlist with no tracks
    ///
    /// The new playlist is shown first immediately and replaced by the
    /// stored row once the store confirms it.
    pub async fn create_playlist(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<PlaylistWithTracks> {
        let Some((user_id, epoch)) = self.session.user_at_epoch() else {
            self.notices
                .notify(Notice::sign_in_required("Please sign in to create playlists"));
            return Err(SyncError::AuthRequired);
        };

        let draft = CreatePlaylist::new(user_id, name, description.map(str::to_string));
        let id = draft.id.clone();
        let store = &self.store;
        let session = &self.session;

        let result = optimistic(
            &self.playlists,
            |playlists| {
                playlists.insert(0, PlaylistWithTracks::empty(Playlist::draft(&draft)));
            },
            |_| {
                let draft = draft.clone();
                async move {
                    debug!(playlist_id = %draft.id, "Creating playlist");
                    store.create_playlist(draft).await
                }
            },
            |playlists, ()| {
                if session.is_current(epoch) {
                    playlists.retain(|p| p.id() != &id);
                }
            },
        )
        .await;

        match result {
            Ok(stored) => {
                let created = {
                    let mut playlists = self.playlists.write().await;
                    let entry = if self.session.is_current(epoch) {
                        playlists.iter_mut().find(|p| p.id() == &id)
                    } else {
                        None
                    };
                    match entry {
                        Some(entry) => {
                            entry.playlist = stored;
                            entry.clone()
                        }
                        None => PlaylistWithTracks::empty(stored),
                    }
                };
                info!(playlist_id = %id, name, "Playlist created");
                self.notices.notify(Notice::info(
                    "Playlist created",
                    format!("\"{}\" has been created", name),
                ));
                Ok(created)
            }
            Err(e) => {
                warn!(playlist_id = %id, "Error creating playlist, reverted: {}", e);
                self.notices
                    .notify(Notice::error("Error", "Failed to create playlist"));
                Err(SyncError::Remote(e))
            }
        }
    }

    /// Delete a playlist; its membership rows go with it in the store
    pub async fn delete_playlist(&self, id: &PlaylistId) -> Result<()> {
        let Some((_, epoch)) = self.session.user_at_epoch() else {
            self.notices
                .notify(Notice::sign_in_required("Please sign in to delete playlists"));
            return Err(SyncError::AuthRequired);
        };

        let _guard = self.locks.lock(id).await;
        if !self.session.is_current(epoch) {
            return Err(SyncError::AuthRequired);
        }
        let store = &self.store;
        let session = &self.session;

        let result = optimistic(
            &self.playlists,
            |playlists| {
                let index = playlists.iter().position(|p| p.id() == id)?;
                Some((index, playlists.remove(index)))
            },
            |_| async move {
                debug!(playlist_id = %id, "Deleting playlist");
                store.delete_playlist(id).await
            },
            |playlists, removed| {
                if !session.is_current(epoch) {
                    return;
                }
                if let Some((index, playlist)) = removed {
                    playlists.insert(index.min(playlists.len()), playlist);
                }
            },
        )
        .await;

        match result {
            Ok(()) => {
                info!(playlist_id = %id, "Playlist deleted");
                self.notices
                    .notify(Notice::info("Playlist deleted", "The playlist has been removed"));
                Ok(())
            }
            Err(e) => {
                warn!(playlist_id = %id, "Error deleting playlist, reverted: {}", e);
                self.notices
                    .notify(Notice::error("Error", "Failed to delete playlist"));
                Err(SyncError::Remote(e))
            }
        }
    }

    /// Append a track, returning the position it was stored at
    ///
    /// The position is one past the stored maximum (0 for an empty
    /// playlist). The lookup and the insert run under the playlist's lock.
    pub async fn add_track_to_playlist(
        &self,
        playlist_id: &PlaylistId,
        track_id: &TrackId,
    ) -> Result<i64> {
        let Some((_, epoch)) = self.session.user_at_epoch() else {
            self.notices.notify(Notice::sign_in_required(
                "Please sign in to add tracks to playlists",
            ));
            return Err(SyncError::AuthRequired);
        };

        let _guard = self.locks.lock(playlist_id).await;

        let position = match self
            .store
            .get_max_position(playlist_id)
            .await
            .and_then(next_position)
        {
            Ok(position) => position,
            Err(e) => {
                warn!(playlist_id = %playlist_id, "Error reading playlist positions: {}", e);
                self.notices
                    .notify(Notice::error("Error", "Failed to add track to playlist"));
                return Err(SyncError::Remote(e));
            }
        };

        if !self.session.is_current(epoch) {
            return Err(SyncError::AuthRequired);
        }
        let track = self.catalog.read().await.get(track_id).cloned();
        let store = &self.store;
        let session = &self.session;
        let entry = PlaylistTrack::new(playlist_id.clone(), track_id.clone(), position);

        let result = optimistic(
            &self.playlists,
            |playlists| {
                let (Some(playlist), Some(track)) =
                    (playlists.iter_mut().find(|p| p.id() == playlist_id), track)
                else {
                    return false;
                };
                playlist.tracks.push(track);
                true
            },
            |_| async move {
                debug!(playlist_id = %entry.playlist_id, position, "Adding track to playlist");
                store.add_playlist_track(entry).await
            },
            |playlists, appended| {
                if !appended || !session.is_current(epoch) {
                    return;
                }
                if let Some(playlist) = playlists.iter_mut().find(|p| p.id() == playlist_id) {
                    if let Some(index) = playlist.tracks.iter().rposition(|t| &t.id == track_id) {
                        playlist.tracks.remove(index);
                    }
                }
            },
        )
        .await;

        match result {
            Ok(()) => {
                info!(playlist_id = %playlist_id, track_id = %track_id, position, "Track added to playlist");
                self.notices.notify(Notice::info(
                    "Track added",
                    "Track has been added to the playlist",
                ));
                Ok(position)
            }
            Err(e) => {
                warn!(playlist_id = %playlist_id, "Error adding track to playlist, reverted: {}", e);
                self.notices
                    .notify(Notice::error("Error", "Failed to add track to playlist"));
                Err(SyncError::Remote(e))
            }
        }
    }

    /// Remove every occurrence of a track from a playlist
    ///
    /// Remaining positions are not renumbered.
    pub async fn remove_track_from_playlist(
        &self,
        playlist_id: &PlaylistId,
        track_id: &TrackId,
    ) -> Result<()> {
        let Some((_, epoch)) = self.session.user_at_epoch() else {
            self.notices.notify(Notice::sign_in_required(
                "Please sign in to edit playlists",
            ));
            return Err(SyncError::AuthRequired);
        };

        let _guard = self.locks.lock(playlist_id).await;
        if !self.session.is_current(epoch) {
            return Err(SyncError::AuthRequired);
        }
        let store = &self.store;
        let session = &self.session;

        let result = optimistic(
            &self.playlists,
            |playlists| {
                let mut removed = Vec::new();
                if let Some(playlist) = playlists.iter_mut().find(|p| p.id() == playlist_id) {
                    let mut index = 0;
                    playlist.tracks.retain(|t| {
                        let keep = &t.id != track_id;
                        if !keep {
                            removed.push((index, t.clone()));
                        }
                        index += 1;
                        keep
                    });
                }
                removed
            },
            |_| async move {
                debug!(playlist_id = %playlist_id, track_id = %track_id, "Removing track from playlist");
                store.remove_playlist_track(playlist_id, track_id).await
            },
            |playlists, removed| {
                if !session.is_current(epoch) {
                    return;
                }
                if let Some(playlist) = playlists.iter_mut().find(|p| p.id() == playlist_id) {
                    for (index, track) in removed {
                        let index = index.min(playlist.tracks.len());
                        playlist.tracks.insert(index, track);
                    }
                }
            },
        )
        .await;

        match result {
            Ok(()) => {
                info!(playlist_id = %playlist_id, track_id = %track_id, "Track removed from playlist");
                self.notices.notify(Notice::info(
                    "Track removed",
                    "Track has been removed from the playlist",
                ));
                Ok(())
            }
            Err(e) => {
                warn!(playlist_id = %playlist_id, "Error removing track from playlist, reverted: {}", e);
                self.notices.notify(Notice::error(
                    "Error",
                    "Failed to remove track from playlist",
                ));
                Err(SyncError::Remote(e))
            }
        }
    }
}
