use crate::error::{Result, SyncError};
use crate::notice::{Notice, NoticeSink};
use crate::optimistic::{optimistic, EntityLocks};
use crate::session::Session;
use encore_core::{RemoteStore, TrackId};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

/// Liked-song set of the signed-in user
pub struct LikedSongs {
    store: Arc<dyn RemoteStore>,
    session: Arc<Session>,
    notices: Arc<dyn NoticeSink>,
    liked: RwLock<BTreeSet<TrackId>>,
    loading: AtomicBool,
    locks: EntityLocks<TrackId>,
}

impl LikedSongs {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        session: Arc<Session>,
        notices: Arc<dyn NoticeSink>,
    ) -> Self {
        Self {
            store,
            session,
            notices,
            liked: RwLock::new(BTreeSet::new()),
            loading: AtomicBool::new(false),
            locks: EntityLocks::new(),
        }
    }

    /// Replace the local set with the user's stored likes
    ///
    /// Signed out, the set is simply emptied. A failed fetch keeps the
    /// current set.
    pub async fn load(&self) -> Result<()> {
        let Some((user_id, epoch)) = self.session.user_at_epoch() else {
            self.clear().await;
            return Ok(());
        };

        self.loading.store(true, Ordering::SeqCst);
        debug!(user_id = %user_id, "Fetching liked songs");
        let result = self.store.get_liked_track_ids(&user_id).await;
        self.loading.store(false, Ordering::SeqCst);

        if !self.session.is_current(epoch) {
            debug!(user_id = %user_id, "Session changed, liked songs discarded");
            return Ok(());
        }

        match result {
            Ok(ids) => {
                debug!(count = ids.len(), "Liked songs loaded");
                *self.liked.write().await = ids.into_iter().collect();
                Ok(())
            }
            Err(e) => {
                error!(user_id = %user_id, "Error fetching liked songs: {}", e);
                Err(SyncError::Remote(e))
            }
        }
    }

    /// Forget every like (sign-out)
    pub async fn clear(&self) {
        self.liked.write().await.clear();
        self.loading.store(false, Ordering::SeqCst);
    }

    /// Flip the like state of a track, returning the new state
    ///
    /// Silent on success. On failure the track's previous state is restored
    /// and an error notice is emitted.
    pub async fn toggle_like(&self, track_id: &TrackId) -> Result<bool> {
        let Some((user_id, epoch)) = self.session.user_at_epoch() else {
            self.notices.notify(Notice::sign_in_required(
                "Please sign in to save your liked songs.",
            ));
            return Err(SyncError::AuthRequired);
        };

        let _guard = self.locks.lock(track_id).await;
        // Signed out while waiting behind another toggle
        if !self.session.is_current(epoch) {
            return Err(SyncError::AuthRequired);
        }
        let store = &self.store;
        let session = &self.session;

        let result = optimistic(
            &self.liked,
            |liked| {
                let was_liked = liked.contains(track_id);
                if was_liked {
                    liked.remove(track_id);
                } else {
                    liked.insert(track_id.clone());
                }
                was_liked
            },
            |&was_liked| {
                let user_id = user_id.clone();
                let track_id = track_id.clone();
                async move {
                    if was_liked {
                        debug!(track_id = %track_id, "Removing liked song");
                        store.delete_liked(&user_id, &track_id).await?;
                    } else {
                        debug!(track_id = %track_id, "Inserting liked song");
                        store.insert_liked(&user_id, &track_id).await?;
                    }
                    Ok(!was_liked)
                }
            },
            |liked, was_liked| {
                // The set now belongs to another session
                if !session.is_current(epoch) {
                    return;
                }
                if was_liked {
                    liked.insert(track_id.clone());
                } else {
                    liked.remove(track_id);
                }
            },
        )
        .await;

        result.map_err(|e| {
            if self.session.is_current(epoch) {
                warn!(track_id = %track_id, "Error toggling like, reverted: {}", e);
                self.notices.notify(Notice::error(
                    "Error",
                    "Failed to update liked songs. Please try again.",
                ));
            } else {
                debug!(track_id = %track_id, "Like toggle failed after session change: {}", e);
            }
            SyncError::Remote(e)
        })
    }

    pub async fn is_liked(&self, track_id: &TrackId) -> bool {
        self.liked.read().await.contains(track_id)
    }

    /// Liked track ids in id order
    pub async fn liked_ids(&self) -> Vec<TrackId> {
        self.liked.read().await.iter().cloned().collect()
    }

    pub async fn count(&self) -> usize {
        self.liked.read().await.len()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }
}
