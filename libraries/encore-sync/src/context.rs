//! Application context
//!
//! Owns the session and every synced collection. Built once at start-up and
//! passed by reference to whatever needs it; sign-in loads the user's data,
//! sign-out clears it.

use crate::error::{Result, SyncError};
use crate::liked::LikedSongs;
use crate::notice::{Notice, NoticeSink};
use crate::playlists::Playlists;
use crate::session::Session;
use crate::uploads::UploadedTracks;
use crate::SharedCatalog;
use encore_core::validation::{validate_sign_in, validate_sign_up};
use encore_core::{
    AuthProvider, EncoreError, MemoryBackend, ObjectStorage, PlaylistWithTracks, RemoteStore,
    SignUp, Track, TrackCatalog, User,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// The three backend collaborators
#[derive(Clone)]
pub struct Backend {
    pub store: Arc<dyn RemoteStore>,
    pub objects: Arc<dyn ObjectStorage>,
    pub auth: Arc<dyn AuthProvider>,
}

impl Backend {
    /// All three roles served by one in-memory backend
    pub fn memory(backend: Arc<MemoryBackend>) -> Self {
        Self {
            store: backend.clone(),
            objects: backend.clone(),
            auth: backend,
        }
    }
}

/// What the library page shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LibraryView {
    SignInRequired,
    Ready {
        playlists: Vec<PlaylistWithTracks>,
        liked_count: usize,
    },
}

/// Combined search hits
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResults {
    pub tracks: Vec<Track>,
    pub playlists: Vec<PlaylistWithTracks>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty() && self.playlists.is_empty()
    }
}

pub struct AppContext {
    auth: Arc<dyn AuthProvider>,
    session: Arc<Session>,
    notices: Arc<dyn NoticeSink>,
    catalog: SharedCatalog,
    liked: Arc<LikedSongs>,
    playlists: Arc<Playlists>,
    uploads: Arc<UploadedTracks>,
}

impl AppContext {
    /// Signed-out context over `backend` with `catalog` as the known tracks
    pub fn new(backend: Backend, catalog: TrackCatalog, notices: Arc<dyn NoticeSink>) -> Self {
        let session = Arc::new(Session::new());
        let catalog: SharedCatalog = Arc::new(RwLock::new(catalog));

        let liked = Arc::new(LikedSongs::new(
            backend.store.clone(),
            session.clone(),
            notices.clone(),
        ));
        let playlists = Arc::new(Playlists::new(
            backend.store.clone(),
            session.clone(),
            notices.clone(),
            catalog.clone(),
        ));
        let uploads = Arc::new(UploadedTracks::new(
            backend.store,
            backend.objects,
            session.clone(),
            notices.clone(),
            catalog.clone(),
        ));

        Self {
            auth: backend.auth,
            session,
            notices,
            catalog,
            liked,
            playlists,
            uploads,
        }
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User> {
        validate_sign_in(email, password)?;

        let user = match self.auth.sign_in(email, password).await {
            Ok(user) => user,
            Err(e) => {
                warn!(email, "Sign in failed: {}", e);
                self.notices.notify(Notice::error(
                    "Sign in failed",
                    "Invalid email or password. Please try again.",
                ));
                return Err(SyncError::Remote(e));
            }
        };

        self.start_session(user.clone()).await;
        Ok(user)
    }

    pub async fn sign_up(&self, form: &SignUp) -> Result<User> {
        validate_sign_up(form)?;

        let user = match self.auth.sign_up(form).await {
            Ok(user) => user,
            Err(e) => {
                warn!(email = %form.email, "Sign up failed: {}", e);
                let notice = match &e {
                    EncoreError::AuthFailed(msg) if msg.contains("already registered") => {
                        Notice::error(
                            "Account exists",
                            "This email is already registered. Try signing in instead.",
                        )
                    }
                    other => Notice::error("Sign up failed", other.to_string()),
                };
                self.notices.notify(notice);
                return Err(SyncError::Remote(e));
            }
        };

        self.notices.notify(Notice::info(
            "Welcome to Encore!",
            "Your account has been created successfully.",
        ));
        self.start_session(user.clone()).await;
        Ok(user)
    }

    /// End the session and drop the user's data
    ///
    /// Local state is cleared even if the provider call fails.
    pub async fn sign_out(&self) -> Result<()> {
        let result = self.auth.sign_out().await;
        if let Err(e) = &result {
            warn!("Sign out failed at provider: {}", e);
        }

        self.session.end();
        self.liked.clear().await;
        self.playlists.clear().await;

        result.map_err(SyncError::Remote)
    }

    async fn start_session(&self, user: User) {
        info!(user_id = %user.id, "Signed in");
        self.session.start(user);
        self.refresh().await;
    }

    /// Reload liked songs, uploads and playlists
    ///
    /// Load failures are logged and leave the affected collection as it was.
    /// Signed out, uploads are still fetched while the per-user collections
    /// stay empty; call this once after `new` to populate a fresh context.
    pub async fn refresh(&self) {
        if let Err(e) = self.liked.load().await {
            warn!("Liked songs not refreshed: {}", e);
        }
        // Uploads first so playlists can resolve uploaded tracks
        if let Err(e) = self.uploads.load().await {
            warn!("Uploaded tracks not refreshed: {}", e);
        }
        if let Err(e) = self.playlists.load().await {
            warn!("Playlists not refreshed: {}", e);
        }
    }

    // ========================================================================
    // Views
    // ========================================================================

    pub async fn library_view(&self) -> LibraryView {
        if !self.session.is_signed_in() {
            return LibraryView::SignInRequired;
        }

        LibraryView::Ready {
            playlists: self.playlists.playlists().await,
            liked_count: self.liked.count().await,
        }
    }

    /// Liked tracks that the catalog knows about
    pub async fn liked_tracks(&self) -> Vec<Track> {
        let ids = self.liked.liked_ids().await;
        let catalog = self.catalog.read().await;
        ids.iter().filter_map(|id| catalog.get(id).cloned()).collect()
    }

    pub async fn search(&self, query: &str) -> SearchResults {
        SearchResults {
            tracks: self.catalog.read().await.search(query),
            playlists: self.playlists.search(query).await,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn current_user(&self) -> Option<User> {
        self.session.current_user()
    }

    pub fn liked(&self) -> &Arc<LikedSongs> {
        &self.liked
    }

    pub fn playlists(&self) -> &Arc<Playlists> {
        &self.playlists
    }

    pub fn uploads(&self) -> &Arc<UploadedTracks> {
        &self.uploads
    }

    pub fn catalog(&self) -> &SharedCatalog {
        &self.catalog
    }

    pub fn notices(&self) -> &Arc<dyn NoticeSink> {
        &self.notices
    }
}
