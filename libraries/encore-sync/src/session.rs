use crate::error::{Result, SyncError};
use encore_core::{User, UserId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use tracing::info;

/// Signed-in identity for the lifetime of one sign-in
///
/// Shared by every sync collection; operations read it once at their start.
/// The epoch changes on every sign-in and sign-out, so a request can tell
/// whether the state it touched still belongs to the user who issued it.
#[derive(Debug, Default)]
pub struct Session {
    user: RwLock<Option<User>>,
    epoch: AtomicU64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session already signed in as `user`
    pub fn signed_in(user: User) -> Self {
        Self {
            user: RwLock::new(Some(user)),
            epoch: AtomicU64::new(0),
        }
    }

    pub fn start(&self, user: User) {
        info!(user_id = %user.id, "Session started");
        let mut current = self.user.write().unwrap_or_else(PoisonError::into_inner);
        *current = Some(user);
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    pub fn end(&self) {
        let previous = {
            let mut current = self.user.write().unwrap_or_else(PoisonError::into_inner);
            self.epoch.fetch_add(1, Ordering::SeqCst);
            current.take()
        };
        if let Some(user) = previous {
            info!(user_id = %user.id, "Session ended");
        }
    }

    /// Counter bumped by every `start` and `end`
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// True while no sign-in or sign-out happened since `epoch` was read
    pub fn is_current(&self, epoch: u64) -> bool {
        self.epoch() == epoch
    }

    /// Current user together with the epoch it belongs to
    pub fn user_at_epoch(&self) -> Option<(UserId, u64)> {
        let user = self.user.read().unwrap_or_else(PoisonError::into_inner);
        user.as_ref()
            .map(|u| (u.id.clone(), self.epoch.load(Ordering::SeqCst)))
    }

    pub fn current_user(&self) -> Option<User> {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.current_user().map(|u| u.id)
    }

    pub fn is_signed_in(&self) -> bool {
        self.user
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Current user, or `AuthRequired`
    pub fn require_user(&self) -> Result<User> {
        self.current_user().ok_or(SyncError::AuthRequired)
    }
}
