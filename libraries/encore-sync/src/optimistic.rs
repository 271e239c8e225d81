//! Optimistic mutation
//!
//! One routine shared by liked songs, playlists and playlist membership:
//! apply the change locally, issue the remote call, and revert the change
//! if the call fails. Each resource supplies its own apply / remote / revert
//! triple.

use encore_core::EncoreError;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard, RwLock};

/// Apply `apply` to `state`, run the remote call, and revert on failure
///
/// `apply` returns whatever `revert` needs to undo the change. The remote
/// future is built from that value and is only awaited after the local
/// change is visible. No lock on `state` is held while it is pending.
pub async fn optimistic<S, Snap, T, Remote, Fut>(
    state: &RwLock<S>,
    apply: impl FnOnce(&mut S) -> Snap,
    remote: Remote,
    revert: impl FnOnce(&mut S, Snap),
) -> Result<T, EncoreError>
where
    Remote: FnOnce(&Snap) -> Fut,
    Fut: Future<Output = Result<T, EncoreError>>,
{
    let snapshot = {
        let mut guard = state.write().await;
        apply(&mut guard)
    };

    match remote(&snapshot).await {
        Ok(value) => Ok(value),
        Err(err) => {
            let mut guard = state.write().await;
            revert(&mut guard, snapshot);
            Err(err)
        }
    }
}

/// Per-entity async locks
///
/// Mutations on the same entity id run one after another; different ids
/// proceed independently.
pub struct EntityLocks<K> {
    locks: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K> Default for EntityLocks<K> {
    fn default() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> EntityLocks<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`
    pub async fn lock(&self, key: &K) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries nobody holds or waits on can go
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(locks.entry(key.clone()).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of ids currently tracked
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
