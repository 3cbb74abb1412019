//! Keyed coalescing of in-flight requests.
//!
//! The first caller for a key spawns the producer on the runtime and parks a
//! shared handle to it in the pending map; later callers for the same key
//! await that handle instead of starting a second request. The spawned task
//! removes its own map entry before it yields the result, so by the time any
//! caller observes a value a fresh call for the key starts a new request.
//!
//! Because the work runs in its own task, dropping a caller only drops that
//! caller's wait. The request itself always runs to completion.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinError;
use tracing::debug;

type SharedOutcome<V, E> = Shared<BoxFuture<'static, Result<V, Arc<E>>>>;
type PendingMap<K, V, E> = Arc<Mutex<HashMap<K, SharedOutcome<V, E>>>>;

/// Coalesces concurrent requests that share a key.
///
/// Errors are shared behind an `Arc` so every joiner receives the same error
/// value. A panicking producer surfaces as `E::from(JoinError)`.
pub struct RequestDeduplicator<K, V, E> {
    pending: PendingMap<K, V, E>,
}

impl<K, V, E> RequestDeduplicator<K, V, E>
where
    K: Eq + Hash + Clone + std::fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: From<JoinError> + Send + Sync + 'static,
{
    /// Create an empty deduplicator.
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run `producer` for `key`, or join the run already in flight.
    ///
    /// `producer` is only invoked when no request for `key` is pending.
    pub async fn add_or_wait<F, Fut>(&self, key: K, producer: F) -> Result<V, Arc<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let shared = {
            let mut pending = lock(&self.pending);
            match pending.get(&key) {
                Some(existing) => {
                    debug!("Joining in-flight request for {:?}", key);
                    existing.clone()
                }
                None => {
                    let shared = spawn_shared(Arc::clone(&self.pending), key.clone(), producer());
                    pending.insert(key, shared.clone());
                    shared
                }
            }
        };

        shared.await
    }

    /// Whether a request for `key` is currently in flight.
    pub fn is_pending(&self, key: &K) -> bool {
        lock(&self.pending).contains_key(key)
    }

    /// Number of distinct keys currently in flight.
    pub fn pending_count(&self) -> usize {
        lock(&self.pending).len()
    }
}

impl<K, V, E> Default for RequestDeduplicator<K, V, E>
where
    K: Eq + Hash + Clone + std::fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: From<JoinError> + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Removes the pending entry when the spawned task finishes, including when
/// the producer panics.
struct PendingGuard<K: Eq + Hash, V, E> {
    pending: PendingMap<K, V, E>,
    key: K,
}

impl<K: Eq + Hash, V, E> Drop for PendingGuard<K, V, E> {
    fn drop(&mut self) {
        lock(&self.pending).remove(&self.key);
    }
}

fn spawn_shared<K, V, E, Fut>(pending: PendingMap<K, V, E>, key: K, work: Fut) -> SharedOutcome<V, E>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    E: From<JoinError> + Send + Sync + 'static,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
{
    // The caller holds the map lock until the entry is inserted, so the guard
    // can never remove the entry before it exists.
    let handle = tokio::spawn(async move {
        let _guard = PendingGuard { pending, key };
        work.await.map_err(Arc::new)
    });

    async move {
        match handle.await {
            Ok(outcome) => outcome,
            Err(join_error) => Err(Arc::new(E::from(join_error))),
        }
    }
    .boxed()
    .shared()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
