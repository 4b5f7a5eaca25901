//! Per-key coalescing of concurrent builds.
//!
//! The first caller for a key starts the build on a detached task; callers
//! arriving while it runs wait on the same result. A client that goes away
//! mid-request therefore never cancels a build other callers depend on.

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use mediavault_common::{Error, Result};
use tokio::sync::watch;

type Slot<V> = watch::Receiver<Option<Result<V>>>;

/// Coalesces concurrent builds per key.
pub struct SingleFlight<K, V> {
    inflight: Arc<DashMap<K, Slot<V>>>,
}

impl<K, V> Clone for SingleFlight<K, V> {
    fn clone(&self) -> Self {
        Self {
            inflight: Arc::clone(&self.inflight),
        }
    }
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self {
            inflight: Arc::new(DashMap::new()),
        }
    }
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `build` for `key`, or join the build already in flight.
    ///
    /// `build` is only called when this caller starts a new flight.
    pub async fn run<F, Fut>(&self, key: K, build: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>> + Send + 'static,
    {
        let mut rx = match self.inflight.entry(key.clone()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                let (tx, rx) = watch::channel(None);
                entry.insert(rx.clone());

                let fut = build();
                let guard = FlightGuard {
                    inflight: Arc::clone(&self.inflight),
                    key,
                };
                tokio::spawn(async move {
                    let result = fut.await;
                    // Unregister before publishing so later callers start
                    // fresh instead of reading a finished slot.
                    drop(guard);
                    let _ = tx.send(Some(result));
                });
                rx
            }
        };

        let outcome = rx
            .wait_for(Option::is_some)
            .await
            .map_err(|_| Error::internal("build task ended without a result"))?;

        match &*outcome {
            Some(result) => result.clone(),
            None => Err(Error::internal("build task ended without a result")),
        }
    }

    /// Number of builds currently in flight.
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }
}

/// Removes the key when the build finishes or its task panics.
struct FlightGuard<K: Eq + Hash, V> {
    inflight: Arc<DashMap<K, Slot<V>>>,
    key: K,
}

impl<K: Eq + Hash, V> Drop for FlightGuard<K, V> {
    fn drop(&mut self) {
        self.inflight.remove(&self.key);
    }
}
