// Snapshot cache with a time-to-live

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use ctrlboard_recon::Snapshot;

use crate::error::LoadError;

/// Holds the last loaded snapshot and reloads it once it is older than `ttl`.
///
/// Readers share the snapshot through an `Arc`; a refresh swaps it whole,
/// so nobody observes a half-loaded state.
pub struct SnapshotCache {
    ttl: Duration,
    state: RwLock<Option<Cached>>,
}

struct Cached {
    snapshot: Arc<Snapshot>,
    loaded_at: Instant,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: RwLock::new(None),
        }
    }

    /// The cached snapshot if still fresh, otherwise the result of `load`.
    ///
    /// A failed load returns the error and leaves the previous snapshot in
    /// place; it stays reachable through [`SnapshotCache::current`].
    pub fn get_or_refresh<F>(&self, load: F) -> Result<Arc<Snapshot>, LoadError>
    where
        F: FnOnce() -> Result<Snapshot, LoadError>,
    {
        if let Some(cached) = self.state.read().as_ref() {
            if cached.loaded_at.elapsed() < self.ttl {
                return Ok(Arc::clone(&cached.snapshot));
            }
        }

        let mut state = self.state.write();
        // Another caller may have refreshed while we waited for the lock.
        if let Some(cached) = state.as_ref() {
            if cached.loaded_at.elapsed() < self.ttl {
                return Ok(Arc::clone(&cached.snapshot));
            }
        }

        log::debug!("snapshot cache miss, reloading");
        match load() {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                *state = Some(Cached {
                    snapshot: Arc::clone(&snapshot),
                    loaded_at: Instant::now(),
                });
                Ok(snapshot)
            }
            Err(e) => {
                if state.is_some() {
                    log::warn!("refresh failed, keeping previous snapshot: {e}");
                }
                Err(e)
            }
        }
    }

    /// Last loaded snapshot, fresh or not.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.state.read().as_ref().map(|c| Arc::clone(&c.snapshot))
    }

    /// Drop the cached snapshot; the next access reloads.
    pub fn invalidate(&self) {
        *self.state.write() = None;
    }

    pub fn age(&self) -> Option<Duration> {
        self.state.read().as_ref().map(|c| c.loaded_at.elapsed())
    }
}
