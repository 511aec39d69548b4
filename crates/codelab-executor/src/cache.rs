//! Runtime registry cache.
//!
//! The list of runtimes changes rarely, so it is fetched once and kept for a
//! TTL (24 hours by default). The snapshot is replaced wholesale on refresh.
//!
//! No lock is held while the fetch is in flight: two callers that both find
//! the snapshot expired will both fetch, and whichever finishes last wins.
//! Every successful fetch is an equally valid snapshot, so this only costs a
//! duplicate request.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::backend::ExecutionBackend;
use crate::error::Result;
use crate::types::RuntimeDescriptor;

/// Default time a fetched runtime list stays valid.
pub const DEFAULT_RUNTIME_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Shared, immutable runtime list.
pub type Runtimes = Arc<Vec<RuntimeDescriptor>>;

#[derive(Debug, Clone)]
struct Snapshot {
    data: Runtimes,
    fetched_at: Instant,
}

/// Cache owning the last fetched runtime list and its fetch time.
#[derive(Debug)]
pub struct RuntimeCache {
    ttl: Duration,
    serve_stale_on_error: bool,
    snapshot: RwLock<Option<Snapshot>>,
}

impl Default for RuntimeCache {
    fn default() -> Self {
        Self::new(DEFAULT_RUNTIME_TTL)
    }
}

impl RuntimeCache {
    /// Create an empty cache with the given TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            serve_stale_on_error: false,
            snapshot: RwLock::new(None),
        }
    }

    /// Serve the expired snapshot when a refresh fails, instead of the error.
    pub fn with_stale_fallback(mut self, enabled: bool) -> Self {
        self.serve_stale_on_error = enabled;
        self
    }

    /// The configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether stale fallback is enabled.
    pub fn serves_stale_on_error(&self) -> bool {
        self.serve_stale_on_error
    }

    /// The last fetched list, regardless of age.
    pub fn cached(&self) -> Option<Runtimes> {
        self.snapshot.read().as_ref().map(|s| s.data.clone())
    }

    /// Time since the last successful fetch.
    pub fn age(&self) -> Option<Duration> {
        self.snapshot.read().as_ref().map(|s| s.fetched_at.elapsed())
    }

    /// Whether a snapshot exists and is younger than the TTL.
    pub fn is_fresh(&self) -> bool {
        self.fresh().is_some()
    }

    fn fresh(&self) -> Option<Runtimes> {
        self.snapshot
            .read()
            .as_ref()
            .filter(|s| s.fetched_at.elapsed() < self.ttl)
            .map(|s| s.data.clone())
    }

    /// Return the cached list if fresh, otherwise fetch a new one.
    pub async fn get(&self, backend: &dyn ExecutionBackend) -> Result<Runtimes> {
        if let Some(data) = self.fresh() {
            debug!(count = data.len(), "Serving cached runtimes");
            return Ok(data);
        }
        self.refresh(backend).await
    }

    /// Fetch unconditionally and replace the snapshot on success.
    pub async fn refresh(&self, backend: &dyn ExecutionBackend) -> Result<Runtimes> {
        match backend.runtimes().await {
            Ok(list) => {
                let data: Runtimes = Arc::new(list);
                *self.snapshot.write() = Some(Snapshot {
                    data: data.clone(),
                    fetched_at: Instant::now(),
                });
                info!(
                    backend = backend.name(),
                    count = data.len(),
                    "Refreshed runtime list"
                );
                Ok(data)
            }
            Err(e) => {
                if self.serve_stale_on_error
                    && let Some(stale) = self.cached()
                {
                    warn!(
                        backend = backend.name(),
                        error = %e,
                        "Runtime refresh failed, serving stale list"
                    );
                    return Ok(stale);
                }
                Err(e)
            }
        }
    }

    /// Drop the snapshot so the next `get` fetches.
    pub fn invalidate(&self) {
        *self.snapshot.write() = None;
    }
}
