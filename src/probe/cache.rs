//! TTL cache in front of a [`ModelProbe`].

use super::{ModelProbe, ProbeStatus};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

/// Source of monotonic time, injectable for tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock backed by [`Instant::now`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct CacheEntry {
    checked_at: Instant,
    status: ProbeStatus,
}

/// Caches probe results per `(endpoint, model)` for `ttl`.
///
/// Keeps repeated generations from hammering the local server with tag
/// listings. The lock is never held across the inner probe's await.
pub struct CachedProbe<P> {
    inner: P,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: Mutex<HashMap<(String, String), CacheEntry>>,
}

impl<P: ModelProbe> CachedProbe<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self::with_clock(inner, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(inner: P, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner,
            clock,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lookup(&self, key: &(String, String)) -> Option<ProbeStatus> {
        let entries = self.entries.lock().ok()?;
        let entry = entries.get(key)?;
        let age = self.clock.now().saturating_duration_since(entry.checked_at);
        if age < self.ttl {
            Some(entry.status)
        } else {
            None
        }
    }

    fn store(&self, key: (String, String), status: ProbeStatus) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key,
                CacheEntry {
                    checked_at: self.clock.now(),
                    status,
                },
            );
        }
    }
}

#[async_trait]
impl<P: ModelProbe> ModelProbe for CachedProbe<P> {
    async fn check_available(&self, endpoint: &str, model: &str) -> ProbeStatus {
        let key = (endpoint.to_string(), model.to_string());
        if let Some(status) = self.lookup(&key) {
            debug!(endpoint = %endpoint, model = %model, "Probe cache hit");
            return status;
        }

        let status = self.inner.check_available(endpoint, model).await;
        self.store(key, status);
        status
    }

    fn invalidate(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
        self.inner.invalidate();
    }
}
