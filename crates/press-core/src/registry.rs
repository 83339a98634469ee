//! Render-time key registry.
//!
//! A key issued while rendering a page stays resolvable for one retention
//! window. After that it never resolves again, even if the entry has not
//! been swept yet.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::{oneshot, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{PressError, PressResult};
use crate::types::{CacheKey, FileGroup};

/// Upper bound for retention, so expiry arithmetic cannot overflow.
const MAX_RETENTION_DAYS: i64 = 36_500;

#[derive(Debug, Clone)]
pub struct KeyRegistry {
    inner: Arc<RwLock<RegistryInner>>,
    retention: Duration,
}

#[derive(Debug)]
struct RegistryInner {
    entries: HashMap<CacheKey, RegistryEntry>,

    /// Earliest time `register` sweeps again
    next_sweep: DateTime<Utc>,
}

#[derive(Debug)]
struct RegistryEntry {
    group: Arc<FileGroup>,
    expires_at: DateTime<Utc>,
}

impl KeyRegistry {
    pub fn new(retention: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(RegistryInner {
                entries: HashMap::new(),
                next_sweep: Utc::now() + retention_delta(retention),
            })),
            retention,
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Bind `group` to a fresh key for one retention window.
    pub async fn register(&self, group: FileGroup) -> CacheKey {
        let now = Utc::now();
        let expires_at = now + retention_delta(self.retention);
        let mut inner = self.inner.write().await;

        if now >= inner.next_sweep {
            let removed = sweep_locked(&mut inner, now);
            inner.next_sweep = now + retention_delta(self.retention);
            if removed > 0 {
                debug!(removed, remaining = inner.entries.len(), "swept expired keys");
            }
        }

        let mut key = CacheKey::generate();
        while inner.entries.contains_key(&key) {
            key = CacheKey::generate();
        }

        debug!(key = %key, files = group.len(), "registered file group");
        inner.entries.insert(
            key.clone(),
            RegistryEntry {
                group: Arc::new(group),
                expires_at,
            },
        );
        key
    }

    /// Look up a live key. Expired and unknown keys are both `UnresolvedKey`.
    pub async fn resolve(&self, key: &CacheKey) -> PressResult<Arc<FileGroup>> {
        let now = Utc::now();
        let inner = self.inner.read().await;

        match inner.entries.get(key) {
            Some(entry) if entry.expires_at > now => Ok(Arc::clone(&entry.group)),
            found => {
                warn!(key = %key, expired = found.is_some(), "unresolved key");
                Err(PressError::UnresolvedKey {
                    key: key.to_string(),
                    retention: self.retention,
                })
            }
        }
    }

    /// Remove expired entries now. Returns how many were dropped.
    pub async fn sweep(&self) -> usize {
        let now = Utc::now();
        let mut inner = self.inner.write().await;
        let removed = sweep_locked(&mut inner, now);
        inner.next_sweep = now + retention_delta(self.retention);
        if removed > 0 {
            debug!(removed, remaining = inner.entries.len(), "swept expired keys");
        }
        removed
    }

    /// Number of stored entries, expired-but-unswept included.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn clear(&self) -> usize {
        let mut inner = self.inner.write().await;
        let count = inner.entries.len();
        inner.entries.clear();
        count
    }

    /// Sweep every `interval` on a background task until shut down.
    pub fn spawn_sweeper(&self, interval: Duration) -> SweeperHandle {
        let registry = self.clone();
        let (stop_tx, mut stop_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        registry.sweep().await;
                    }
                    _ = &mut stop_rx => break,
                }
            }
            debug!("registry sweeper stopped");
        });

        SweeperHandle {
            stop: Some(stop_tx),
            task: Some(task),
        }
    }
}

fn retention_delta(retention: Duration) -> TimeDelta {
    TimeDelta::from_std(retention)
        .ok()
        .filter(|d| *d <= TimeDelta::days(MAX_RETENTION_DAYS))
        .unwrap_or_else(|| TimeDelta::days(MAX_RETENTION_DAYS))
}

fn sweep_locked(inner: &mut RegistryInner, now: DateTime<Utc>) -> usize {
    let before = inner.entries.len();
    inner.entries.retain(|_, entry| entry.expires_at > now);
    before - inner.entries.len()
}

/// Background sweep task. Dropping the handle aborts the task.
#[derive(Debug)]
pub struct SweeperHandle {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Stop the sweeper and wait for it to exit.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
