//! Single-slot memoization of the last [`StatusRecord`].
//!
//! The cache keeps the service within YouTube's daily API quota: at most one token exchange
//! and one `liveBroadcasts.list` call happen per [`CACHE_TTL`] window, however many clients
//! poll. Entries are never deleted, only superseded. Concurrent misses may each recompute and
//! write; the last write wins.

use crate::status::StatusRecord;
use eyre::Context;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// How long a stored record is served without asking YouTube again.
pub const CACHE_TTL: Duration = Duration::from_secs(60);

/// What the cache slot holds: the record and when it was computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Unix epoch seconds.
    pub timestamp: i64,
    pub data: StatusRecord,
}

impl CacheEntry {
    /// Stamps `data` with the current time.
    pub fn new(data: StatusRecord) -> Self {
        Self {
            timestamp: now(),
            data,
        }
    }

    /// Whether this entry may still be served at `now` (epoch seconds).
    pub fn is_fresh_at(&self, now: i64) -> bool {
        now.saturating_sub(self.timestamp) < CACHE_TTL.as_secs() as i64
    }
}

fn now() -> i64 {
    jiff::Timestamp::now().as_second()
}

/// Storage for the most recent status record.
///
/// `get` returns `None` for anything but a fresh, well-formed entry: absent, stale, and
/// corrupt slots all look like a miss. `set` errors are for logging only; callers must not
/// let them affect the response.
pub trait StatusCache: Send + Sync {
    fn get(&self) -> impl Future<Output = Option<StatusRecord>> + Send;
    fn set(&self, data: &StatusRecord) -> impl Future<Output = eyre::Result<()>> + Send;
}

/// Cache slot backed by one JSON file, `{"timestamp": <epoch seconds>, "data": {...}}`.
///
/// Writes overwrite the file in place without locking or renaming.
#[derive(Debug, Clone)]
pub struct FileCache {
    path: PathBuf,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads whatever entry the file holds, fresh or not.
    pub async fn read_entry(&self) -> Option<CacheEntry> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::trace!(path = %self.path.display(), error = %e, "no cache file");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::trace!(path = %self.path.display(), error = %e, "ignoring corrupt cache file");
                None
            }
        }
    }

    /// Overwrites the file with `entry`.
    pub async fn write_entry(&self, entry: &CacheEntry) -> eyre::Result<()> {
        let json = serde_json::to_vec(entry).context("serialize cache entry")?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("write cache file {}", self.path.display()))
    }
}

impl StatusCache for FileCache {
    async fn get(&self) -> Option<StatusRecord> {
        let entry = self.read_entry().await?;
        if entry.is_fresh_at(now()) {
            Some(entry.data)
        } else {
            tracing::trace!(timestamp = entry.timestamp, "cache entry is stale");
            None
        }
    }

    async fn set(&self, data: &StatusRecord) -> eyre::Result<()> {
        self.write_entry(&CacheEntry::new(data.clone())).await
    }
}

/// Cache slot held in process memory.
///
/// Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    slot: Arc<Mutex<Option<CacheEntry>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts out holding `entry`, which may be stale.
    pub fn with_entry(entry: CacheEntry) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(entry))),
        }
    }

    /// Returns the stored entry, fresh or not.
    pub async fn entry(&self) -> Option<CacheEntry> {
        self.slot.lock().await.clone()
    }
}

impl StatusCache for MemoryCache {
    async fn get(&self) -> Option<StatusRecord> {
        let slot = self.slot.lock().await;
        slot.as_ref()
            .filter(|entry| entry.is_fresh_at(now()))
            .map(|entry| entry.data.clone())
    }

    async fn set(&self, data: &StatusRecord) -> eyre::Result<()> {
        *self.slot.lock().await = Some(CacheEntry::new(data.clone()));
        Ok(())
    }
}
