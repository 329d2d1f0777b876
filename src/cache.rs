//! Process-wide metadata caches for episodes, drivers and teams.
//!
//! Records are immutable once fetched, so the caches never invalidate. Each map
//! has its own lock and every critical section is a single map read or write;
//! the network call that produces a record always happens outside the lock.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{PoisonError, RwLock};

use crate::catalog::FetchError;
use crate::model::{Driver, Episode, Team};

/// Concurrent identifier → record map.
#[derive(Debug)]
pub struct MetadataCache<V> {
  entries: RwLock<HashMap<String, V>>,
}

impl<V: Clone> MetadataCache<V> {
  pub fn new() -> Self {
    Self { entries: RwLock::new(HashMap::new()) }
  }

  pub fn get(&self, id: &str) -> Option<V> {
    self.entries.read().unwrap_or_else(PoisonError::into_inner).get(id).cloned()
  }

  /// Store a record. Concurrent fetches of the same id may both land here; the last write wins.
  pub fn put(&self, id: &str, value: V) {
    self.entries.write().unwrap_or_else(PoisonError::into_inner).insert(id.to_string(), value);
  }

  pub fn len(&self) -> usize {
    self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
  }

  /// Return the cached record for `id`, or run `fetch` and cache its successful result.
  ///
  /// Failures are returned to the caller and not cached, so a later call retries.
  pub async fn get_or_fetch<F, Fut>(&self, id: &str, fetch: F) -> Result<V, FetchError>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, FetchError>>,
  {
    if let Some(hit) = self.get(id) {
      return Ok(hit);
    }
    let value = fetch().await?;
    self.put(id, value.clone());
    Ok(value)
  }
}

/// The three entity caches, constructed once at startup and shared by reference.
#[derive(Debug)]
pub struct Caches {
  pub episodes: MetadataCache<Episode>,
  pub drivers: MetadataCache<Driver>,
  pub teams: MetadataCache<Team>,
}

impl Caches {
  pub fn new() -> Self {
    Self { episodes: MetadataCache::new(), drivers: MetadataCache::new(), teams: MetadataCache::new() }
  }
}
