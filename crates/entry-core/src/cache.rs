//! Snapshot of the attendee table and its time-bounded cache.

use std::{
  future::Future,
  sync::Arc,
  time::{Duration, Instant},
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::attendee::{sort_for_display, Attendee};

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// A point-in-time read of every attendee, in display order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
  /// When storage was read. Display only.
  pub fetched_at: DateTime<Utc>,
  pub attendees:  Vec<Attendee>,
}

impl Snapshot {
  pub fn new(mut attendees: Vec<Attendee>, fetched_at: DateTime<Utc>) -> Self {
    sort_for_display(&mut attendees);
    Self { fetched_at, attendees }
  }

  pub fn get(&self, reg: &str) -> Option<&Attendee> {
    self.attendees.iter().find(|a| a.reg == reg)
  }

  pub fn len(&self) -> usize { self.attendees.len() }

  pub fn is_empty(&self) -> bool { self.attendees.is_empty() }
}

// ─── Cache ───────────────────────────────────────────────────────────────────

struct Entry {
  snapshot:  Arc<Snapshot>,
  loaded_at: Instant,
}

/// Holds the latest snapshot for `ttl`.
///
/// Loads are serialised: concurrent callers during a refresh wait for the one
/// in-flight read and then share its result.
pub struct SnapshotCache {
  ttl:  Duration,
  slot: Mutex<Option<Entry>>,
}

impl SnapshotCache {
  pub fn new(ttl: Duration) -> Self { Self { ttl, slot: Mutex::new(None) } }

  pub fn ttl(&self) -> Duration { self.ttl }

  /// Return the cached snapshot if it is younger than the TTL, otherwise run
  /// `load` and cache its result. A failed load leaves the cache untouched.
  pub async fn get_or_load<F, Fut, E>(&self, load: F) -> Result<Arc<Snapshot>, E>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Snapshot, E>>,
  {
    let mut slot = self.slot.lock().await;

    if let Some(entry) = slot.as_ref()
      && entry.loaded_at.elapsed() < self.ttl
    {
      tracing::debug!(rows = entry.snapshot.len(), "snapshot cache hit");
      return Ok(Arc::clone(&entry.snapshot));
    }

    let snapshot = Arc::new(load().await?);
    tracing::debug!(rows = snapshot.len(), "snapshot loaded");
    *slot = Some(Entry {
      snapshot:  Arc::clone(&snapshot),
      loaded_at: Instant::now(),
    });
    Ok(snapshot)
  }

  /// Drop the cached snapshot so the next read goes to storage.
  pub async fn invalidate(&self) { self.slot.lock().await.take(); }

  /// The cached snapshot, expired or not, without loading.
  pub async fn current(&self) -> Option<Arc<Snapshot>> {
    self.slot.lock().await.as_ref().map(|e| Arc::clone(&e.snapshot))
  }

  /// Fetch time of the cached snapshot, if any.
  pub async fn last_fetched(&self) -> Option<DateTime<Utc>> {
    self.current().await.map(|s| s.fetched_at)
  }
}
