//! [`Dashboard`]: the loader and the mutator behind one handle.
//!
//! Owns the store, the snapshot cache and the lock retry policy. A
//! successful check-in or check-out drops the cached snapshot so the next
//! read reflects it; nothing else invalidates the cache before its TTL.

use std::{sync::Arc, time::Duration};

use chrono::Utc;

use crate::{
  attendee::{Attendee, NewAttendee},
  cache::{Snapshot, SnapshotCache},
  checkin::{CheckinOutcome, Transition},
  retry::RetryPolicy,
  search,
  store::AttendeeStore,
  summary::Summary,
  trend::{footfall_trend, TrendPoint},
  Error, Result,
};

/// How long a snapshot is served before storage is read again.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(2);

pub struct Dashboard<S> {
  store:  S,
  cache:  SnapshotCache,
  policy: RetryPolicy,
}

impl<S: AttendeeStore> Dashboard<S> {
  pub fn new(store: S) -> Self {
    Self {
      store,
      cache: SnapshotCache::new(DEFAULT_CACHE_TTL),
      policy: RetryPolicy::default(),
    }
  }

  pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
    self.cache = SnapshotCache::new(ttl);
    self
  }

  pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
    self.policy = policy;
    self
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn retry_policy(&self) -> RetryPolicy { self.policy }

  // ── Loader ────────────────────────────────────────────────────────────────

  /// The current snapshot, read from storage at most once per TTL.
  pub async fn load_snapshot(&self) -> Result<Arc<Snapshot>> {
    self
      .cache
      .get_or_load(|| async {
        let attendees = self.store.fetch_all().await.map_err(|e| {
          let err: Error = e.into();
          tracing::warn!(error = %err, "failed to load attendees");
          err
        })?;
        Ok::<_, Error>(Snapshot::new(attendees, Utc::now()))
      })
      .await
  }

  /// Drop the cached snapshot and read storage now.
  pub async fn reload(&self) -> Result<Arc<Snapshot>> {
    self.cache.invalidate().await;
    self.load_snapshot().await
  }

  pub async fn invalidate(&self) { self.cache.invalidate().await; }

  // ── Mutator ───────────────────────────────────────────────────────────────

  /// Set `reg`'s status to `desired`, stamping the time on check-in and
  /// clearing it on check-out.
  ///
  /// A missing `reg` is [`CheckinOutcome::NoMatch`], not an error.
  pub async fn set_checked_in(&self, reg: &str, desired: bool) -> Result<CheckinOutcome> {
    let transition = Transition::new(reg, desired);
    let target = transition.target();

    let rows = self
      .store
      .set_status(transition, self.policy)
      .await
      .map_err(|e| {
        let err: Error = e.into();
        tracing::warn!(reg, ?target, error = %err, "check-in update failed");
        err
      })?;

    let outcome = CheckinOutcome::from_rows_affected(rows);
    match outcome {
      CheckinOutcome::Updated { rows_affected } => {
        tracing::info!(reg, ?target, rows_affected, "attendee updated");
        self.cache.invalidate().await;
      }
      CheckinOutcome::NoMatch => {
        tracing::info!(reg, ?target, "no attendee with this registration number");
      }
    }
    Ok(outcome)
  }

  pub async fn mark(&self, reg: &str) -> Result<CheckinOutcome> {
    self.set_checked_in(reg, true).await
  }

  pub async fn unmark(&self, reg: &str) -> Result<CheckinOutcome> {
    self.set_checked_in(reg, false).await
  }

  // ── Aggregates ────────────────────────────────────────────────────────────

  pub async fn summary(&self) -> Result<Summary> {
    let snapshot = self.load_snapshot().await?;
    Ok(Summary::from_attendees(&snapshot.attendees))
  }

  pub async fn trend(&self) -> Result<Vec<TrendPoint>> {
    let snapshot = self.load_snapshot().await?;
    Ok(footfall_trend(&snapshot.attendees))
  }

  pub async fn search(&self, query: &str) -> Result<Vec<Attendee>> {
    let snapshot = self.load_snapshot().await?;
    Ok(search::search(&snapshot.attendees, query))
  }

  // ── Import ────────────────────────────────────────────────────────────────

  pub async fn import(&self, attendees: Vec<NewAttendee>) -> Result<usize> {
    let written = self
      .store
      .import(attendees)
      .await
      .map_err(Into::<Error>::into)?;
    tracing::info!(written, "attendees imported");
    self.cache.invalidate().await;
    Ok(written)
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::sync::{
    Mutex,
    atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering},
  };

  use chrono::{DateTime, TimeZone};

  use super::*;
  use crate::{attendee::attendee, retry::LockAttempt};

  #[derive(Debug, thiserror::Error)]
  enum MemoryError {
    #[error("row is locked")]
    Busy,
    #[error("storage offline")]
    Offline,
  }

  impl From<MemoryError> for Error {
    fn from(e: MemoryError) -> Self { Error::storage(e) }
  }

  /// In-memory table with switchable failures.
  #[derive(Default)]
  struct MemoryStore {
    rows:          Mutex<Vec<Attendee>>,
    busy_attempts: AtomicU32,
    lock_attempts: AtomicU32,
    fetches:       AtomicUsize,
    offline:       AtomicBool,
  }

  impl MemoryStore {
    fn with_rows(rows: Vec<Attendee>) -> Self {
      Self { rows: Mutex::new(rows), ..Self::default() }
    }

    fn row(&self, reg: &str) -> Option<Attendee> {
      self.rows.lock().unwrap().iter().find(|a| a.reg == reg).cloned()
    }
  }

  impl AttendeeStore for MemoryStore {
    type Error = MemoryError;

    async fn fetch_all(&self) -> Result<Vec<Attendee>, MemoryError> {
      if self.offline.load(Ordering::SeqCst) {
        return Err(MemoryError::Offline);
      }
      self.fetches.fetch_add(1, Ordering::SeqCst);
      Ok(self.rows.lock().unwrap().clone())
    }

    async fn set_status(
      &self,
      transition: Transition,
      policy: RetryPolicy,
    ) -> Result<u64, MemoryError> {
      if self.offline.load(Ordering::SeqCst) {
        return Err(MemoryError::Offline);
      }
      let _lock: LockAttempt<()> = policy.run_blocking(
        |_| {
          self.lock_attempts.fetch_add(1, Ordering::SeqCst);
          let remaining = self.busy_attempts.load(Ordering::SeqCst);
          if remaining > 0 {
            self.busy_attempts.store(remaining - 1, Ordering::SeqCst);
            Err(MemoryError::Busy)
          } else {
            Ok(())
          }
        },
        |e| matches!(e, MemoryError::Busy),
      )?;

      let mut rows = self.rows.lock().unwrap();
      let mut affected = 0;
      for row in rows.iter_mut().filter(|a| a.reg == transition.reg) {
        row.status = transition.status;
        row.timestamp = transition.timestamp_at(Utc::now());
        affected += 1;
      }
      Ok(affected)
    }

    async fn import(&self, attendees: Vec<NewAttendee>) -> Result<usize, MemoryError> {
      let mut rows = self.rows.lock().unwrap();
      let written = attendees.len();
      for new in attendees {
        let search_str = Some(new.search_str());
        match rows.iter_mut().find(|a| a.reg == new.reg) {
          Some(row) => {
            row.name = new.name;
            row.search_str = search_str;
          }
          None => rows.push(Attendee {
            reg: new.reg,
            name: new.name,
            email: new.email,
            phone: new.phone,
            gender: new.gender,
            status: false,
            timestamp: None,
            search_str,
          }),
        }
      }
      Ok(written)
    }
  }

  fn t0() -> DateTime<Utc> { Utc.timestamp_opt(1_700_000_000, 0).unwrap() }

  fn dashboard(rows: Vec<Attendee>) -> Dashboard<MemoryStore> {
    Dashboard::new(MemoryStore::with_rows(rows))
      .with_cache_ttl(Duration::from_secs(60))
      .with_retry_policy(RetryPolicy::immediate(3))
  }

  fn regs(snapshot: &Snapshot) -> Vec<&str> {
    snapshot.attendees.iter().map(|a| a.reg.as_str()).collect()
  }

  fn scenario() -> Dashboard<MemoryStore> {
    let mut a2 = attendee("A2", "M", true);
    a2.timestamp = Some(t0());
    dashboard(vec![a2, attendee("A1", "F", false)])
  }

  #[tokio::test]
  async fn mark_then_reload_shows_entered() {
    let d = scenario();
    assert_eq!(regs(&*d.load_snapshot().await.unwrap()), ["A1", "A2"]);

    let outcome = d.mark("A1").await.unwrap();
    assert_eq!(outcome, CheckinOutcome::Updated { rows_affected: 1 });

    let snap = d.reload().await.unwrap();
    assert_eq!(regs(&snap), ["A1", "A2"]);
    let a1 = snap.get("A1").unwrap();
    assert!(a1.status);
    assert!(a1.timestamp.is_some());
  }

  #[tokio::test]
  async fn unmark_clears_timestamp() {
    let d = scenario();
    let outcome = d.unmark("A2").await.unwrap();
    assert_eq!(outcome.rows_affected(), 1);

    let a2 = d.store().row("A2").unwrap();
    assert!(!a2.status);
    assert_eq!(a2.timestamp, None);
  }

  #[tokio::test]
  async fn missing_reg_is_no_match() {
    let d = scenario();
    let before = d.store().rows.lock().unwrap().clone();

    assert_eq!(d.set_checked_in("ZZZ", false).await.unwrap(), CheckinOutcome::NoMatch);
    assert_eq!(d.mark("ZZZ").await.unwrap().rows_affected(), 0);

    assert_eq!(*d.store().rows.lock().unwrap(), before);
  }

  #[tokio::test]
  async fn repeated_marks_each_write() {
    let d = scenario();
    assert_eq!(d.mark("A1").await.unwrap().rows_affected(), 1);
    let first = d.store().row("A1").unwrap().timestamp;
    assert_eq!(d.mark("A1").await.unwrap().rows_affected(), 1);
    let second = d.store().row("A1").unwrap().timestamp;
    assert!(second >= first);
  }

  #[tokio::test]
  async fn contention_then_success_still_updates() {
    let d = scenario();
    d.store().busy_attempts.store(2, Ordering::SeqCst);

    let outcome = d.mark("A1").await.unwrap();
    assert_eq!(outcome.rows_affected(), 1);
    assert_eq!(d.store().lock_attempts.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn exhausted_lock_attempts_write_anyway() {
    let d = scenario();
    d.store().busy_attempts.store(10, Ordering::SeqCst);

    let outcome = d.mark("A1").await.unwrap();
    assert_eq!(outcome.rows_affected(), 1);
    assert_eq!(d.store().lock_attempts.load(Ordering::SeqCst), 3);
    assert!(d.store().row("A1").unwrap().status);
  }

  #[tokio::test]
  async fn check_in_is_stamped_after_lock_wait() {
    let d = Dashboard::new(MemoryStore::with_rows(vec![attendee("A1", "F", false)]))
      .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(100)));
    d.store().busy_attempts.store(2, Ordering::SeqCst);

    let requested = Utc::now();
    d.mark("A1").await.unwrap();

    let stamped = d.store().row("A1").unwrap().timestamp.unwrap();
    assert!(stamped - requested >= chrono::Duration::milliseconds(200));
  }

  #[tokio::test]
  async fn snapshot_is_stale_within_ttl() {
    let d = scenario();
    let first = d.load_snapshot().await.unwrap();

    d.store().rows.lock().unwrap().push(attendee("A0", "M", false));

    let second = d.load_snapshot().await.unwrap();
    assert_eq!(*first, *second);
    assert_eq!(d.store().fetches.load(Ordering::SeqCst), 1);

    let fresh = d.reload().await.unwrap();
    assert_eq!(regs(&fresh), ["A0", "A1", "A2"]);
  }

  #[tokio::test]
  async fn successful_update_invalidates_cache() {
    let d = scenario();
    d.load_snapshot().await.unwrap();
    d.mark("A1").await.unwrap();

    let snap = d.load_snapshot().await.unwrap();
    assert!(snap.get("A1").unwrap().status);
    assert_eq!(d.store().fetches.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn no_match_keeps_cache() {
    let d = scenario();
    d.load_snapshot().await.unwrap();
    d.mark("ZZZ").await.unwrap();
    d.load_snapshot().await.unwrap();
    assert_eq!(d.store().fetches.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn storage_failure_surfaces_and_leaves_rows() {
    let d = scenario();
    d.store().offline.store(true, Ordering::SeqCst);

    let err = d.load_snapshot().await.unwrap_err();
    assert!(matches!(err, Error::Storage(_)));
    let err = d.mark("A1").await.unwrap_err();
    assert!(!err.is_connection_unavailable());
    assert!(!d.store().row("A1").unwrap().status);

    d.store().offline.store(false, Ordering::SeqCst);
    assert_eq!(d.load_snapshot().await.unwrap().len(), 2);
  }

  #[tokio::test]
  async fn aggregates_read_the_snapshot() {
    let d = scenario();
    d.mark("A1").await.unwrap();

    let summary = d.summary().await.unwrap();
    assert_eq!(summary.total.entered, 2);
    assert_eq!(summary.girls.entered, 1);

    let trend = d.trend().await.unwrap();
    assert_eq!(trend.len(), 2);
    assert_eq!(trend[0].reg, "A2");

    let hits = d.search("guest a1").await.unwrap();
    assert_eq!(hits.len(), 1);
  }

  #[tokio::test]
  async fn import_keeps_existing_status() {
    let d = scenario();
    let written = d
      .import(vec![
        NewAttendee {
          reg:    "A2".into(),
          name:   "Renamed".into(),
          email:  None,
          phone:  None,
          gender: Some("M".into()),
        },
        NewAttendee {
          reg:    "A3".into(),
          name:   "New Guest".into(),
          email:  Some("new@example.com".into()),
          phone:  None,
          gender: Some("F".into()),
        },
      ])
      .await
      .unwrap();
    assert_eq!(written, 2);

    let snap = d.load_snapshot().await.unwrap();
    assert_eq!(regs(&snap), ["A1", "A3", "A2"]);
    let a2 = snap.get("A2").unwrap();
    assert_eq!(a2.name, "Renamed");
    assert!(a2.status);
    assert_eq!(a2.timestamp, Some(t0()));
  }
}
