//! [`SqliteStore`]: the embedded implementation of [`AttendeeStore`].

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use chrono::Utc;
use rusqlite::{ErrorCode, OptionalExtension as _};

use entry_core::{
  attendee::{Attendee, NewAttendee},
  checkin::Transition,
  retry::{LockAttempt, RetryPolicy},
  store::AttendeeStore,
};

use crate::{
  encode::{encode_dt, encode_status, RawAttendee},
  schema::SCHEMA,
  Error, Result,
};

/// How long a write waits for a competing writer once lock retries are
/// exhausted.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Store ───────────────────────────────────────────────────────────────────

/// An attendee table in a single SQLite file.
///
/// Holds only the path; cloning is cheap.
#[derive(Clone)]
pub struct SqliteStore {
  path:         Arc<PathBuf>,
  busy_timeout: Duration,
}

impl SqliteStore {
  /// Open (or create) the database at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let store = Self {
      path:         Arc::new(path.as_ref().to_path_buf()),
      busy_timeout: DEFAULT_BUSY_TIMEOUT,
    };
    store.init_schema().await?;
    Ok(store)
  }

  pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
    self.busy_timeout = busy_timeout;
    self
  }

  pub fn path(&self) -> &Path { &self.path }

  async fn init_schema(&self) -> Result<()> {
    self
      .with_connection(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
  }

  /// Open a fresh connection, run `f` on it, and close it.
  async fn with_connection<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&mut rusqlite::Connection) -> tokio_rusqlite::Result<T> + Send + 'static,
    T: Send + 'static,
  {
    let conn = tokio_rusqlite::Connection::open(self.path.as_path())
      .await
      .map_err(Error::Connect)?;

    let result = conn.call(f).await;

    if let Err(e) = conn.close().await {
      tracing::warn!(path = %self.path.display(), error = %e, "failed to close connection");
    }
    Ok(result?)
  }
}

// ─── Locking ─────────────────────────────────────────────────────────────────

fn is_contention(err: &rusqlite::Error) -> bool {
  matches!(
    err,
    rusqlite::Error::SqliteFailure(e, _)
      if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
  )
}

/// Start a write transaction, retrying contention as `policy` allows. When
/// every attempt is contended, wait on the busy timeout instead of failing.
fn begin_locked(
  conn: &rusqlite::Connection,
  policy: RetryPolicy,
  busy_timeout: Duration,
) -> rusqlite::Result<LockAttempt<()>> {
  conn.busy_timeout(Duration::ZERO)?;
  let attempt = policy.run_blocking(|_| conn.execute_batch("BEGIN IMMEDIATE"), is_contention)?;

  conn.busy_timeout(busy_timeout)?;
  if !attempt.is_acquired() {
    conn.execute_batch("BEGIN IMMEDIATE")?;
  }
  Ok(attempt)
}

fn write_transition(
  conn: &rusqlite::Connection,
  transition: &Transition,
) -> rusqlite::Result<usize> {
  let current: Option<i64> = conn
    .query_row(
      "SELECT status FROM data WHERE reg = ?1",
      rusqlite::params![transition.reg],
      |r| r.get(0),
    )
    .optional()?;
  tracing::debug!(reg = %transition.reg, ?current, "row locked");

  let updated = conn.execute(
    "UPDATE data SET status = ?1, timestamp = ?2 WHERE reg = ?3",
    rusqlite::params![
      encode_status(transition.status),
      transition.timestamp_at(Utc::now()).map(encode_dt),
      transition.reg,
    ],
  )?;
  conn.execute_batch("COMMIT")?;
  Ok(updated)
}

// ─── AttendeeStore impl ──────────────────────────────────────────────────────

impl AttendeeStore for SqliteStore {
  type Error = Error;

  async fn fetch_all(&self) -> Result<Vec<Attendee>> {
    let raws: Vec<RawAttendee> = self
      .with_connection(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {} FROM data", RawAttendee::COLUMNS))?;
        let rows = stmt
          .query_map([], RawAttendee::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAttendee::into_attendee).collect()
  }

  async fn set_status(&self, transition: Transition, policy: RetryPolicy) -> Result<u64> {
    let busy_timeout = self.busy_timeout;

    let updated = self
      .with_connection(move |conn| {
        let attempt = begin_locked(conn, policy, busy_timeout)?;
        if !attempt.is_acquired() {
          tracing::warn!(reg = %transition.reg, "row lock retries exhausted; writing anyway");
        }

        let written = write_transition(conn, &transition);
        if written.is_err()
          && !conn.is_autocommit()
          && let Err(e) = conn.execute_batch("ROLLBACK")
        {
          tracing::warn!(reg = %transition.reg, error = %e, "rollback failed");
        }
        Ok(written?)
      })
      .await?;

    Ok(updated as u64)
  }

  async fn import(&self, attendees: Vec<NewAttendee>) -> Result<usize> {
    self
      .with_connection(move |conn| {
        let tx = conn.transaction()?;
        {
          let mut stmt = tx.prepare(
            "INSERT INTO data (reg, name, email, phone, gender, status, timestamp, search_str)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, NULL, ?6)
             ON CONFLICT (reg) DO UPDATE SET
               name       = excluded.name,
               email      = excluded.email,
               phone      = excluded.phone,
               gender     = excluded.gender,
               search_str = excluded.search_str",
          )?;
          for a in &attendees {
            stmt.execute(rusqlite::params![
              a.reg,
              a.name,
              a.email,
              a.phone,
              a.gender,
              a.search_str(),
            ])?;
          }
        }
        tx.commit()?;
        Ok(attendees.len())
      })
      .await
  }
}
