//! [`MySqlStore`]: the pooled implementation of [`AttendeeStore`].

use chrono::{NaiveDateTime, Utc};
use sqlx::{
  Connection as _,
  Row as _,
  mysql::{MySqlDatabaseError, MySqlPool, MySqlRow},
};

use entry_core::{
  attendee::{Attendee, NewAttendee},
  checkin::Transition,
  retry::RetryPolicy,
  store::AttendeeStore,
};

use crate::{schema::CREATE_DATA, Error, MySqlConfig, Result};

/// `innodb_lock_wait_timeout` elapsed while waiting for a row lock.
const ER_LOCK_WAIT_TIMEOUT: u16 = 1205;
/// `NOWAIT` found the row already locked.
const ER_LOCK_NOWAIT: u16 = 3572;

// ─── Store ───────────────────────────────────────────────────────────────────

/// An attendee table on a MySQL server, reached through a bounded pool.
///
/// Cloning is cheap; the pool is reference-counted.
#[derive(Clone)]
pub struct MySqlStore {
  pool: MySqlPool,
}

impl MySqlStore {
  /// Build the pool and open its first connection.
  pub async fn connect(config: &MySqlConfig) -> Result<Self> {
    let pool = config
      .pool_options()
      .connect_with(config.connect_options())
      .await
      .map_err(Error::Connect)?;
    Ok(Self { pool })
  }

  /// Build the pool without connecting; connections open on first use.
  pub fn connect_lazy(config: &MySqlConfig) -> Self {
    let pool = config
      .pool_options()
      .connect_lazy_with(config.connect_options());
    Self { pool }
  }

  pub fn from_pool(pool: MySqlPool) -> Self { Self { pool } }

  pub fn pool(&self) -> &MySqlPool { &self.pool }

  /// Create the `data` table if it does not exist yet.
  pub async fn init_schema(&self) -> Result<()> {
    let mut conn = self.pool.acquire().await.map_err(Error::Connect)?;
    sqlx::query(CREATE_DATA).execute(&mut *conn).await?;
    Ok(())
  }
}

// ─── Row decoding ────────────────────────────────────────────────────────────

const SELECT_ALL: &str =
  "SELECT reg, name, email, phone, gender, status, timestamp, search_str FROM data";

fn decode_row(row: &MySqlRow) -> Result<Attendee> {
  let status: i64 = row.try_get("status")?;
  let timestamp: Option<NaiveDateTime> = row.try_get("timestamp")?;
  Ok(Attendee {
    reg:        row.try_get("reg")?,
    name:       row.try_get("name")?,
    email:      row.try_get("email")?,
    phone:      row.try_get("phone")?,
    gender:     row.try_get("gender")?,
    status:     status != 0,
    timestamp:  timestamp.map(|t| t.and_utc()),
    search_str: row.try_get("search_str")?,
  })
}

// ─── Locking ─────────────────────────────────────────────────────────────────

fn is_contention_code(code: u16) -> bool {
  matches!(code, ER_LOCK_WAIT_TIMEOUT | ER_LOCK_NOWAIT)
}

fn is_contention(err: &sqlx::Error) -> bool {
  err
    .as_database_error()
    .and_then(|e| e.try_downcast_ref::<MySqlDatabaseError>())
    .is_some_and(|e| is_contention_code(e.number()))
}

// ─── AttendeeStore impl ──────────────────────────────────────────────────────

impl AttendeeStore for MySqlStore {
  type Error = Error;

  async fn fetch_all(&self) -> Result<Vec<Attendee>> {
    let mut conn = self.pool.acquire().await.map_err(Error::Connect)?;
    let rows = sqlx::query(SELECT_ALL).fetch_all(&mut *conn).await?;
    rows.iter().map(decode_row).collect()
  }

  async fn set_status(&self, transition: Transition, policy: RetryPolicy) -> Result<u64> {
    let mut conn = self.pool.acquire().await.map_err(Error::Connect)?;
    let mut tx = conn.begin().await?;

    let attempt = policy
      .run(
        &mut tx,
        |tx, _| {
          let reg = transition.reg.clone();
          Box::pin(async move {
            sqlx::query("SELECT status FROM data WHERE reg = ? FOR UPDATE NOWAIT")
              .bind(reg)
              .fetch_optional(&mut **tx)
              .await
              .map(|_| ())
          })
        },
        is_contention,
      )
      .await?;
    if !attempt.is_acquired() {
      tracing::warn!(reg = %transition.reg, "row lock retries exhausted; writing anyway");
    }

    let timestamp = transition.timestamp_at(Utc::now()).map(|t| t.naive_utc());
    let result = sqlx::query("UPDATE data SET status = ?, timestamp = ? WHERE reg = ?")
      .bind(i8::from(transition.status))
      .bind(timestamp)
      .bind(&transition.reg)
      .execute(&mut *tx)
      .await?;
    tx.commit().await?;

    Ok(result.rows_affected())
  }

  async fn import(&self, attendees: Vec<NewAttendee>) -> Result<usize> {
    let mut conn = self.pool.acquire().await.map_err(Error::Connect)?;
    let mut tx = conn.begin().await?;
    for a in &attendees {
      sqlx::query(
        "INSERT INTO data (reg, name, email, phone, gender, status, timestamp, search_str)
         VALUES (?, ?, ?, ?, ?, 0, NULL, ?)
         ON DUPLICATE KEY UPDATE
           name       = VALUES(name),
           email      = VALUES(email),
           phone      = VALUES(phone),
           gender     = VALUES(gender),
           search_str = VALUES(search_str)",
      )
      .bind(&a.reg)
      .bind(&a.name)
      .bind(&a.email)
      .bind(&a.phone)
      .bind(&a.gender)
      .bind(a.search_str())
      .execute(&mut *tx)
      .await?;
    }
    tx.commit().await?;
    Ok(attendees.len())
  }
}
