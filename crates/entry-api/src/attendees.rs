//! Handlers for `/attendees` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/attendees` | Cached snapshot, pending first |
//! | `GET`    | `/attendees/search` | `?q=` free text; blank matches nothing |
//! | `POST`   | `/attendees/{reg}/entry` | Mark entered; 404 if `reg` is unknown |
//! | `DELETE` | `/attendees/{reg}/entry` | Mark not entered; 404 if `reg` is unknown |
//! | `POST`   | `/refresh` | Drop the cache and read storage now |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use entry_core::{
  Dashboard,
  attendee::Attendee,
  cache::Snapshot,
  checkin::{CheckinOutcome, CheckinState},
  store::AttendeeStore,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// ─── Snapshot ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SnapshotBody {
  pub fetched_at: DateTime<Utc>,
  pub count:      usize,
  pub attendees:  Vec<Attendee>,
}

impl From<&Snapshot> for SnapshotBody {
  fn from(s: &Snapshot) -> Self {
    Self {
      fetched_at: s.fetched_at,
      count:      s.len(),
      attendees:  s.attendees.clone(),
    }
  }
}

/// `GET /attendees`
pub async fn list<S>(
  State(dashboard): State<Arc<Dashboard<S>>>,
) -> Result<Json<SnapshotBody>, ApiError>
where
  S: AttendeeStore + 'static,
{
  let snapshot = dashboard.load_snapshot().await?;
  Ok(Json(SnapshotBody::from(snapshot.as_ref())))
}

/// `POST /refresh`
pub async fn refresh<S>(
  State(dashboard): State<Arc<Dashboard<S>>>,
) -> Result<Json<SnapshotBody>, ApiError>
where
  S: AttendeeStore + 'static,
{
  let snapshot = dashboard.reload().await?;
  Ok(Json(SnapshotBody::from(snapshot.as_ref())))
}

// ─── Search ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  #[serde(default)]
  pub q: String,
}

/// `GET /attendees/search?q=...`
pub async fn search<S>(
  State(dashboard): State<Arc<Dashboard<S>>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Attendee>>, ApiError>
where
  S: AttendeeStore + 'static,
{
  Ok(Json(dashboard.search(&params.q).await?))
}

// ─── Entry ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct EntryBody {
  pub reg:           String,
  pub state:         CheckinState,
  pub rows_affected: u64,
}

async fn set_entry<S>(
  dashboard: &Dashboard<S>,
  reg: String,
  desired: bool,
) -> Result<Json<EntryBody>, ApiError>
where
  S: AttendeeStore,
{
  match dashboard.set_checked_in(&reg, desired).await? {
    CheckinOutcome::Updated { rows_affected } => Ok(Json(EntryBody {
      reg,
      state: CheckinState::from_status(desired),
      rows_affected,
    })),
    CheckinOutcome::NoMatch => Err(ApiError::NotFound(format!("no attendee {reg}"))),
  }
}

/// `POST /attendees/{reg}/entry`
pub async fn mark<S>(
  State(dashboard): State<Arc<Dashboard<S>>>,
  Path(reg): Path<String>,
) -> Result<Json<EntryBody>, ApiError>
where
  S: AttendeeStore + 'static,
{
  set_entry(&dashboard, reg, true).await
}

/// `DELETE /attendees/{reg}/entry`
pub async fn unmark<S>(
  State(dashboard): State<Arc<Dashboard<S>>>,
  Path(reg): Path<String>,
) -> Result<Json<EntryBody>, ApiError>
where
  S: AttendeeStore + 'static,
{
  set_entry(&dashboard, reg, false).await
}
