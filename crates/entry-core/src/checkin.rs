//! Check-in state and the transition applied by the mutator.
//!
//! An attendee is either `NotEntered` or `Entered`. Every transition is
//! caller-initiated. The store stamps the time when it writes: set on
//! check-in, cleared on check-out, so a stored row satisfies
//! `timestamp.is_some() == status`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── State ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckinState {
  NotEntered,
  Entered,
}

impl CheckinState {
  pub fn from_status(status: bool) -> Self {
    if status { Self::Entered } else { Self::NotEntered }
  }

  pub fn is_entered(self) -> bool { matches!(self, Self::Entered) }
}

// ─── Transition ──────────────────────────────────────────────────────────────

/// The write a mutator performs against one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
  pub reg:    String,
  pub status: bool,
}

impl Transition {
  pub fn new(reg: impl Into<String>, desired: bool) -> Self {
    Self { reg: reg.into(), status: desired }
  }

  pub fn target(&self) -> CheckinState { CheckinState::from_status(self.status) }

  /// The `timestamp` column value for a write made at `now`.
  ///
  /// Stores call this once the row lock is settled, so the stamp records
  /// the write and not the request.
  pub fn timestamp_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    self.status.then_some(now)
  }
}

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// Result of a check-in or check-out that reached storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckinOutcome {
  /// The row was rewritten, whether or not its status changed.
  Updated { rows_affected: u64 },
  /// No row carries the requested registration number.
  NoMatch,
}

impl CheckinOutcome {
  pub fn from_rows_affected(rows_affected: u64) -> Self {
    if rows_affected > 0 {
      Self::Updated { rows_affected }
    } else {
      Self::NoMatch
    }
  }

  pub fn rows_affected(self) -> u64 {
    match self {
      Self::Updated { rows_affected } => rows_affected,
      Self::NoMatch => 0,
    }
  }

  pub fn is_updated(self) -> bool { matches!(self, Self::Updated { .. }) }
}
