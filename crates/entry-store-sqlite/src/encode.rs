//! Encoding and decoding helpers between domain types and the plain values
//! stored in SQLite columns.
//!
//! Timestamps are written as RFC 3339 strings. Rows written by other tools
//! may carry SQLite's `YYYY-MM-DD HH:MM:SS[.fff]` form or zone-less ISO 8601
//! (`YYYY-MM-DDTHH:MM:SS[.ffffff]`) instead; both are read as UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use entry_core::attendee::Attendee;

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Ok(dt.with_timezone(&Utc));
  }
  NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
    .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
    .map(|naive| naive.and_utc())
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Status ──────────────────────────────────────────────────────────────────

pub fn encode_status(status: bool) -> i64 { i64::from(status) }

pub fn decode_status(raw: i64) -> bool { raw != 0 }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `data` row.
pub struct RawAttendee {
  pub reg:        String,
  pub name:       String,
  pub email:      Option<String>,
  pub phone:      Option<String>,
  pub gender:     Option<String>,
  pub status:     i64,
  pub timestamp:  Option<String>,
  pub search_str: Option<String>,
}

impl RawAttendee {
  pub const COLUMNS: &'static str =
    "reg, name, email, phone, gender, status, timestamp, search_str";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      reg:        row.get(0)?,
      name:       row.get(1)?,
      email:      row.get(2)?,
      phone:      row.get(3)?,
      gender:     row.get(4)?,
      status:     row.get(5)?,
      timestamp:  row.get(6)?,
      search_str: row.get(7)?,
    })
  }

  pub fn into_attendee(self) -> Result<Attendee> {
    Ok(Attendee {
      reg:        self.reg,
      name:       self.name,
      email:      self.email,
      phone:      self.phone,
      gender:     self.gender,
      status:     decode_status(self.status),
      timestamp:  self.timestamp.as_deref().map(decode_dt).transpose()?,
      search_str: self.search_str,
    })
  }
}
