//! Attendee: one row of the `data` table.
//!
//! Rows are created by an import; the desk itself only ever flips `status`
//! and `timestamp`.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{checkin::CheckinState, summary::GenderGroup};

/// A persisted attendee record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
  /// Registration number; unique.
  pub reg:        String,
  pub name:       String,
  pub email:      Option<String>,
  pub phone:      Option<String>,
  /// Short code, e.g. `"M"` or `"F"`.
  pub gender:     Option<String>,
  /// `true` once the attendee has entered.
  pub status:     bool,
  /// When the attendee was checked in; `None` while not entered.
  pub timestamp:  Option<DateTime<Utc>>,
  /// Denormalised, lowercase search text maintained by the import.
  #[serde(default, skip_serializing)]
  pub search_str: Option<String>,
}

impl Attendee {
  pub fn state(&self) -> CheckinState { CheckinState::from_status(self.status) }

  pub fn group(&self) -> GenderGroup { GenderGroup::from_code(self.gender.as_deref()) }

  /// The text a search query is matched against.
  ///
  /// Uses the stored `search_str` when present and rebuilds it from the
  /// descriptive fields otherwise.
  pub fn search_text(&self) -> String {
    match &self.search_str {
      Some(s) => s.to_lowercase(),
      None => search_string(
        &self.reg,
        &self.name,
        self.email.as_deref(),
        self.phone.as_deref(),
      ),
    }
  }

  /// Display order: not-yet-entered first, then by registration number.
  pub fn display_order(&self, other: &Self) -> Ordering {
    self
      .status
      .cmp(&other.status)
      .then_with(|| self.reg.cmp(&other.reg))
  }
}

/// Input for [`AttendeeStore::import`](crate::store::AttendeeStore::import).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAttendee {
  pub reg:    String,
  pub name:   String,
  #[serde(default)]
  pub email:  Option<String>,
  #[serde(default)]
  pub phone:  Option<String>,
  #[serde(default)]
  pub gender: Option<String>,
}

impl NewAttendee {
  pub fn search_str(&self) -> String {
    search_string(
      &self.reg,
      &self.name,
      self.email.as_deref(),
      self.phone.as_deref(),
    )
  }
}

/// Lowercase `reg name email phone`, skipping missing or blank fields.
pub fn search_string(
  reg: &str,
  name: &str,
  email: Option<&str>,
  phone: Option<&str>,
) -> String {
  [Some(reg), Some(name), email, phone]
    .into_iter()
    .flatten()
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
    .to_lowercase()
}

/// Sort attendees into display order in place.
pub fn sort_for_display(attendees: &mut [Attendee]) {
  attendees.sort_by(Attendee::display_order);
}

#[cfg(test)]
pub(crate) fn attendee(reg: &str, gender: &str, status: bool) -> Attendee {
  Attendee {
    reg:        reg.to_owned(),
    name:       format!("Guest {reg}"),
    email:      None,
    phone:      None,
    gender:     Some(gender.to_owned()),
    status,
    timestamp:  None,
    search_str: None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn search_string_skips_missing_fields() {
    let s = search_string("R-101", "Asha Patil", None, Some(" 98200 "));
    assert_eq!(s, "r-101 asha patil 98200");
  }

  #[test]
  fn search_text_falls_back_to_fields() {
    let mut a = attendee("A1", "F", false);
    a.email = Some("Guest@Example.com".into());
    assert_eq!(a.search_text(), "a1 guest a1 guest@example.com");

    a.search_str = Some("Custom Text".into());
    assert_eq!(a.search_text(), "custom text");
  }

  #[test]
  fn display_order_puts_pending_first() {
    let mut rows = vec![
      attendee("B2", "M", true),
      attendee("C3", "F", false),
      attendee("A1", "M", true),
      attendee("B1", "F", false),
    ];
    sort_for_display(&mut rows);
    let regs: Vec<_> = rows.iter().map(|a| a.reg.as_str()).collect();
    assert_eq!(regs, ["B1", "C3", "A1", "B2"]);
  }

  #[test]
  fn search_str_is_not_serialised() {
    let mut a = attendee("A1", "F", false);
    a.search_str = Some("a1".into());
    let json = serde_json::to_value(&a).unwrap();
    assert!(json.get("search_str").is_none());
    assert_eq!(json["reg"], "A1");
  }
}
