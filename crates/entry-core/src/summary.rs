//! Entered / pending counts by gender group.

use serde::{Deserialize, Serialize};

use crate::attendee::Attendee;

/// The two groups the desk reports on. Code `"F"` is `Girls`; every other
/// code, including a missing one, counts as `Boys`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenderGroup {
  Boys,
  Girls,
}

impl GenderGroup {
  pub fn from_code(code: Option<&str>) -> Self {
    match code.map(str::trim) {
      Some(c) if c.eq_ignore_ascii_case("f") => Self::Girls,
      _ => Self::Boys,
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
  pub entered: usize,
  pub pending: usize,
}

impl Tally {
  pub fn total(&self) -> usize { self.entered + self.pending }

  fn record(&mut self, entered: bool) {
    if entered {
      self.entered += 1;
    } else {
      self.pending += 1;
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
  pub boys:  Tally,
  pub girls: Tally,
  pub total: Tally,
}

impl Summary {
  pub fn from_attendees(attendees: &[Attendee]) -> Self {
    let mut summary = Self::default();
    for a in attendees {
      match a.group() {
        GenderGroup::Boys => summary.boys.record(a.status),
        GenderGroup::Girls => summary.girls.record(a.status),
      }
      summary.total.record(a.status);
    }
    summary
  }

  pub fn group(&self, group: GenderGroup) -> Tally {
    match group {
      GenderGroup::Boys => self.boys,
      GenderGroup::Girls => self.girls,
    }
  }
}
