//! Footfall trend: cumulative check-ins over time, per gender group.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{attendee::Attendee, summary::GenderGroup};

/// One check-in on the trend line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
  pub timestamp:  DateTime<Utc>,
  pub group:      GenderGroup,
  pub reg:        String,
  /// Check-ins in `group` up to and including this one.
  pub cumulative: usize,
}

/// Build the trend from every attendee with a check-in timestamp, oldest
/// first. Ties on timestamp are broken by registration number.
pub fn footfall_trend(attendees: &[Attendee]) -> Vec<TrendPoint> {
  let mut stamped: Vec<(&Attendee, DateTime<Utc>)> = attendees
    .iter()
    .filter_map(|a| a.timestamp.map(|ts| (a, ts)))
    .collect();
  stamped.sort_by(|(a, ta), (b, tb)| ta.cmp(tb).then_with(|| a.reg.cmp(&b.reg)));

  let mut running: HashMap<GenderGroup, usize> = HashMap::new();
  stamped
    .into_iter()
    .map(|(a, timestamp)| {
      let group = a.group();
      let count = running.entry(group).or_default();
      if a.status {
        *count += 1;
      }
      TrendPoint { timestamp, group, reg: a.reg.clone(), cumulative: *count }
    })
    .collect()
}
