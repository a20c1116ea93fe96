//! Free-text lookup over a snapshot.

use crate::attendee::Attendee;

/// Attendees whose search text contains `query`, case-insensitively, in the
/// order given. A blank query matches nothing.
pub fn search(attendees: &[Attendee], query: &str) -> Vec<Attendee> {
  let needle = query.trim().to_lowercase();
  if needle.is_empty() {
    return Vec::new();
  }
  attendees
    .iter()
    .filter(|a| a.search_text().contains(&needle))
    .cloned()
    .collect()
}
