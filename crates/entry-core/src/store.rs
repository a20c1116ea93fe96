//! The `AttendeeStore` trait.
//!
//! Implemented by the storage variants (`entry-store-sqlite`,
//! `entry-store-mysql`). The [`Dashboard`](crate::Dashboard) depends on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  attendee::{Attendee, NewAttendee},
  checkin::Transition,
  retry::RetryPolicy,
};

/// Abstraction over the `data` table.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait AttendeeStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + Into<crate::Error> + 'static;

  /// Read every row in one query. Order is unspecified.
  fn fetch_all(
    &self,
  ) -> impl Future<Output = Result<Vec<Attendee>, Self::Error>> + Send + '_;

  /// Apply `transition` to the row it names and commit.
  ///
  /// Tries for an exclusive lock on the row first, retrying contention as
  /// `policy` allows, and writes regardless of whether the lock was won.
  /// Returns the number of rows the update matched (0 or 1).
  fn set_status(
    &self,
    transition: Transition,
    policy: RetryPolicy,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Insert or refresh the descriptive fields of `attendees` in one
  /// transaction. Existing rows keep their status and timestamp.
  fn import(
    &self,
    attendees: Vec<NewAttendee>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}
