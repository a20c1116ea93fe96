//! Error types for `entry-core`.
//!
//! Storage backends keep their own error enums and convert into [`Error`] at
//! the dashboard boundary, classifying connection failures separately from
//! everything else.

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// No storage connection could be obtained. Nothing was read or written.
  #[error("storage connection unavailable: {0}")]
  ConnectionUnavailable(#[source] BoxError),

  /// A read or write failed after a connection was obtained.
  #[error("storage error: {0}")]
  Storage(#[source] BoxError),
}

impl Error {
  pub fn connection_unavailable(err: impl Into<BoxError>) -> Self {
    Self::ConnectionUnavailable(err.into())
  }

  pub fn storage(err: impl Into<BoxError>) -> Self { Self::Storage(err.into()) }

  pub fn is_connection_unavailable(&self) -> bool {
    matches!(self, Self::ConnectionUnavailable(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
