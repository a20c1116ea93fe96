//! Error type for `entry-store-mysql`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// No connection could be checked out of the pool.
  #[error("failed to acquire connection: {0}")]
  Connect(#[source] sqlx::Error),

  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),
}

impl From<Error> for entry_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::Connect(_) => Self::connection_unavailable(err),
      Error::Database(_) => Self::storage(err),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
