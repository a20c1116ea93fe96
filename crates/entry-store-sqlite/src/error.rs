//! Error type for `entry-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The database file could not be opened.
  #[error("failed to open database: {0}")]
  Connect(#[source] tokio_rusqlite::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),
}

impl From<Error> for entry_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::Connect(_) => Self::connection_unavailable(err),
      _ => Self::storage(err),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
