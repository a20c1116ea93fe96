//! Embedded SQLite backend for the entry desk.
//!
//! Every operation opens its own [`tokio_rusqlite`] connection to the
//! database file and closes it afterwards, so no handle outlives a call.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
