//! Pooled MySQL backend for the entry desk.
//!
//! A bounded [`sqlx`] pool is shared by every caller; each operation checks
//! out one connection for its duration and returns it on drop, error or not.

mod config;
mod schema;
mod store;

pub mod error;

pub use config::MySqlConfig;
pub use error::{Error, Result};
pub use store::MySqlStore;
