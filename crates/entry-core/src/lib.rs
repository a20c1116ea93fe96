//! Core types and trait definitions for the entry desk.
//!
//! No HTTP or database code lives here. The storage variants (`entry-store-sqlite`, `entry-store-mysql`) implement
//! [`store::AttendeeStore`]; everything above them talks to a
//! [`dashboard::Dashboard`].

pub mod attendee;
pub mod cache;
pub mod checkin;
pub mod dashboard;
pub mod error;
pub mod retry;
pub mod search;
pub mod store;
pub mod summary;
pub mod trend;

pub use dashboard::Dashboard;
pub use error::{BoxError, Error, Result};
