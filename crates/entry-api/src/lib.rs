//! JSON API for the check-in desk.
//!
//! Exposes an axum [`Router`] backed by a [`Dashboard`] over any
//! [`AttendeeStore`]. Transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", entry_api::api_router(dashboard.clone()))
//! ```

pub mod attendees;
pub mod error;
pub mod stats;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use entry_core::{Dashboard, store::AttendeeStore};

pub use error::ApiError;

/// Build the API router for `dashboard`.
pub fn api_router<S>(dashboard: Arc<Dashboard<S>>) -> Router<()>
where
  S: AttendeeStore + 'static,
{
  Router::new()
    // Attendees
    .route("/attendees",              get(attendees::list::<S>))
    .route("/attendees/search",       get(attendees::search::<S>))
    .route(
      "/attendees/{reg}/entry",
      post(attendees::mark::<S>).delete(attendees::unmark::<S>),
    )
    .route("/refresh",                post(attendees::refresh::<S>))
    // Sidebar
    .route("/summary",                get(stats::summary::<S>))
    .route("/trend",                  get(stats::trend::<S>))
    .with_state(dashboard)
}
