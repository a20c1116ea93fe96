//! Handlers for the sidebar aggregates: `GET /summary` and `GET /trend`.

use std::sync::Arc;

use axum::{Json, extract::State};
use entry_core::{Dashboard, store::AttendeeStore, summary::Summary, trend::TrendPoint};

use crate::error::ApiError;

/// `GET /summary`: entered / pending per gender group.
pub async fn summary<S>(
  State(dashboard): State<Arc<Dashboard<S>>>,
) -> Result<Json<Summary>, ApiError>
where
  S: AttendeeStore + 'static,
{
  Ok(Json(dashboard.summary().await?))
}

/// `GET /trend`: cumulative check-ins over time.
pub async fn trend<S>(
  State(dashboard): State<Arc<Dashboard<S>>>,
) -> Result<Json<Vec<TrendPoint>>, ApiError>
where
  S: AttendeeStore + 'static,
{
  Ok(Json(dashboard.trend().await?))
}
