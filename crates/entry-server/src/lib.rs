//! Check-in desk server.
//!
//! Reads [`ServerConfig`], picks a storage backend and serves the JSON API
//! from `entry-api` under `/api`.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use axum::Router;
use entry_core::{Dashboard, retry::RetryPolicy, store::AttendeeStore};
use entry_store_mysql::MySqlConfig;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Config ───────────────────────────────────────────────────────────────────

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8501 }
fn default_cache_ttl_ms() -> u64 { 2_000 }
fn default_lock_attempts() -> u32 { 3 }
fn default_lock_backoff_ms() -> u64 { 100 }

/// Top-level server configuration, loaded from `config.toml` and `ENTRY__*`
/// environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:            String,
  #[serde(default = "default_port")]
  pub port:            u16,
  #[serde(default = "default_cache_ttl_ms")]
  pub cache_ttl_ms:    u64,
  #[serde(default = "default_lock_attempts")]
  pub lock_attempts:   u32,
  #[serde(default = "default_lock_backoff_ms")]
  pub lock_backoff_ms: u64,
  pub storage:         StorageConfig,
}

/// Which backend holds the attendee table.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StorageConfig {
  /// Embedded database file; a leading `~/` is expanded.
  Sqlite { path: PathBuf },
  /// Pooled server connection.
  Mysql(MySqlConfig),
}

impl ServerConfig {
  /// Read `path` (if it exists) and overlay `ENTRY__*` variables.
  pub fn load(path: &Path) -> Result<Self, config::ConfigError> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("ENTRY")
          .separator("__")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn cache_ttl(&self) -> Duration { Duration::from_millis(self.cache_ttl_ms) }

  pub fn retry_policy(&self) -> RetryPolicy {
    RetryPolicy::new(self.lock_attempts, Duration::from_millis(self.lock_backoff_ms))
  }

  /// Wrap `store` in a [`Dashboard`] tuned by this config.
  pub fn dashboard<S: AttendeeStore>(&self, store: S) -> Dashboard<S> {
    Dashboard::new(store)
      .with_cache_ttl(self.cache_ttl())
      .with_retry_policy(self.retry_policy())
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: the API nested under `/api`, with request tracing.
pub fn router<S>(dashboard: Arc<Dashboard<S>>) -> Router
where
  S: AttendeeStore + 'static,
{
  Router::new()
    .nest("/api", entry_api::api_router(dashboard))
    .layer(TraceLayer::new_for_http())
}
