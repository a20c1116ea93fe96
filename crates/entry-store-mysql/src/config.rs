//! Connection settings for the pooled store.

use std::time::Duration;

use serde::Deserialize;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};

fn default_port() -> u16 { 3306 }
fn default_pool_size() -> u32 { 5 }
fn default_acquire_timeout_ms() -> u64 { 5_000 }

/// Where the server lives and how many connections to keep open to it.
#[derive(Debug, Clone, Deserialize)]
pub struct MySqlConfig {
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  pub user:               String,
  #[serde(default)]
  pub password:           String,
  pub database:           String,
  #[serde(default = "default_pool_size")]
  pub pool_size:          u32,
  #[serde(default = "default_acquire_timeout_ms")]
  pub acquire_timeout_ms: u64,
}

impl MySqlConfig {
  pub fn connect_options(&self) -> MySqlConnectOptions {
    MySqlConnectOptions::new()
      .host(&self.host)
      .port(self.port)
      .username(&self.user)
      .password(&self.password)
      .database(&self.database)
  }

  pub fn pool_options(&self) -> MySqlPoolOptions {
    MySqlPoolOptions::new()
      .max_connections(self.pool_size.max(1))
      .acquire_timeout(Duration::from_millis(self.acquire_timeout_ms))
  }
}
