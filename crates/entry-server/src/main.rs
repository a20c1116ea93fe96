//! entry-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the
//! configured store, and serves the check-in API over HTTP.
//!
//! # Loading attendees
//!
//! ```
//! cargo run -p entry-server -- --import attendees.json
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use entry_core::{attendee::NewAttendee, store::AttendeeStore};
use entry_server::{ServerConfig, StorageConfig, expand_home};
use entry_store_mysql::MySqlStore;
use entry_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Event check-in desk server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Upsert attendees from a JSON array and exit.
  #[arg(long, value_name = "FILE")]
  import: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg =
    ServerConfig::load(&cli.config).context("failed to load ServerConfig")?;

  match &server_cfg.storage {
    StorageConfig::Sqlite { path } => {
      let path = expand_home(path);
      let store = SqliteStore::open(&path)
        .await
        .with_context(|| format!("failed to open store at {path:?}"))?;
      run(store, &server_cfg, cli.import.as_deref()).await
    }
    StorageConfig::Mysql(mysql) => {
      let store = MySqlStore::connect(mysql).await.with_context(|| {
        format!("failed to connect to mysql at {}:{}", mysql.host, mysql.port)
      })?;
      if cli.import.is_some() {
        store.init_schema().await.context("failed to create data table")?;
      }
      run(store, &server_cfg, cli.import.as_deref()).await
    }
  }
}

/// Import and exit, or serve until the listener fails.
async fn run<S>(store: S, cfg: &ServerConfig, import: Option<&Path>) -> anyhow::Result<()>
where
  S: AttendeeStore + 'static,
{
  let dashboard = Arc::new(cfg.dashboard(store));

  if let Some(file) = import {
    let attendees = read_attendees(file)?;
    let written = dashboard
      .import(attendees)
      .await
      .with_context(|| format!("failed to import {file:?}"))?;
    tracing::info!(written, file = ?file, "import complete");
    return Ok(());
  }

  let app = entry_server::router(dashboard);
  let address = cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

fn read_attendees(path: &Path) -> anyhow::Result<Vec<NewAttendee>> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("failed to read {path:?}"))?;
  serde_json::from_str(&raw).with_context(|| format!("{path:?} is not a JSON array of attendees"))
}
