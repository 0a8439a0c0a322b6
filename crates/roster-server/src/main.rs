//! roster-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! todo store, connects to the directory and the authorizer, and serves the
//! JSON API over HTTP.
//!
//! Minimal `config.toml`:
//!
//! ```toml
//! [jwt]
//! secret = "change-me"
//!
//! [directory]
//! url = "https://directory.example.com:9393"
//! api_key = "..."
//! tenant_id = "..."
//!
//! [authorizer]
//! url = "https://authorizer.example.com:8383"
//! policy_root = "todoApp"
//! ```

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use roster_api::AppState;
use roster_core::{authz::Authorizer, directory::Directory};
use roster_directory::{HttpAuthorizer, HttpDirectory, InMemoryDirectory, PermitAll};
use roster_identity::UserCache;
use roster_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::settings::{ServerConfig, expand_tilde};

#[derive(Parser)]
#[command(author, version, about = "Roster todo API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg = ServerConfig::load(&cli.config)?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let auth = server_cfg.jwt.auth_config()?;
  let users = server_cfg.user_cache()?;

  match server_cfg.directory.http() {
    Some(http_cfg) => {
      tracing::info!(url = %http_cfg.url, "using directory gateway");
      let directory = HttpDirectory::new(http_cfg).context("invalid directory url")?;
      with_authorizer(&server_cfg, store, directory, users, auth).await
    }
    None => {
      tracing::warn!("no directory url configured; using an empty in-memory directory");
      let directory = InMemoryDirectory::current();
      with_authorizer(&server_cfg, store, directory, users, auth).await
    }
  }
}

async fn with_authorizer<D>(
  server_cfg: &ServerConfig,
  store: SqliteStore,
  directory: D,
  users: UserCache,
  auth: roster_api::AuthConfig,
) -> anyhow::Result<()>
where
  D: Directory + 'static,
{
  match server_cfg.authorizer.http()? {
    Some(http_cfg) => {
      tracing::info!(url = %http_cfg.url, policy_root = %http_cfg.policy_root, "using authorizer");
      let authorizer = HttpAuthorizer::new(http_cfg).context("invalid authorizer settings")?;
      serve(server_cfg, store, directory, authorizer, users, auth).await
    }
    None => {
      tracing::warn!("no authorizer url configured; every authenticated request is allowed");
      serve(server_cfg, store, directory, PermitAll, users, auth).await
    }
  }
}

async fn serve<D, A>(
  server_cfg: &ServerConfig,
  store: SqliteStore,
  directory: D,
  authorizer: A,
  users: UserCache,
  auth: roster_api::AuthConfig,
) -> anyhow::Result<()>
where
  D: Directory + 'static,
  A: Authorizer + 'static,
{
  let state = AppState::new(
    Arc::new(store),
    Arc::new(directory),
    Arc::new(authorizer),
    users,
    auth,
  );

  // Warm the schema probe; a failure here is retried on the first request.
  if let Err(e) = state.resolver.probe().detect().await {
    tracing::warn!(error = %e, "directory schema probe failed at startup");
  }

  let app = roster_api::router(state).layer(CorsLayer::permissive());
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
