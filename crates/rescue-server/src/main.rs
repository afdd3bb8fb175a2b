//! `rescue-server`: the tracker's HTTP backend.
//!
//! ```text
//! rescue-server --config /etc/rescue/config.toml
//! rescue-server --hash-password      # print a PHC string for auth_password_hash
//! ```

use std::{io::BufRead as _, path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use rescue_server::{AppState, ServerConfig, auth::AuthConfig};
use rescue_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Dog rescue tracker server")]
struct Cli {
  /// TOML configuration file; `RESCUE_*` environment variables override it.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Read a password from stdin, print its argon2 hash, and exit.
  #[arg(long)]
  hash_password: bool,
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
  if cli.hash_password {
    eprint!("Password: ");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    println!("{}", AuthConfig::hash_password(line.trim_end_matches(['\r', '\n']))?);
    return Ok(());
  }

  let config = ServerConfig::load(&cli.config)?;
  let store_path = config.resolved_store_path();
  if let Some(dir) = store_path.parent().filter(|d| !d.as_os_str().is_empty()) {
    std::fs::create_dir_all(dir)
      .with_context(|| format!("creating {}", dir.display()))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("opening store at {}", store_path.display()))?;
  info!(path = %store_path.display(), "store ready");

  let state = AppState {
    store: Arc::new(store),
    auth:  Arc::new(config.auth()),
  };

  let address = config.address();
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("binding {address}"))?;
  info!("listening on http://{address}");

  axum::serve(listener, rescue_server::router(state))
    .with_graceful_shutdown(async {
      tokio::signal::ctrl_c().await.ok();
      info!("shutting down");
    })
    .await
    .context("serving HTTP")
}
