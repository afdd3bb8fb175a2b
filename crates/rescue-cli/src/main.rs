//! `rescue` — terminal client for the rescue tracker.
//!
//! # Usage
//!
//! ```text
//! rescue --url http://localhost:8080 --user volunteer --password secret
//! rescue --config ~/.config/rescue/client.toml
//! ```
//!
//! Set `RESCUE_LOG=/path/to/file` to write logs; the terminal belongs to
//! the UI.

mod app;
mod client;
mod feed;
mod form;
mod poll;
mod ui;

use std::{fs::File, io, path::PathBuf, sync::Mutex, time::Duration};

use anyhow::{Context, Result, bail};
use app::{App, AppMessage};
use clap::Parser;
use client::{ApiClient, ApiConfig};
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "rescue", about = "Terminal client for the rescue tracker")]
struct Args {
  /// Path to a TOML config file (url, username, password, poll_secs).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the rescue server.
  #[arg(long, env = "RESCUE_URL")]
  url: Option<String>,

  /// API username.
  #[arg(long, env = "RESCUE_USER")]
  user: Option<String>,

  /// API password (plaintext).
  #[arg(long, env = "RESCUE_PASSWORD")]
  password: Option<String>,

  /// Seconds between snapshot re-fetches.
  #[arg(long, env = "RESCUE_POLL_SECS")]
  poll_secs: Option<u64>,
}

// ─── Config file ─────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:       String,
  #[serde(default)]
  username:  String,
  #[serde(default)]
  password:  String,
  poll_secs: Option<u64>,
}

const DEFAULT_POLL_SECS: u64 = 30;

fn pick(flag: Option<String>, file: String) -> Option<String> {
  flag.or_else(|| (!file.is_empty()).then_some(file))
}

/// Resolve flags over the config file. Missing connection settings are fatal.
fn resolve(args: Args) -> Result<(ApiConfig, Duration)> {
  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  let Some(base_url) = pick(args.url, file_cfg.url) else {
    bail!("no server URL: pass --url, set RESCUE_URL, or add `url` to the config file");
  };
  let Some(username) = pick(args.user, file_cfg.username) else {
    bail!("no username: pass --user, set RESCUE_USER, or add `username` to the config file");
  };
  let Some(password) = pick(args.password, file_cfg.password) else {
    bail!("no password: pass --password, set RESCUE_PASSWORD, or add `password` to the config file");
  };
  let poll_secs = args
    .poll_secs
    .or(file_cfg.poll_secs)
    .unwrap_or(DEFAULT_POLL_SECS)
    .max(1);

  Ok((
    ApiConfig {
      base_url,
      username,
      password,
    },
    Duration::from_secs(poll_secs),
  ))
}

fn init_logging() -> Result<()> {
  let Some(path) = std::env::var_os("RESCUE_LOG") else {
    return Ok(());
  };
  let file = File::create(&path)
    .with_context(|| format!("creating log file {}", PathBuf::from(&path).display()))?;
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(Mutex::new(file))
    .with_ansi(false)
    .init();
  Ok(())
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let (api_config, poll_every) = resolve(Args::parse())?;
  init_logging()?;
  info!(url = %api_config.base_url, "starting");

  let client = ApiClient::new(api_config)?;
  let (tx, mut rx) = mpsc::unbounded_channel();
  let mut app = App::new(client, poll_every, tx);

  // Set up the terminal.
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  app.mount_list().await;
  let run_result = run_event_loop(&mut terminal, &mut app, &mut rx).await;
  app.shutdown();

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  run_result
}

// ─── Event loop ──────────────────────────────────────────────────────────────

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
  rx: &mut mpsc::UnboundedReceiver<AppMessage>,
) -> Result<()> {
  loop {
    if app.take_dirty() {
      terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;
    }

    // Poll for input, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    match maybe_event {
      Some(Event::Key(key)) if key.kind == KeyEventKind::Press => {
        if !app.handle_key(key).await? {
          break;
        }
      }
      Some(Event::Resize(_, _)) => app.mark_dirty(),
      _ => {}
    }

    // Background tasks only report; the store is written here.
    while let Ok(msg) = rx.try_recv() {
      app.handle_message(msg).await;
    }
  }

  Ok(())
}
