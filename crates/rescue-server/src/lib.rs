//! HTTP server for the rescue tracker.
//!
//! Mounts [`rescue_api`] under `/api` behind HTTP Basic auth, with request
//! tracing on every route.

pub mod auth;
pub mod error;

pub use error::Error;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use axum::{Router, middleware, routing::get};
use rescue_core::store::RecordStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, require_auth};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration. Every field is required; a missing one
/// aborts startup.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  /// SQLite file; a leading `~/` expands to `$HOME`.
  pub store_path:         PathBuf,
  pub auth_username:      String,
  pub auth_password_hash: String,
}

impl ServerConfig {
  /// Layer `RESCUE_*` environment variables over the TOML file at `path`
  /// (which may be absent).
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("RESCUE"))
      .build()
      .with_context(|| format!("reading configuration from {}", path.display()))?
      .try_deserialize()
      .context(
        "incomplete configuration: host, port, store_path, auth_username and \
         auth_password_hash are all required",
      )
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn auth(&self) -> AuthConfig {
    AuthConfig {
      username:      self.auth_username.clone(),
      password_hash: self.auth_password_hash.clone(),
    }
  }

  pub fn resolved_store_path(&self) -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    match (self.store_path.strip_prefix("~"), home) {
      (Ok(rest), Some(home)) => home.join(rest),
      _ => self.store_path.clone(),
    }
  }
}

// ─── Application state ───────────────────────────────────────────────────────

/// Everything the router needs.
#[derive(Clone)]
pub struct AppState<S: RecordStore> {
  pub store: Arc<S>,
  pub auth:  Arc<AuthConfig>,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the full axum [`Router`]: `/health` (open) and `/api/*` (authenticated).
pub fn router<S>(state: AppState<S>) -> Router
where
  S: RecordStore + 'static,
{
  let api = rescue_api::api_router(state.store.clone())
    .layer(middleware::from_fn_with_state(state.auth.clone(), require_auth));

  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
  use rescue_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  async fn make_state(password: &str) -> AppState<SqliteStore> {
    AppState {
      store: Arc::new(SqliteStore::open_in_memory().await.unwrap()),
      auth:  Arc::new(AuthConfig {
        username:      "volunteer".to_string(),
        password_hash: AuthConfig::hash_password(password).unwrap(),
      }),
    }
  }

  fn auth_header(user: &str, pass: &str) -> String {
    format!("Basic {}", B64.encode(format!("{user}:{pass}")))
  }

  async fn oneshot_raw(
    state:  AppState<SqliteStore>,
    method: &str,
    uri:    &str,
    auth:   Option<String>,
    body:   &str,
  ) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
      builder = builder.header(header::AUTHORIZATION, auth);
    }
    let req = builder.body(Body::from(body.to_string())).unwrap();
    router(state).oneshot(req).await.unwrap()
  }

  #[test]
  fn config_helpers() {
    let config = ServerConfig {
      host:               "127.0.0.1".into(),
      port:               8080,
      store_path:         PathBuf::from("~/rescue.db"),
      auth_username:      "volunteer".into(),
      auth_password_hash: "$argon2id$stub".into(),
    };
    assert_eq!(config.address(), "127.0.0.1:8080");
    assert_eq!(config.auth().username, "volunteer");
    if let Some(home) = std::env::var_os("HOME") {
      assert_eq!(config.resolved_store_path(), PathBuf::from(home).join("rescue.db"));
    }
  }

  #[test]
  fn missing_settings_are_fatal() {
    let path = std::env::temp_dir().join(format!("rescue-server-{}.toml", std::process::id()));
    std::fs::write(&path, "host = \"0.0.0.0\"\nport = 8080\n").unwrap();
    let err = ServerConfig::load(&path).unwrap_err();
    std::fs::remove_file(&path).ok();
    assert!(err.to_string().starts_with("incomplete configuration"));
  }

  #[tokio::test]
  async fn health_needs_no_auth() {
    let state = make_state("pw").await;
    let resp = oneshot_raw(state, "GET", "/health", None, "").await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn api_without_credentials_is_401() {
    let state = make_state("pw").await;
    let resp = oneshot_raw(state, "GET", "/api/dogs", None, "").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  #[tokio::test]
  async fn api_with_wrong_password_is_401() {
    let state = make_state("pw").await;
    let resp = oneshot_raw(
      state,
      "GET",
      "/api/dogs",
      Some(auth_header("volunteer", "nope")),
      "",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn authenticated_create_then_list() {
    let state = make_state("pw").await;
    let auth = auth_header("volunteer", "pw");

    let resp = oneshot_raw(
      state.clone(),
      "POST",
      "/api/dogs",
      Some(auth.clone()),
      &json!({ "name": "Biscuit", "breed": "Beagle" }).to_string(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = oneshot_raw(state, "GET", "/api/dogs", Some(auth), "").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let dogs: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(dogs[0]["name"], json!("Biscuit"));
  }
}
