//! Async HTTP client wrapping the rescue JSON API.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use rescue_core::{
  Fields, Table,
  change::ChangeFilter,
  entity::{Activity, ChildEntity, Dog},
  profile::{DogProfile, WalkCount},
  validate,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Connection settings for the rescue API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Every way a gateway call can fail. Callers branch on this and show a
/// message; nothing here panics.
#[derive(Debug, Error)]
pub enum GatewayError {
  /// Rejected before any request was sent.
  #[error(transparent)]
  Validation(#[from] rescue_core::Error),

  #[error("{0}")]
  NotFound(String),

  /// The server answered with an error status.
  #[error("server returned {status}: {message}")]
  Backend { status: StatusCode, message: String },

  #[error("network error: {0}")]
  Transport(#[from] reqwest::Error),
}

impl GatewayError {
  /// Message suitable for the status line.
  pub fn user_message(&self) -> String {
    match self {
      GatewayError::Validation(e) => e.to_string(),
      GatewayError::NotFound(m) => m.clone(),
      GatewayError::Backend { message, .. } => message.clone(),
      GatewayError::Transport(_) => "Could not reach the server".to_string(),
    }
  }
}

pub type Result<T, E = GatewayError> = std::result::Result<T, E>;

// ─── Client ──────────────────────────────────────────────────────────────────

/// Async HTTP client for the rescue JSON REST API.
///
/// Cheap to clone — the inner [`reqwest::Client`]s are `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  /// No overall timeout: used for the long-lived change stream.
  stream: Client,
  config: ApiConfig,
}

fn path_for(table: Table) -> String { format!("/{table}") }

impl ApiClient {
  pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
    use anyhow::Context as _;
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    let stream = Client::builder()
      .connect_timeout(Duration::from_secs(10))
      .build()
      .context("failed to build streaming HTTP client")?;
    Ok(Self {
      client,
      stream,
      config,
    })
  }

  /// The signed-in user; pre-fills "walker" on activity forms.
  pub fn username(&self) -> &str { &self.config.username }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    req.basic_auth(&self.config.username, Some(&self.config.password))
  }

  /// Turn a response into `T`, or into the matching [`GatewayError`].
  async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
    if resp.status().is_success() {
      return Ok(resp.json().await?);
    }
    Err(Self::error_from(resp).await)
  }

  /// Read an error response's `{"error": ...}` body.
  async fn error_from(resp: Response) -> GatewayError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
      .ok()
      .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_owned))
      .unwrap_or_else(|| {
        status.canonical_reason().unwrap_or("request failed").to_owned()
      });
    debug!(%status, %message, "gateway call failed");
    match status {
      StatusCode::NOT_FOUND => GatewayError::NotFound(message),
      _ => GatewayError::Backend { status, message },
    }
  }

  async fn get_json<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, String)],
  ) -> Result<T> {
    let resp = self
      .auth(self.client.get(self.url(path)))
      .query(query)
      .send()
      .await?;
    Self::decode(resp).await
  }

  async fn send_json<T: DeserializeOwned>(
    &self,
    method: reqwest::Method,
    path: &str,
    body: &impl Serialize,
  ) -> Result<T> {
    let resp = self
      .auth(self.client.request(method, self.url(path)))
      .json(body)
      .send()
      .await?;
    Self::decode(resp).await
  }

  // ── Dogs ──────────────────────────────────────────────────────────────────

  /// `GET /api/dogs`
  pub async fn list_dogs(&self) -> Result<Vec<Dog>> { self.get_json("/dogs", &[]).await }

  /// `GET /api/dogs/{id}` — the detail page snapshot.
  pub async fn dog_profile(&self, dog_id: Uuid) -> Result<DogProfile> {
    self.get_json(&format!("/dogs/{dog_id}"), &[]).await
  }

  /// `POST /api/dogs`
  pub async fn create_dog(&self, fields: Fields) -> Result<Dog> {
    validate::require(Table::Dogs, &fields)?;
    self
      .send_json(reqwest::Method::POST, "/dogs", &fields)
      .await
  }

  /// `PUT /api/dogs/{id}`
  pub async fn update_dog(&self, id: Uuid, patch: Fields) -> Result<Dog> {
    self
      .send_json(reqwest::Method::PUT, &format!("/dogs/{id}"), &patch)
      .await
  }

  /// `DELETE /api/dogs/{id}`
  pub async fn delete_dog(&self, id: Uuid) -> Result<Dog> {
    let resp = self
      .auth(self.client.delete(self.url(&format!("/dogs/{id}"))))
      .send()
      .await?;
    Self::decode(resp).await
  }

  // ── Per-dog records ───────────────────────────────────────────────────────

  /// `GET /api/{table}?dog_id=<id>`
  pub async fn list<T: ChildEntity>(&self, dog_id: Uuid) -> Result<Vec<T>> {
    self
      .get_json(&path_for(T::TABLE), &[("dog_id", dog_id.to_string())])
      .await
  }

  /// `POST /api/{table}` — required fields are checked before sending.
  pub async fn create<T: ChildEntity>(&self, fields: Fields) -> Result<T> {
    validate::require(T::TABLE, &fields)?;
    self
      .send_json(reqwest::Method::POST, &path_for(T::TABLE), &fields)
      .await
  }

  /// `PUT /api/{table}` with `id` merged into the body.
  pub async fn update<T: ChildEntity>(&self, id: Uuid, mut patch: Fields) -> Result<T> {
    patch.insert("id".into(), Value::String(id.to_string()));
    self
      .send_json(reqwest::Method::PUT, &path_for(T::TABLE), &patch)
      .await
  }

  /// `DELETE /api/{table}?id=<id>`
  pub async fn delete<T: ChildEntity>(&self, id: Uuid) -> Result<T> {
    let resp = self
      .auth(self.client.delete(self.url(&path_for(T::TABLE))))
      .query(&[("id", id.to_string())])
      .send()
      .await?;
    Self::decode(resp).await
  }

  // ── Analytics ─────────────────────────────────────────────────────────────

  /// `GET /api/analytics/walks`
  pub async fn walk_counts(&self) -> Result<Vec<WalkCount>> {
    self.get_json("/analytics/walks", &[]).await
  }

  /// `GET /api/analytics/calendar?days=<n>` — every dog's recent activities.
  pub async fn recent_activities(&self, days: u32) -> Result<Vec<Activity>> {
    self
      .get_json("/analytics/calendar", &[("days", days.to_string())])
      .await
  }

  // ── Change feed ───────────────────────────────────────────────────────────

  /// Open `GET /api/changes` as an event stream. The caller reads the body.
  pub async fn open_changes(&self, filter: ChangeFilter) -> Result<Response> {
    let mut query: Vec<(&str, String)> = Vec::new();
    if let Some(table) = filter.table {
      query.push(("table", table.to_string()));
    }
    if let Some(event) = filter.event {
      query.push(("event", event.to_string()));
    }
    let resp = self
      .auth(self.stream.get(self.url("/changes")))
      .header(reqwest::header::ACCEPT, "text/event-stream")
      .query(&query)
      .send()
      .await?;
    if resp.status().is_success() {
      Ok(resp)
    } else {
      Err(Self::error_from(resp).await)
    }
  }
}
