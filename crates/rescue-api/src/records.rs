//! Handlers shared by every per-dog record table.
//!
//! Each table is mounted at `/{table}` (e.g. `/activities`):
//!
//! | Method   | Path        | Notes |
//! |----------|-------------|-------|
//! | `GET`    | `/{table}`  | Requires `?dog_id=`; full list, possibly empty |
//! | `POST`   | `/{table}`  | Body: record fields; 201 with the stored record |
//! | `PUT`    | `/{table}`  | Body: `{"id": ..., ...changes}`; 404 if absent |
//! | `DELETE` | `/{table}`  | `id` from the query or body; returns the removed record |

use std::sync::Arc;

use axum::{
  Json, Router,
  body::Bytes,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
  routing::get,
};
use rescue_core::{Fields, entity::ChildEntity, store::RecordStore, validate};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{error::ApiError, extract::ApiQuery};

/// Routes for one record table, ready to be merged into the API router.
pub fn routes<S, T>() -> Router<Arc<S>>
where
  S: RecordStore + 'static,
  T: ChildEntity,
{
  let path = format!("/{}", T::TABLE);
  Router::new().route(
    &path,
    get(list::<S, T>)
      .post(create::<S, T>)
      .put(update::<S, T>)
      .delete(remove::<S, T>),
  )
}

// ─── Body helpers ────────────────────────────────────────────────────────────

/// Parse a request body as a JSON object. An empty body is an empty object.
pub(crate) fn parse_fields(body: &[u8]) -> Result<Fields, ApiError> {
  if body.iter().all(u8::is_ascii_whitespace) {
    return Ok(Fields::new());
  }
  match serde_json::from_slice(body) {
    Ok(Value::Object(fields)) => Ok(fields),
    Ok(_) => Err(ApiError::BadRequest("body must be a JSON object".into())),
    Err(e) => Err(ApiError::BadRequest(format!("invalid JSON body: {e}"))),
  }
}

/// Take `id` out of `fields`, failing with 400 when it is blank or malformed.
fn take_id(fields: &mut Fields, fallback: Option<Uuid>) -> Result<Uuid, ApiError> {
  let raw = fields.remove("id");
  if validate::is_blank(raw.as_ref()) {
    return fallback.ok_or_else(|| ApiError::BadRequest("id is required".into()));
  }
  raw
    .as_ref()
    .and_then(Value::as_str)
    .and_then(|s| s.parse().ok())
    .ok_or_else(|| ApiError::BadRequest("id must be a UUID".into()))
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub dog_id: Option<Uuid>,
}

/// `GET /{table}?dog_id=<uuid>`
pub async fn list<S, T>(
  State(store): State<Arc<S>>,
  ApiQuery(params): ApiQuery<ListParams>,
) -> Result<Json<Vec<T>>, ApiError>
where
  S: RecordStore,
  T: ChildEntity,
{
  let dog_id = params
    .dog_id
    .ok_or_else(|| ApiError::BadRequest("dog_id is required".into()))?;
  let records = store.list::<T>(dog_id).await.map_err(ApiError::store)?;
  Ok(Json(records))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /{table}`
pub async fn create<S, T>(
  State(store): State<Arc<S>>,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore,
  T: ChildEntity,
{
  let fields = parse_fields(&body)?;
  let record = store.create::<T>(fields).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(record)))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PUT /{table}` — body: `{"id": "...", ...changes}`
pub async fn update<S, T>(
  State(store): State<Arc<S>>,
  body: Bytes,
) -> Result<Json<T>, ApiError>
where
  S: RecordStore,
  T: ChildEntity,
{
  let mut fields = parse_fields(&body)?;
  let id = take_id(&mut fields, None)?;
  let record = store
    .update::<T>(id, fields)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("{} {id} not found", T::TABLE)))?;
  Ok(Json(record))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct IdParams {
  pub id: Option<Uuid>,
}

/// `DELETE /{table}[?id=<uuid>]` — or body `{"id": "..."}`
pub async fn remove<S, T>(
  State(store): State<Arc<S>>,
  ApiQuery(params): ApiQuery<IdParams>,
  body: Bytes,
) -> Result<Json<T>, ApiError>
where
  S: RecordStore,
  T: ChildEntity,
{
  let mut fields = parse_fields(&body)?;
  let id = take_id(&mut fields, params.id)?;
  let record = store
    .delete::<T>(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("{} {id} not found", T::TABLE)))?;
  Ok(Json(record))
}
