//! Handlers for `/dogs` endpoints.
//!
//! | Method   | Path         | Notes |
//! |----------|--------------|-------|
//! | `GET`    | `/dogs`      | All dogs, oldest first |
//! | `POST`   | `/dogs`      | Body: `{"name": "...", ...}` |
//! | `GET`    | `/dogs/{id}` | Profile bundle; 404 if not found |
//! | `PUT`    | `/dogs/{id}` | Partial update; 404 if not found |
//! | `DELETE` | `/dogs/{id}` | 409 while the dog still has records |

use std::sync::Arc;

use axum::{
  Json,
  body::Bytes,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use rescue_core::{
  entity::{
    Activity, ChronicCondition, Dog, EmergencyAlert, HealthStatusUpdate,
    Medication, VeterinaryAppointment,
  },
  profile::DogProfile,
  store::RecordStore,
};
use uuid::Uuid;

use crate::{error::ApiError, extract::ApiPath, records::parse_fields};

fn not_found(id: Uuid) -> ApiError { ApiError::NotFound(format!("dog {id} not found")) }

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /dogs`
pub async fn list<S>(State(store): State<Arc<S>>) -> Result<Json<Vec<Dog>>, ApiError>
where
  S: RecordStore,
{
  let dogs = store.list_dogs().await.map_err(ApiError::store)?;
  Ok(Json(dogs))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /dogs`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore,
{
  let fields = parse_fields(&body)?;
  let dog = store.create::<Dog>(fields).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(dog)))
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// `GET /dogs/{id}` — the dog plus every per-dog collection.
pub async fn profile<S>(
  State(store): State<Arc<S>>,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<DogProfile>, ApiError>
where
  S: RecordStore,
{
  let (
    dog,
    activities,
    medications,
    health_updates,
    vet_appointments,
    chronic_conditions,
    emergency_alerts,
  ) = tokio::try_join!(
    store.get::<Dog>(id),
    store.list::<Activity>(id),
    store.list::<Medication>(id),
    store.list::<HealthStatusUpdate>(id),
    store.list::<VeterinaryAppointment>(id),
    store.list::<ChronicCondition>(id),
    store.list::<EmergencyAlert>(id),
  )
  .map_err(ApiError::store)?;

  let dog = dog.ok_or_else(|| not_found(id))?;
  let profile = DogProfile {
    dog,
    activities,
    medications,
    health_updates,
    vet_appointments,
    chronic_conditions,
    emergency_alerts,
    last_fed: None,
    last_walked: None,
  };
  Ok(Json(profile.summarize()))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PUT /dogs/{id}`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  ApiPath(id): ApiPath<Uuid>,
  body: Bytes,
) -> Result<Json<Dog>, ApiError>
where
  S: RecordStore,
{
  let fields = parse_fields(&body)?;
  let dog = store
    .update::<Dog>(id, fields)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(dog))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /dogs/{id}`
pub async fn remove<S>(
  State(store): State<Arc<S>>,
  ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Dog>, ApiError>
where
  S: RecordStore,
{
  let dog = store
    .delete::<Dog>(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| not_found(id))?;
  Ok(Json(dog))
}
