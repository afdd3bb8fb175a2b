//! JSON REST API for the rescue tracker: dogs, the six per-dog record
//! tables, a change stream, walk analytics and the care calendar.
//!
//! Generic over [`rescue_core::store::RecordStore`]. Authentication is
//! layered on by the server binary.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", rescue_api::api_router(store.clone()))
//! ```

pub mod analytics;
pub mod changes;
pub mod dogs;
pub mod error;
pub mod extract;
pub mod records;

use std::sync::Arc;

use axum::{Router, routing::get};
use rescue_core::{
  entity::{
    Activity, ChronicCondition, EmergencyAlert, HealthStatusUpdate, Medication,
    VeterinaryAppointment,
  },
  store::RecordStore,
};

pub use error::ApiError;

/// All API routes with `store` already bound as state, so the router nests
/// under any parent.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: RecordStore + 'static,
{
  Router::new()
    // Dogs
    .route("/dogs", get(dogs::list::<S>).post(dogs::create::<S>))
    .route(
      "/dogs/{id}",
      get(dogs::profile::<S>)
        .put(dogs::update::<S>)
        .delete(dogs::remove::<S>),
    )
    // Per-dog records
    .merge(records::routes::<S, Activity>())
    .merge(records::routes::<S, Medication>())
    .merge(records::routes::<S, HealthStatusUpdate>())
    .merge(records::routes::<S, VeterinaryAppointment>())
    .merge(records::routes::<S, ChronicCondition>())
    .merge(records::routes::<S, EmergencyAlert>())
    // Push feed
    .route("/changes", get(changes::stream::<S>))
    // Analytics
    .route("/analytics/walks", get(analytics::walks::<S>))
    .route("/analytics/calendar", get(analytics::calendar::<S>))
    .with_state(store)
}

#[cfg(test)]
mod tests;
