//! Cross-dog read models.
//!
//! | Method | Path                            | Notes |
//! |--------|---------------------------------|-------|
//! | `GET`  | `/analytics/walks`              | Walk totals per dog, busiest first |
//! | `GET`  | `/analytics/calendar?days=<n>`  | Every dog's activities from the last `n` days, newest first |

use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::{Duration, Utc};
use rescue_core::{entity::Activity, profile::WalkCount, store::RecordStore};
use serde::Deserialize;

use crate::{error::ApiError, extract::ApiQuery};

/// Calendar window when `days` is not given.
pub const DEFAULT_CALENDAR_DAYS: u32 = 14;
const MAX_CALENDAR_DAYS: u32 = 366;

pub async fn walks<S>(State(store): State<Arc<S>>) -> Result<Json<Vec<WalkCount>>, ApiError>
where
  S: RecordStore,
{
  let counts = store.walk_counts().await.map_err(ApiError::store)?;
  Ok(Json(counts))
}

#[derive(Debug, Deserialize)]
pub struct CalendarParams {
  pub days: Option<u32>,
}

pub async fn calendar<S>(
  State(store): State<Arc<S>>,
  ApiQuery(params): ApiQuery<CalendarParams>,
) -> Result<Json<Vec<Activity>>, ApiError>
where
  S: RecordStore,
{
  let days = params.days.unwrap_or(DEFAULT_CALENDAR_DAYS);
  if days == 0 || days > MAX_CALENDAR_DAYS {
    return Err(ApiError::BadRequest(format!(
      "days must be between 1 and {MAX_CALENDAR_DAYS}"
    )));
  }
  let since = Utc::now() - Duration::days(i64::from(days));
  let activities = store
    .recent_activities(since)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(activities))
}
