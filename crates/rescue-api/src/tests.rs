//! Router tests against an in-memory SQLite store.

use std::{sync::Arc, time::Duration};

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
  response::Response,
};
use futures_util::StreamExt as _;
use rescue_core::{entity::to_fields, store::RecordStore};
use rescue_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;
use uuid::Uuid;

use crate::api_router;

async fn store() -> Arc<SqliteStore> {
  Arc::new(SqliteStore::open_in_memory().await.unwrap())
}

async fn send(
  store: &Arc<SqliteStore>,
  method: &str,
  uri: &str,
  body: Option<Value>,
) -> Response {
  let mut builder = Request::builder().method(method).uri(uri);
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  api_router(store.clone())
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap()
}

async fn json_body(resp: Response) -> Value {
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

async fn new_dog(store: &Arc<SqliteStore>) -> Uuid {
  let resp = send(store, "POST", "/dogs", Some(json!({ "name": "Biscuit" }))).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  json_body(resp).await["id"].as_str().unwrap().parse().unwrap()
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_activity_returns_201_with_identity() {
  let s = store().await;
  let dog = new_dog(&s).await;

  let resp = send(
    &s,
    "POST",
    "/activities",
    Some(json!({ "dog_id": dog, "walker_id": "w1", "activity_type": "Walk" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);

  let body = json_body(resp).await;
  assert!(body["id"].as_str().unwrap().parse::<Uuid>().is_ok());
  assert!(body["created_at"].is_string());
  assert_eq!(body["walker_id"], json!("w1"));
}

#[tokio::test]
async fn create_medication_missing_dose_is_400() {
  let s = store().await;
  let dog = new_dog(&s).await;

  let resp = send(
    &s,
    "POST",
    "/medications",
    Some(json!({ "dog_id": dog, "type": "Carprofen", "frequency": "daily" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body = json_body(resp).await;
  assert_eq!(body["error"], json!("dose is required for medications"));
}

#[tokio::test]
async fn create_for_unknown_dog_is_400() {
  let s = store().await;
  let resp = send(
    &s,
    "POST",
    "/chronic_conditions",
    Some(json!({ "dog_id": Uuid::new_v4(), "condition_name": "Arthritis" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_json_is_400() {
  let s = store().await;
  let req = Request::builder()
    .method("POST")
    .uri("/activities")
    .body(Body::from("{not json"))
    .unwrap();
  let resp = api_router(s).oneshot(req).await.unwrap();
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_requires_dog_id() {
  let s = store().await;
  let resp = send(&s, "GET", "/activities", None).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  assert_eq!(json_body(resp).await["error"], json!("dog_id is required"));
}

#[tokio::test]
async fn empty_list_is_200() {
  let s = store().await;
  let dog = new_dog(&s).await;
  let resp = send(&s, "GET", &format!("/veterinary_appointments?dog_id={dog}"), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await, json!([]));
}

#[tokio::test]
async fn vet_list_returns_every_appointment() {
  let s = store().await;
  let dog = new_dog(&s).await;
  for day in ["2024-07-01T09:00:00Z", "2024-06-01T09:00:00Z"] {
    let resp = send(
      &s,
      "POST",
      "/veterinary_appointments",
      Some(json!({ "dog_id": dog, "appointment_date": day, "vet_name": "Dr. Ortiz" })),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
  }

  let resp = send(&s, "GET", &format!("/veterinary_appointments?dog_id={dog}"), None).await;
  let body = json_body(resp).await;
  let dates: Vec<&str> = body
    .as_array()
    .unwrap()
    .iter()
    .map(|a| a["appointment_date"].as_str().unwrap())
    .collect();
  assert_eq!(dates.len(), 2);
  assert!(dates[0].starts_with("2024-06-01"));
}

#[tokio::test]
async fn put_updates_by_body_id() {
  let s = store().await;
  let dog = new_dog(&s).await;
  let resp = send(
    &s,
    "POST",
    "/emergency_alerts",
    Some(json!({ "dog_id": dog, "alert_message": "Escaped" })),
  )
  .await;
  let id = json_body(resp).await["id"].clone();

  let resp = send(
    &s,
    "PUT",
    "/emergency_alerts",
    Some(json!({ "id": id, "resolved": true })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = json_body(resp).await;
  assert_eq!(body["resolved"], json!(true));
  assert_eq!(body["alert_message"], json!("Escaped"));
}

#[tokio::test]
async fn put_without_id_is_400_and_unknown_id_is_404() {
  let s = store().await;
  let resp = send(&s, "PUT", "/medications", Some(json!({ "dose": "5mg" }))).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

  let resp = send(
    &s,
    "PUT",
    "/medications",
    Some(json!({ "id": Uuid::new_v4(), "dose": "5mg" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_by_query_or_body() {
  let s = store().await;
  let dog = new_dog(&s).await;

  let mut ids = Vec::new();
  for _ in 0..2 {
    let resp = send(
      &s,
      "POST",
      "/health_updates",
      Some(json!({ "dog_id": dog, "symptoms": "sneezing" })),
    )
    .await;
    ids.push(json_body(resp).await["id"].as_str().unwrap().to_owned());
  }

  let resp = send(&s, "DELETE", &format!("/health_updates?id={}", ids[0]), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await["id"], json!(ids[0]));

  let resp = send(&s, "DELETE", "/health_updates", Some(json!({ "id": ids[1] }))).await;
  assert_eq!(resp.status(), StatusCode::OK);

  let resp = send(&s, "DELETE", "/health_updates", Some(json!({ "id": ids[1] }))).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);

  let resp = send(&s, "DELETE", "/health_updates", None).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_ids_get_a_json_error() {
  let s = store().await;
  for (method, uri) in [
    ("GET", "/activities?dog_id=nope"),
    ("DELETE", "/activities?id=zzz"),
    ("GET", "/dogs/nope"),
    ("PUT", "/dogs/nope"),
    ("GET", "/changes?table=cats"),
  ] {
    let resp = send(&s, method, uri, None).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{method} {uri}");
    assert_eq!(
      resp.headers()[header::CONTENT_TYPE],
      "application/json",
      "{method} {uri}"
    );
    let body = json_body(resp).await;
    assert!(body["error"].as_str().is_some_and(|m| !m.is_empty()), "{method} {uri}");
  }
}

#[tokio::test]
async fn vet_name_alias_works_on_update() {
  let s = store().await;
  let dog = new_dog(&s).await;
  let resp = send(
    &s,
    "POST",
    "/veterinary_appointments",
    Some(json!({
      "dog_id": dog,
      "appointment_date": "2024-06-01T09:00:00Z",
      "vetName": "Dr. Ortiz",
    })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let id = json_body(resp).await["id"].clone();

  let resp = send(
    &s,
    "PUT",
    "/veterinary_appointments",
    Some(json!({ "id": id, "vetName": "Dr. Reyes" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(json_body(resp).await["vet_name"], json!("Dr. Reyes"));
}

// ─── Dogs ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn dog_profile_bundles_children_and_last_times() {
  let s = store().await;
  let dog = new_dog(&s).await;
  for kind in ["Walk", "Feeding"] {
    send(
      &s,
      "POST",
      "/activities",
      Some(json!({ "dog_id": dog, "walker_id": "w1", "activity_type": kind })),
    )
    .await;
  }

  let resp = send(&s, "GET", &format!("/dogs/{dog}"), None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = json_body(resp).await;
  assert_eq!(body["dog"]["name"], json!("Biscuit"));
  assert_eq!(body["activities"].as_array().unwrap().len(), 2);
  assert_eq!(body["medications"], json!([]));
  assert!(body["last_fed"].is_string());
  assert!(body["last_walked"].is_string());
}

#[tokio::test]
async fn unknown_dog_profile_is_404() {
  let s = store().await;
  let resp = send(&s, "GET", &format!("/dogs/{}", Uuid::new_v4()), None).await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dog_with_records_cannot_be_deleted() {
  let s = store().await;
  let dog = new_dog(&s).await;
  send(
    &s,
    "POST",
    "/emergency_alerts",
    Some(json!({ "dog_id": dog, "alert_message": "Limping" })),
  )
  .await;

  let resp = send(&s, "DELETE", &format!("/dogs/{dog}"), None).await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);

  let resp = send(&s, "GET", "/dogs", None).await;
  assert_eq!(json_body(resp).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn update_dog_by_path() {
  let s = store().await;
  let dog = new_dog(&s).await;
  let resp = send(
    &s,
    "PUT",
    &format!("/dogs/{dog}"),
    Some(json!({ "status": "adopted" })),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = json_body(resp).await;
  assert_eq!(body["status"], json!("adopted"));
  assert_eq!(body["name"], json!("Biscuit"));
}

// ─── Analytics ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn walk_analytics() {
  let s = store().await;
  let dog = new_dog(&s).await;
  for kind in ["Walk", "Walk", "Feeding"] {
    send(
      &s,
      "POST",
      "/activities",
      Some(json!({ "dog_id": dog, "walker_id": "w1", "activity_type": kind })),
    )
    .await;
  }
  let resp = send(&s, "GET", "/analytics/walks", None).await;
  assert_eq!(
    json_body(resp).await,
    json!([{ "dog_id": dog, "walks": 2 }])
  );
}

#[tokio::test]
async fn care_calendar_lists_every_dogs_activities() {
  let s = store().await;
  let biscuit = new_dog(&s).await;
  let pepper = new_dog(&s).await;
  for (dog, kind) in [(biscuit, "Walk"), (pepper, "Feeding")] {
    send(
      &s,
      "POST",
      "/activities",
      Some(json!({ "dog_id": dog, "walker_id": "w1", "activity_type": kind })),
    )
    .await;
  }

  let resp = send(&s, "GET", "/analytics/calendar", None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body = json_body(resp).await;
  let kinds: Vec<&str> = body
    .as_array()
    .unwrap()
    .iter()
    .map(|a| a["activity_type"].as_str().unwrap())
    .collect();
  assert_eq!(kinds, ["Feeding", "Walk"]);

  let resp = send(&s, "GET", "/analytics/calendar?days=0", None).await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ─── Change feed ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn change_stream_emits_matching_events() {
  let s = store().await;
  let resp = send(&s, "GET", "/changes?table=dogs&event=INSERT", None).await;
  assert_eq!(resp.status(), StatusCode::OK);
  assert_eq!(
    resp.headers()[header::CONTENT_TYPE],
    "text/event-stream"
  );

  let mut frames = resp.into_body().into_data_stream();

  let dog = s
    .create::<rescue_core::entity::Dog>(to_fields(json!({ "name": "Biscuit" })).unwrap())
    .await
    .unwrap();

  let frame = tokio::time::timeout(Duration::from_secs(2), frames.next())
    .await
    .expect("frame before timeout")
    .unwrap()
    .unwrap();
  let text = String::from_utf8(frame.to_vec()).unwrap();
  assert!(text.starts_with("event: change\n"), "{text}");
  assert!(text.contains(&dog.id.to_string()));
  assert!(text.contains("\"INSERT\""));
}
