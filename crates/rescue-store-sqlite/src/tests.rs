//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{Duration, Utc};
use rescue_core::{
  ErrorClass,
  change::ChangeKind,
  entity::{
    Activity, ActivityType, ChronicCondition, Dog, EmergencyAlert,
    HealthStatusUpdate, Medication, VeterinaryAppointment, to_fields,
  },
  error::Classify as _,
  store::RecordStore,
  Table,
};
use serde_json::json;
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn dog(s: &SqliteStore, name: &str) -> Dog {
  s.create(to_fields(json!({ "name": name })).unwrap())
    .await
    .unwrap()
}

async fn walk(s: &SqliteStore, dog_id: Uuid, kind: &str) -> Activity {
  s.create(
    to_fields(json!({
      "dog_id": dog_id,
      "walker_id": "w1",
      "activity_type": kind,
    }))
    .unwrap(),
  )
  .await
  .unwrap()
}

// ─── Dogs ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_dog() {
  let s = store().await;
  let created = dog(&s, "Biscuit").await;

  let fetched: Dog = s.get(created.id).await.unwrap().unwrap();
  assert_eq!(fetched, created);
  assert_eq!(fetched.name, "Biscuit");
}

#[tokio::test]
async fn get_missing_returns_none() {
  let s = store().await;
  let result: Option<Dog> = s.get(Uuid::new_v4()).await.unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn get_checks_the_table() {
  let s = store().await;
  let d = dog(&s, "Biscuit").await;
  let wrong: Option<Medication> = s.get(d.id).await.unwrap();
  assert!(wrong.is_none());
}

#[tokio::test]
async fn list_dogs_oldest_first() {
  let s = store().await;
  let a = dog(&s, "A").await;
  let b = dog(&s, "B").await;
  let c = dog(&s, "C").await;

  let ids: Vec<Uuid> = s.list_dogs().await.unwrap().iter().map(|d| d.id).collect();
  assert_eq!(ids, vec![a.id, b.id, c.id]);
}

#[tokio::test]
async fn dog_without_name_is_rejected() {
  let s = store().await;
  let err = s
    .create::<Dog>(to_fields(json!({ "breed": "Beagle" })).unwrap())
    .await
    .unwrap_err();
  assert_eq!(err.class(), ErrorClass::Validation);
  assert!(err.to_string().contains("name"));
}

#[tokio::test]
async fn deleting_dog_with_records_is_refused() {
  let s = store().await;
  let d = dog(&s, "Biscuit").await;
  let a = walk(&s, d.id, "Walk").await;

  let err = s.delete::<Dog>(d.id).await.unwrap_err();
  assert!(matches!(err, Error::DogHasRecords { count: 1, .. }));
  assert_eq!(err.class(), ErrorClass::Conflict);

  s.delete::<Activity>(a.id).await.unwrap().unwrap();
  let removed: Dog = s.delete(d.id).await.unwrap().unwrap();
  assert_eq!(removed.id, d.id);
  assert!(s.list_dogs().await.unwrap().is_empty());
}

// ─── Child records ───────────────────────────────────────────────────────────

#[tokio::test]
async fn child_record_needs_an_existing_dog() {
  let s = store().await;
  let missing = Uuid::new_v4();
  let err = s
    .create::<EmergencyAlert>(
      to_fields(json!({ "dog_id": missing, "alert_message": "Escaped" })).unwrap(),
    )
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(rescue_core::Error::UnknownDog(id)) if id == missing
  ));
  assert_eq!(err.class(), ErrorClass::Validation);
}

#[tokio::test]
async fn medication_missing_dose_is_not_stored() {
  let s = store().await;
  let d = dog(&s, "Biscuit").await;
  let err = s
    .create::<Medication>(
      to_fields(json!({ "dog_id": d.id, "type": "Carprofen", "frequency": "daily" }))
        .unwrap(),
    )
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(rescue_core::Error::MissingFields { ref fields, .. }) if fields == &["dose"]
  ));
  assert!(s.list::<Medication>(d.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn activities_list_newest_first_for_one_dog() {
  let s = store().await;
  let d = dog(&s, "Biscuit").await;
  let other = dog(&s, "Pepper").await;

  let first = walk(&s, d.id, "Walk").await;
  let second = walk(&s, d.id, "Feeding").await;
  walk(&s, other.id, "Walk").await;

  let listed: Vec<Activity> = s.list(d.id).await.unwrap();
  let ids: Vec<Uuid> = listed.iter().map(|a| a.id).collect();
  assert_eq!(ids, vec![second.id, first.id]);
}

#[tokio::test]
async fn empty_listing_is_an_empty_vec() {
  let s = store().await;
  let d = dog(&s, "Biscuit").await;
  assert!(s.list::<ChronicCondition>(d.id).await.unwrap().is_empty());
  assert!(s.list::<Activity>(Uuid::new_v4()).await.unwrap().is_empty());
}

#[tokio::test]
async fn vet_appointments_list_by_appointment_date_ascending() {
  let s = store().await;
  let d = dog(&s, "Biscuit").await;
  let soon = Utc::now() + Duration::days(1);
  let later = Utc::now() + Duration::days(10);

  for at in [later, soon] {
    s.create::<VeterinaryAppointment>(
      to_fields(json!({ "dog_id": d.id, "appointment_date": at })).unwrap(),
    )
    .await
    .unwrap();
  }

  let listed: Vec<VeterinaryAppointment> = s.list(d.id).await.unwrap();
  assert_eq!(listed.len(), 2);
  assert!(listed[0].appointment_date < listed[1].appointment_date);
}

#[tokio::test]
async fn emergency_alerts_list_by_alert_date_descending() {
  let s = store().await;
  let d = dog(&s, "Biscuit").await;
  let old = Utc::now() - Duration::days(3);

  let backdated: EmergencyAlert = s
    .create(
      to_fields(json!({ "dog_id": d.id, "alert_message": "old", "alert_date": old }))
        .unwrap(),
    )
    .await
    .unwrap();
  let fresh: EmergencyAlert = s
    .create(to_fields(json!({ "dog_id": d.id, "alert_message": "new" })).unwrap())
    .await
    .unwrap();

  let ids: Vec<Uuid> = s
    .list::<EmergencyAlert>(d.id)
    .await
    .unwrap()
    .iter()
    .map(|a| a.id)
    .collect();
  assert_eq!(ids, vec![fresh.id, backdated.id]);
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_merges_fields_and_keeps_identity() {
  let s = store().await;
  let d = dog(&s, "Biscuit").await;
  let alert: EmergencyAlert = s
    .create(to_fields(json!({ "dog_id": d.id, "alert_message": "Escaped" })).unwrap())
    .await
    .unwrap();

  let resolved: EmergencyAlert = s
    .update(alert.id, to_fields(json!({ "resolved": true })).unwrap())
    .await
    .unwrap()
    .unwrap();
  assert!(resolved.resolved);
  assert_eq!(resolved.alert_message, "Escaped");
  assert_eq!(resolved.created_at, alert.created_at);

  let stored: EmergencyAlert = s.get(alert.id).await.unwrap().unwrap();
  assert_eq!(stored, resolved);
}

#[tokio::test]
async fn update_missing_returns_none() {
  let s = store().await;
  let result: Option<Dog> = s
    .update(Uuid::new_v4(), to_fields(json!({ "name": "x" })).unwrap())
    .await
    .unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn update_to_unknown_dog_is_rejected() {
  let s = store().await;
  let d = dog(&s, "Biscuit").await;
  let a = walk(&s, d.id, "Walk").await;
  let err = s
    .update::<Activity>(a.id, to_fields(json!({ "dog_id": Uuid::new_v4() })).unwrap())
    .await
    .unwrap_err();
  assert_eq!(err.class(), ErrorClass::Validation);
}

#[tokio::test]
async fn health_update_refreshes_updated_at() {
  let s = store().await;
  let d = dog(&s, "Biscuit").await;
  let h: HealthStatusUpdate = s
    .create(to_fields(json!({ "dog_id": d.id })).unwrap())
    .await
    .unwrap();
  let patched: HealthStatusUpdate = s
    .update(h.id, to_fields(json!({ "concerns": "not eating" })).unwrap())
    .await
    .unwrap()
    .unwrap();
  assert!(patched.updated_at >= h.updated_at);
  assert_eq!(patched.concerns.as_deref(), Some("not eating"));
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_returns_removed_record_then_none() {
  let s = store().await;
  let d = dog(&s, "Biscuit").await;
  let a = walk(&s, d.id, "Feeding").await;

  let removed: Activity = s.delete(a.id).await.unwrap().unwrap();
  assert_eq!(removed, a);
  assert!(s.delete::<Activity>(a.id).await.unwrap().is_none());
}

// ─── Change feed ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn every_write_publishes_one_change() {
  let s = store().await;
  let mut rx = s.changes();

  let d = dog(&s, "Biscuit").await;
  let a = walk(&s, d.id, "Walk").await;
  s.update::<Activity>(a.id, to_fields(json!({ "notes": "good boy" })).unwrap())
    .await
    .unwrap();
  s.delete::<Activity>(a.id).await.unwrap();

  let expected = [
    (Table::Dogs, ChangeKind::Insert),
    (Table::Activities, ChangeKind::Insert),
    (Table::Activities, ChangeKind::Update),
    (Table::Activities, ChangeKind::Delete),
  ];
  for (table, event) in expected {
    let change = rx.recv().await.unwrap();
    assert_eq!((change.table, change.event), (table, event));
  }
  assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn failed_writes_publish_nothing() {
  let s = store().await;
  let mut rx = s.changes();
  let _ = s
    .create::<Dog>(to_fields(json!({ "name": "" })).unwrap())
    .await;
  let _ = s.delete::<Dog>(Uuid::new_v4()).await;
  assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn update_event_carries_old_and_new_rows() {
  let s = store().await;
  let d = dog(&s, "Biscuit").await;
  let mut rx = s.changes();

  s.update::<Dog>(d.id, to_fields(json!({ "name": "Biscuit II" })).unwrap())
    .await
    .unwrap();

  let change = rx.recv().await.unwrap();
  assert_eq!(change.record_id(), Some(d.id));
  assert_eq!(change.old.unwrap()["name"], json!("Biscuit"));
  assert_eq!(change.new.unwrap()["name"], json!("Biscuit II"));
}

// ─── Analytics ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn walk_counts_only_count_walks() {
  let s = store().await;
  let busy = dog(&s, "Busy").await;
  let lazy = dog(&s, "Lazy").await;
  let fed_only = dog(&s, "Fed").await;

  walk(&s, busy.id, "Walk").await;
  walk(&s, busy.id, "Walk").await;
  walk(&s, busy.id, "Feeding").await;
  walk(&s, lazy.id, "Walk").await;
  walk(&s, fed_only.id, "Feeding").await;

  let counts = s.walk_counts().await.unwrap();
  assert_eq!(counts.len(), 2);
  assert_eq!((counts[0].dog_id, counts[0].walks), (busy.id, 2));
  assert_eq!((counts[1].dog_id, counts[1].walks), (lazy.id, 1));
}

#[tokio::test]
async fn recent_activities_span_every_dog_newest_first() {
  let s = store().await;
  let a = dog(&s, "Biscuit").await;
  let b = dog(&s, "Pepper").await;
  let first = walk(&s, a.id, "Walk").await;
  let second = walk(&s, b.id, "Feeding").await;
  let third = walk(&s, a.id, "Temperament Notes").await;

  let since = first.created_at - Duration::minutes(1);
  let recent = s.recent_activities(since).await.unwrap();
  let ids: Vec<Uuid> = recent.iter().map(|r| r.id).collect();
  assert_eq!(ids, vec![third.id, second.id, first.id]);

  let later = third.created_at + Duration::minutes(1);
  assert!(s.recent_activities(later).await.unwrap().is_empty());
}

#[tokio::test]
async fn activity_type_round_trips_through_json_body() {
  let s = store().await;
  let d = dog(&s, "Biscuit").await;
  let a = walk(&s, d.id, "Temperament Notes").await;
  let stored: Activity = s.get(a.id).await.unwrap().unwrap();
  assert_eq!(stored.activity_type, ActivityType::TemperamentNotes);
}
