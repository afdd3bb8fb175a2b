//! Entity types — the seven record kinds the tracker stores.
//!
//! Records are plain data. Identity (`id`) and timestamps are always assigned
//! by the backend; callers submit loose [`Fields`] and receive the typed
//! record back.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use uuid::Uuid;

use crate::{Error, Fields, Result, Table, validate};

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Behaviour shared by every record kind.
pub trait Entity:
  Clone + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
  /// The table this record lives in.
  const TABLE: Table;

  fn id(&self) -> Uuid;

  fn created_at(&self) -> DateTime<Utc>;

  /// The owning dog, for every kind except [`Dog`] itself.
  fn dog_id(&self) -> Option<Uuid> { None }

  /// Timestamp listings are ordered by. Direction comes from
  /// [`Table::list_order`].
  fn sort_at(&self) -> DateTime<Utc> { self.created_at() }

  /// Alternate spellings accepted on input, as `(alias, field)` pairs.
  const ALIASES: &'static [(&'static str, &'static str)] = &[];

  /// Server-side defaults applied to a create payload after `id` and
  /// `created_at` have been stamped.
  fn stamp_create(_fields: &mut Fields, _now: DateTime<Utc>) {}

  /// Server-side stamps applied to a partial update before merging.
  fn stamp_update(_fields: &mut Fields, _now: DateTime<Utc>) {}
}

/// Marker for records that belong to a dog and are listed per dog.
pub trait ChildEntity: Entity {}

// ─── Dog ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dog {
  pub id:            Uuid,
  pub name:          String,
  pub age:           Option<u32>,
  #[serde(default)]
  pub breed:         String,
  #[serde(default)]
  pub health_status: String,
  /// General status, e.g. "available" or "adopted".
  #[serde(default)]
  pub status:        String,
  #[serde(default)]
  pub temperament:   String,
  #[serde(default)]
  pub notes:         String,
  pub created_at:    DateTime<Utc>,
}

impl Entity for Dog {
  const TABLE: Table = Table::Dogs;

  fn id(&self) -> Uuid { self.id }

  fn created_at(&self) -> DateTime<Utc> { self.created_at }
}

// ─── Activity ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityType {
  Walk,
  Feeding,
  #[serde(rename = "Temperament Notes")]
  TemperamentNotes,
}

impl ActivityType {
  pub const ALL: [ActivityType; 3] = [
    ActivityType::Walk,
    ActivityType::Feeding,
    ActivityType::TemperamentNotes,
  ];

  pub fn label(self) -> &'static str {
    match self {
      ActivityType::Walk => "Walk",
      ActivityType::Feeding => "Feeding",
      ActivityType::TemperamentNotes => "Temperament Notes",
    }
  }
}

impl fmt::Display for ActivityType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

/// A walk, a feeding, or a temperament observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
  pub id:                Uuid,
  pub dog_id:            Uuid,
  /// Who performed the activity.
  pub walker_id:         String,
  pub activity_type:     ActivityType,
  pub notes:             Option<String>,
  pub temperament_notes: Option<String>,
  pub created_at:        DateTime<Utc>,
}

impl Entity for Activity {
  const TABLE: Table = Table::Activities;

  fn id(&self) -> Uuid { self.id }

  fn created_at(&self) -> DateTime<Utc> { self.created_at }

  fn dog_id(&self) -> Option<Uuid> { Some(self.dog_id) }
}

impl ChildEntity for Activity {}

// ─── Medication ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
  pub id:                   Uuid,
  pub dog_id:               Uuid,
  /// Name or type of the medication.
  #[serde(rename = "type")]
  pub kind:                 String,
  pub dose:                 String,
  pub frequency:            String,
  pub last_administered_at: Option<DateTime<Utc>>,
  pub created_at:           DateTime<Utc>,
}

impl Entity for Medication {
  const TABLE: Table = Table::Medications;

  fn id(&self) -> Uuid { self.id }

  fn created_at(&self) -> DateTime<Utc> { self.created_at }

  fn dog_id(&self) -> Option<Uuid> { Some(self.dog_id) }
}

impl ChildEntity for Medication {}

// ─── HealthStatusUpdate ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatusUpdate {
  pub id:               Uuid,
  pub dog_id:           Uuid,
  pub symptoms:         Option<String>,
  pub behavior_changes: Option<String>,
  pub concerns:         Option<String>,
  pub created_at:       DateTime<Utc>,
  /// Refreshed by the backend on every update.
  pub updated_at:       DateTime<Utc>,
}

impl Entity for HealthStatusUpdate {
  const TABLE: Table = Table::HealthUpdates;

  fn id(&self) -> Uuid { self.id }

  fn created_at(&self) -> DateTime<Utc> { self.created_at }

  fn dog_id(&self) -> Option<Uuid> { Some(self.dog_id) }

  fn sort_at(&self) -> DateTime<Utc> { self.updated_at }

  fn stamp_create(fields: &mut Fields, now: DateTime<Utc>) {
    fields.insert("updated_at".into(), timestamp(now));
  }

  fn stamp_update(fields: &mut Fields, now: DateTime<Utc>) {
    fields.insert("updated_at".into(), timestamp(now));
  }
}

impl ChildEntity for HealthStatusUpdate {}

// ─── VeterinaryAppointment ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VeterinaryAppointment {
  pub id:                     Uuid,
  pub dog_id:                 Uuid,
  pub appointment_date:       DateTime<Utc>,
  pub reason:                 Option<String>,
  pub vet_name:               Option<String>,
  pub vet_recommendations:    Option<String>,
  pub follow_up_instructions: Option<String>,
  pub created_at:             DateTime<Utc>,
}

impl Entity for VeterinaryAppointment {
  const TABLE: Table = Table::VeterinaryAppointments;
  const ALIASES: &'static [(&'static str, &'static str)] = &[("vetName", "vet_name")];

  fn id(&self) -> Uuid { self.id }

  fn created_at(&self) -> DateTime<Utc> { self.created_at }

  fn dog_id(&self) -> Option<Uuid> { Some(self.dog_id) }

  fn sort_at(&self) -> DateTime<Utc> { self.appointment_date }
}

impl ChildEntity for VeterinaryAppointment {}

// ─── ChronicCondition ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChronicCondition {
  pub id:              Uuid,
  pub dog_id:          Uuid,
  pub condition_name:  String,
  pub diagnosis_date:  Option<NaiveDate>,
  pub management_plan: Option<String>,
  pub description:     Option<String>,
  pub created_at:      DateTime<Utc>,
}

impl Entity for ChronicCondition {
  const TABLE: Table = Table::ChronicConditions;

  fn id(&self) -> Uuid { self.id }

  fn created_at(&self) -> DateTime<Utc> { self.created_at }

  fn dog_id(&self) -> Option<Uuid> { Some(self.dog_id) }
}

impl ChildEntity for ChronicCondition {}

// ─── EmergencyAlert ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyAlert {
  pub id:            Uuid,
  pub dog_id:        Uuid,
  pub alert_message: String,
  /// When the alert was raised; defaults to the creation time.
  pub alert_date:    DateTime<Utc>,
  #[serde(default)]
  pub resolved:      bool,
  pub created_at:    DateTime<Utc>,
}

impl Entity for EmergencyAlert {
  const TABLE: Table = Table::EmergencyAlerts;

  fn id(&self) -> Uuid { self.id }

  fn created_at(&self) -> DateTime<Utc> { self.created_at }

  fn dog_id(&self) -> Option<Uuid> { Some(self.dog_id) }

  fn sort_at(&self) -> DateTime<Utc> { self.alert_date }

  fn stamp_create(fields: &mut Fields, now: DateTime<Utc>) {
    let missing = fields.get("alert_date").is_none_or(Value::is_null);
    if missing {
      fields.insert("alert_date".into(), timestamp(now));
    }
  }
}

impl ChildEntity for EmergencyAlert {}

// ─── Record construction ─────────────────────────────────────────────────────

/// Keys no caller may set or change.
const IMMUTABLE: [&str; 2] = ["id", "created_at"];

fn timestamp(at: DateTime<Utc>) -> Value { Value::String(at.to_rfc3339()) }

/// Rename aliased keys to their field names. The field name wins when both
/// are present.
fn normalize<T: Entity>(fields: &mut Fields) {
  for &(alias, field) in T::ALIASES {
    if let Some(value) = fields.remove(alias) {
      fields.entry(field).or_insert(value);
    }
  }
}

fn invalid<T: Entity>(e: serde_json::Error) -> Error {
  Error::InvalidRecord {
    table:   T::TABLE,
    message: e.to_string(),
  }
}

/// Build a brand-new record from a create payload: check required fields,
/// stamp identity and timestamps, apply per-kind defaults.
pub fn new_record<T: Entity>(
  mut fields: Fields,
  id: Uuid,
  now: DateTime<Utc>,
) -> Result<T> {
  normalize::<T>(&mut fields);
  validate::require(T::TABLE, &fields)?;
  for key in IMMUTABLE {
    fields.remove(key);
  }
  fields.insert("id".into(), Value::String(id.to_string()));
  fields.insert("created_at".into(), timestamp(now));
  T::stamp_create(&mut fields, now);
  serde_json::from_value(Value::Object(fields)).map_err(invalid::<T>)
}

/// Merge a partial update into `current` (last write wins, field by field).
/// `id` and `created_at` are never overwritten, and the merged record must
/// still satisfy the table's required fields.
pub fn patch_record<T: Entity>(
  current: &T,
  mut patch: Fields,
  now: DateTime<Utc>,
) -> Result<T> {
  normalize::<T>(&mut patch);
  for key in IMMUTABLE {
    patch.remove(key);
  }
  T::stamp_update(&mut patch, now);

  let Value::Object(mut merged) = serde_json::to_value(current)? else {
    return Err(Error::NotAnObject);
  };
  merged.extend(patch);
  validate::require(T::TABLE, &merged)?;
  serde_json::from_value(Value::Object(merged)).map_err(invalid::<T>)
}

/// Convert any serialisable value (usually `json!({...})`) into [`Fields`].
pub fn to_fields(value: impl Serialize) -> Result<Fields> {
  match serde_json::to_value(value)? {
    Value::Object(map) => Ok(map),
    _ => Err(Error::NotAnObject),
  }
}
