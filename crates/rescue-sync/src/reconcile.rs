//! Applying push-feed [`ChangeEvent`]s to a [`Store`].
//!
//! `INSERT` upserts `new`, `UPDATE` overwrites with `new` if present, and
//! `DELETE` removes `old.id` if present. Duplicate or out-of-order delivery is
//! therefore harmless.

use rescue_core::{
  Table,
  change::{ChangeEvent, ChangeKind},
  entity::{
    Activity, ChronicCondition, Dog, EmergencyAlert, HealthStatusUpdate,
    Medication, VeterinaryAppointment,
  },
};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::store::{Store, Stored};

#[derive(Debug, Error)]
pub enum ReconcileError {
  #[error("{event} event for {table} carries no `{side}` row")]
  MissingRow {
    table: Table,
    event: ChangeKind,
    side:  &'static str,
  },

  #[error("{table} row has no usable id")]
  MissingId { table: Table },

  #[error("undecodable {table} row: {source}")]
  Decode {
    table:  Table,
    #[source]
    source: serde_json::Error,
  },
}

pub type Result<T, E = ReconcileError> = std::result::Result<T, E>;

// ─── Scope ───────────────────────────────────────────────────────────────────

/// Which events a page cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
  /// Every event (the dog list page).
  All,
  /// Only events about one dog or its records (a detail page).
  Dog(Uuid),
}

impl Scope {
  pub fn admits(&self, change: &ChangeEvent) -> bool {
    match self {
      Scope::All => true,
      Scope::Dog(id) => change.dog_id() == Some(*id),
    }
  }
}

// ─── Apply ───────────────────────────────────────────────────────────────────

/// Apply `change` to `store`. Returns whether the store was mutated.
pub fn apply(store: &mut Store, change: &ChangeEvent) -> Result<bool> {
  let changed = match change.table {
    Table::Dogs => apply_to::<Dog>(store, change)?,
    Table::Activities => apply_to::<Activity>(store, change)?,
    Table::Medications => apply_to::<Medication>(store, change)?,
    Table::HealthUpdates => apply_to::<HealthStatusUpdate>(store, change)?,
    Table::VeterinaryAppointments => {
      apply_to::<VeterinaryAppointment>(store, change)?
    }
    Table::ChronicConditions => apply_to::<ChronicCondition>(store, change)?,
    Table::EmergencyAlerts => apply_to::<EmergencyAlert>(store, change)?,
  };
  debug!(table = %change.table, event = %change.event, changed, "applied change");
  Ok(changed)
}

/// Apply `change` if `scope` admits it; log and swallow malformed events.
pub fn apply_scoped(store: &mut Store, scope: Scope, change: &ChangeEvent) -> bool {
  if !scope.admits(change) {
    return false;
  }
  match apply(store, change) {
    Ok(changed) => changed,
    Err(e) => {
      warn!(error = %e, "ignoring malformed change event");
      false
    }
  }
}

fn apply_to<T: Stored>(store: &mut Store, change: &ChangeEvent) -> Result<bool> {
  let collection = store.of_mut::<T>();
  match change.event {
    ChangeKind::Insert => {
      collection.add(decode::<T>(change, change.new.as_ref(), "new")?);
      Ok(true)
    }
    ChangeKind::Update => {
      Ok(collection.update(decode::<T>(change, change.new.as_ref(), "new")?))
    }
    ChangeKind::Delete => {
      let old = row(change, change.old.as_ref(), "old")?;
      let id = old
        .get("id")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .ok_or(ReconcileError::MissingId { table: change.table })?;
      Ok(collection.remove(id))
    }
  }
}

fn row<'a>(
  change: &ChangeEvent,
  value: Option<&'a Value>,
  side: &'static str,
) -> Result<&'a Value> {
  value.ok_or(ReconcileError::MissingRow {
    table: change.table,
    event: change.event,
    side,
  })
}

fn decode<T: Stored>(
  change: &ChangeEvent,
  value: Option<&Value>,
  side: &'static str,
) -> Result<T> {
  let value = row(change, value, side)?;
  serde_json::from_value(value.clone()).map_err(|source| ReconcileError::Decode {
    table: change.table,
    source,
  })
}
