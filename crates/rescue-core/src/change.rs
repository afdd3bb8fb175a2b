//! Push-change events: the payload of the backend's change feed.
//!
//! Every successful write publishes exactly one [`ChangeEvent`]. Inserts carry
//! `new`, deletes carry `old`, updates carry both.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{Result, Table, entity::Entity};

/// Row-level operation reported by the change feed.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ChangeKind {
  Insert,
  Update,
  Delete,
}

/// A single insert, update, or delete on a watched table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
  pub table: Table,
  pub event: ChangeKind,
  /// The row after the write (`INSERT`, `UPDATE`).
  #[serde(default)]
  pub new:   Option<Value>,
  /// The row before the write (`UPDATE`, `DELETE`).
  #[serde(default)]
  pub old:   Option<Value>,
}

impl ChangeEvent {
  pub fn inserted<T: Entity>(record: &T) -> Result<Self> {
    Ok(Self {
      table: T::TABLE,
      event: ChangeKind::Insert,
      new:   Some(serde_json::to_value(record)?),
      old:   None,
    })
  }

  pub fn updated<T: Entity>(before: &T, after: &T) -> Result<Self> {
    Ok(Self {
      table: T::TABLE,
      event: ChangeKind::Update,
      new:   Some(serde_json::to_value(after)?),
      old:   Some(serde_json::to_value(before)?),
    })
  }

  pub fn deleted<T: Entity>(record: &T) -> Result<Self> {
    Ok(Self {
      table: T::TABLE,
      event: ChangeKind::Delete,
      new:   None,
      old:   Some(serde_json::to_value(record)?),
    })
  }

  /// The row this event is about, whichever side carries it.
  fn row(&self) -> Option<&Value> { self.new.as_ref().or(self.old.as_ref()) }

  /// Id of the affected row, if the payload carries a parseable one.
  pub fn record_id(&self) -> Option<Uuid> { uuid_field(self.row()?, "id") }

  /// The dog this event concerns: the row itself for `dogs`, otherwise its
  /// `dog_id`.
  pub fn dog_id(&self) -> Option<Uuid> {
    match self.table {
      Table::Dogs => self.record_id(),
      _ => uuid_field(self.row()?, "dog_id"),
    }
  }
}

fn uuid_field(row: &Value, key: &str) -> Option<Uuid> {
  row.get(key)?.as_str()?.parse().ok()
}

// ─── Filter ──────────────────────────────────────────────────────────────────

/// Subscription filter: by table, by event kind, or both. Empty matches all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeFilter {
  pub table: Option<Table>,
  pub event: Option<ChangeKind>,
}

impl ChangeFilter {
  pub fn table(table: Table) -> Self {
    Self {
      table: Some(table),
      event: None,
    }
  }

  pub fn matches(&self, change: &ChangeEvent) -> bool {
    self.table.is_none_or(|t| t == change.table)
      && self.event.is_none_or(|e| e == change.event)
  }
}
