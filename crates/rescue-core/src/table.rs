//! The seven tables the tracker knows about, and their per-table rules.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// One entity collection. The string form (`snake_case`) doubles as the
/// backend table name, the HTTP route segment, and the change-feed `table`.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Table {
  Dogs,
  Activities,
  Medications,
  HealthUpdates,
  VeterinaryAppointments,
  ChronicConditions,
  EmergencyAlerts,
}

/// Direction a table's listing is sorted in by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
  Ascending,
  Descending,
}

impl Table {
  /// Every table whose rows belong to a dog.
  pub const CHILDREN: [Table; 6] = [
    Table::Activities,
    Table::Medications,
    Table::HealthUpdates,
    Table::VeterinaryAppointments,
    Table::ChronicConditions,
    Table::EmergencyAlerts,
  ];

  pub fn name(self) -> &'static str { self.into() }

  pub fn is_child(self) -> bool { self != Table::Dogs }

  /// Fields a create payload must carry (present, non-null, non-blank).
  pub fn required_fields(self) -> &'static [&'static str] {
    match self {
      Table::Dogs => &["name"],
      Table::Activities => &["dog_id", "walker_id", "activity_type"],
      Table::Medications => &["dog_id", "type", "dose", "frequency"],
      Table::HealthUpdates => &["dog_id"],
      Table::VeterinaryAppointments => &["dog_id", "appointment_date"],
      Table::ChronicConditions => &["dog_id", "condition_name"],
      Table::EmergencyAlerts => &["dog_id", "alert_message"],
    }
  }

  /// Order of `list` results for this table. The sort key itself comes from
  /// [`Entity::sort_at`](crate::entity::Entity::sort_at).
  pub fn list_order(self) -> SortOrder {
    match self {
      Table::Activities | Table::EmergencyAlerts | Table::HealthUpdates => {
        SortOrder::Descending
      }
      Table::Dogs
      | Table::Medications
      | Table::VeterinaryAppointments
      | Table::ChronicConditions => SortOrder::Ascending,
    }
  }
}
