//! The dog profile bundle: one dog plus every child collection.
//!
//! This is the snapshot a detail page loads on mount and re-fetches on its
//! polling interval. Also home to the cross-dog read models: walk totals and
//! the care calendar.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{
  Activity, ActivityType, ChronicCondition, Dog, EmergencyAlert,
  HealthStatusUpdate, Medication, VeterinaryAppointment,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DogProfile {
  pub dog:                Dog,
  pub activities:         Vec<Activity>,
  pub medications:        Vec<Medication>,
  pub health_updates:     Vec<HealthStatusUpdate>,
  pub vet_appointments:   Vec<VeterinaryAppointment>,
  pub chronic_conditions: Vec<ChronicCondition>,
  pub emergency_alerts:   Vec<EmergencyAlert>,
  /// Most recent `Feeding` activity, if any.
  pub last_fed:           Option<DateTime<Utc>>,
  /// Most recent `Walk` activity, if any.
  pub last_walked:        Option<DateTime<Utc>>,
}

impl DogProfile {
  /// Recompute `last_fed` / `last_walked` from `activities`.
  pub fn summarize(mut self) -> Self {
    self.last_fed = last_activity(&self.activities, ActivityType::Feeding);
    self.last_walked = last_activity(&self.activities, ActivityType::Walk);
    self
  }
}

/// Latest `created_at` among activities of `kind`, regardless of list order.
pub fn last_activity<'a>(
  activities: impl IntoIterator<Item = &'a Activity>,
  kind: ActivityType,
) -> Option<DateTime<Utc>> {
  activities
    .into_iter()
    .filter(|a| a.activity_type == kind)
    .map(|a| a.created_at)
    .max()
}

/// Number of `Walk` activities recorded for one dog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkCount {
  pub dog_id: uuid::Uuid,
  pub walks:  u64,
}

// ─── Care calendar ───────────────────────────────────────────────────────────

/// One day of the care calendar: every activity logged that day, any dog.
#[derive(Debug, Clone, PartialEq)]
pub struct CareDay {
  pub day:        NaiveDate,
  pub activities: Vec<Activity>,
}

/// Group `activities` by calendar day in `tz`, newest day first and newest
/// activity first within a day.
pub fn care_calendar<Tz: TimeZone>(
  activities: impl IntoIterator<Item = Activity>,
  tz: &Tz,
) -> Vec<CareDay> {
  let mut activities: Vec<Activity> = activities.into_iter().collect();
  activities.sort_by_key(|a| std::cmp::Reverse(a.created_at));

  let mut days: Vec<CareDay> = Vec::new();
  for activity in activities {
    let day = activity.created_at.with_timezone(tz).date_naive();
    match days.last_mut() {
      Some(last) if last.day == day => last.activities.push(activity),
      _ => days.push(CareDay {
        day,
        activities: vec![activity],
      }),
    }
  }
  days
}
