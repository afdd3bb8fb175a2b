//! [`Store`] — one [`Collection`] per record kind, owned by the app root.

use std::sync::Arc;

use rescue_core::{
  Table,
  entity::{
    Activity, ChronicCondition, Dog, EmergencyAlert, Entity, HealthStatusUpdate,
    Medication, VeterinaryAppointment,
  },
  profile::DogProfile,
};
use tracing::debug;

use crate::collection::{Collection, StoreEvent, SubscriptionId};

/// The client's view of every table.
#[derive(Debug, Default)]
pub struct Store {
  pub dogs:               Collection<Dog>,
  pub activities:         Collection<Activity>,
  pub medications:        Collection<Medication>,
  pub health_updates:     Collection<HealthStatusUpdate>,
  pub vet_appointments:   Collection<VeterinaryAppointment>,
  pub chronic_conditions: Collection<ChronicCondition>,
  pub emergency_alerts:   Collection<EmergencyAlert>,
}

/// Record kinds the [`Store`] can hand out a typed collection for.
pub trait Stored: Entity {
  fn collection(store: &Store) -> &Collection<Self>;
  fn collection_mut(store: &mut Store) -> &mut Collection<Self>;
}

macro_rules! stored {
  ($($ty:ty => $field:ident),* $(,)?) => {
    $(
      impl Stored for $ty {
        fn collection(store: &Store) -> &Collection<Self> { &store.$field }
        fn collection_mut(store: &mut Store) -> &mut Collection<Self> {
          &mut store.$field
        }
      }
    )*
  };
}

stored! {
  Dog                   => dogs,
  Activity              => activities,
  Medication            => medications,
  HealthStatusUpdate    => health_updates,
  VeterinaryAppointment => vet_appointments,
  ChronicCondition      => chronic_conditions,
  EmergencyAlert        => emergency_alerts,
}

impl Store {
  pub fn new() -> Self { Self::default() }

  pub fn of<T: Stored>(&self) -> &Collection<T> { T::collection(self) }

  pub fn of_mut<T: Stored>(&mut self) -> &mut Collection<T> {
    T::collection_mut(self)
  }

  /// Register `observer` on every collection. Returns one id per table.
  pub fn subscribe_all(
    &mut self,
    observer: Arc<dyn Fn(&StoreEvent) + Send + Sync>,
  ) -> Vec<SubscriptionId> {
    vec![
      self.dogs.subscribe(observer.clone()),
      self.activities.subscribe(observer.clone()),
      self.medications.subscribe(observer.clone()),
      self.health_updates.subscribe(observer.clone()),
      self.vet_appointments.subscribe(observer.clone()),
      self.chronic_conditions.subscribe(observer.clone()),
      self.emergency_alerts.subscribe(observer),
    ]
  }

  /// Drop every subscription in `ids`, whichever collection holds it.
  pub fn unsubscribe_all(&mut self, ids: &[SubscriptionId]) {
    for &id in ids {
      let _ = self.dogs.unsubscribe(id)
        || self.activities.unsubscribe(id)
        || self.medications.unsubscribe(id)
        || self.health_updates.unsubscribe(id)
        || self.vet_appointments.unsubscribe(id)
        || self.chronic_conditions.unsubscribe(id)
        || self.emergency_alerts.unsubscribe(id);
    }
  }

  /// Number of records held for `table`.
  pub fn len_of(&self, table: Table) -> usize {
    match table {
      Table::Dogs => self.dogs.len(),
      Table::Activities => self.activities.len(),
      Table::Medications => self.medications.len(),
      Table::HealthUpdates => self.health_updates.len(),
      Table::VeterinaryAppointments => self.vet_appointments.len(),
      Table::ChronicConditions => self.chronic_conditions.len(),
      Table::EmergencyAlerts => self.emergency_alerts.len(),
    }
  }

  // ── Snapshots ─────────────────────────────────────────────────────────────

  /// Load the dog list page snapshot.
  pub fn load_dogs(&mut self, dogs: Vec<Dog>) {
    debug!(count = dogs.len(), "loading dog snapshot");
    self.dogs.replace_all(dogs);
  }

  /// Load a detail page snapshot: upsert the dog, replace every child
  /// collection with the profile's lists.
  pub fn load_profile(&mut self, profile: DogProfile) {
    debug!(dog = %profile.dog.id, "loading profile snapshot");
    self.dogs.add(profile.dog);
    self.activities.replace_all(profile.activities);
    self.medications.replace_all(profile.medications);
    self.health_updates.replace_all(profile.health_updates);
    self.vet_appointments.replace_all(profile.vet_appointments);
    self.chronic_conditions.replace_all(profile.chronic_conditions);
    self.emergency_alerts.replace_all(profile.emergency_alerts);
  }
}
