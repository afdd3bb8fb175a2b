//! The `RecordStore` trait — the relational backend behind the API.
//!
//! The trait is implemented by storage backends (e.g. `rescue-store-sqlite`).
//! Higher layers (`rescue-api`, `rescue-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
  Fields,
  change::ChangeEvent,
  entity::{Activity, ChildEntity, Dog, Entity},
  error::Classify,
  profile::WalkCount,
};

/// Abstraction over the hosted relational backend.
///
/// Every method returns a `Send` future so the trait can be used from axum
/// handlers on a multi-threaded runtime. Writes publish one
/// [`ChangeEvent`] each, after the write has committed.
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Dogs ──────────────────────────────────────────────────────────────

  /// All dogs, oldest first.
  fn list_dogs(
    &self,
  ) -> impl Future<Output = Result<Vec<Dog>, Self::Error>> + Send + '_;

  // ── Any table ─────────────────────────────────────────────────────────

  /// All records of `T` belonging to `dog_id`, in the table's list order.
  fn list<T: ChildEntity>(
    &self,
    dog_id: Uuid,
  ) -> impl Future<Output = Result<Vec<T>, Self::Error>> + Send + '_;

  /// A single record by id. Returns `None` if not found.
  fn get<T: Entity>(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<T>, Self::Error>> + Send + '_;

  /// Validate `fields`, assign `id` and timestamps, persist, and return the
  /// stored record. Child records must name an existing dog.
  fn create<T: Entity>(
    &self,
    fields: Fields,
  ) -> impl Future<Output = Result<T, Self::Error>> + Send + '_;

  /// Merge `patch` into the record with `id`. Returns `None` if not found.
  fn update<T: Entity>(
    &self,
    id: Uuid,
    patch: Fields,
  ) -> impl Future<Output = Result<Option<T>, Self::Error>> + Send + '_;

  /// Remove the record with `id` and return it. Returns `None` if not
  /// found. Deleting a dog that still owns records is refused.
  fn delete<T: Entity>(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<T>, Self::Error>> + Send + '_;

  // ── Analytics ─────────────────────────────────────────────────────────

  /// Number of `Walk` activities per dog, for dogs with at least one.
  fn walk_counts(
    &self,
  ) -> impl Future<Output = Result<Vec<WalkCount>, Self::Error>> + Send + '_;

  /// Activities for every dog created at or after `since`, newest first.
  fn recent_activities(
    &self,
    since: DateTime<Utc>,
  ) -> impl Future<Output = Result<Vec<Activity>, Self::Error>> + Send + '_;

  // ── Change feed ───────────────────────────────────────────────────────

  /// Subscribe to every change committed from now on.
  fn changes(&self) -> broadcast::Receiver<ChangeEvent>;
}
