//! [`Collection`] — an observable, insertion-ordered container of records.

use std::{
  fmt,
  sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
  },
};

use indexmap::IndexMap;
use rescue_core::{Table, entity::Entity};
use tracing::trace;
use uuid::Uuid;

// ─── Events ──────────────────────────────────────────────────────────────────

/// What changed in a collection. Delivered to observers after the mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
  Replaced { table: Table, len: usize },
  Added { table: Table, id: Uuid },
  Updated { table: Table, id: Uuid },
  Removed { table: Table, id: Uuid },
}

impl StoreEvent {
  pub fn table(&self) -> Table {
    match self {
      StoreEvent::Replaced { table, .. }
      | StoreEvent::Added { table, .. }
      | StoreEvent::Updated { table, .. }
      | StoreEvent::Removed { table, .. } => *table,
    }
  }
}

/// Handle returned by [`Collection::subscribe`]. Unique across collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
  fn next() -> Self {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    Self(NEXT.fetch_add(1, Ordering::Relaxed))
  }
}

pub type Observer = Arc<dyn Fn(&StoreEvent) + Send + Sync>;

// ─── Collection ──────────────────────────────────────────────────────────────

/// Records of one kind, keyed by id, in insertion order.
///
/// Every successful mutation notifies each observer once, synchronously,
/// before the mutating call returns.
pub struct Collection<T: Entity> {
  items:     IndexMap<Uuid, T>,
  observers: Vec<(SubscriptionId, Observer)>,
}

impl<T: Entity> Collection<T> {
  pub fn new() -> Self {
    Self {
      items:     IndexMap::new(),
      observers: Vec::new(),
    }
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  /// Snapshot of every record, in insertion order.
  pub fn get_all(&self) -> Vec<T> { self.items.values().cloned().collect() }

  pub fn iter(&self) -> impl Iterator<Item = &T> { self.items.values() }

  pub fn get(&self, id: Uuid) -> Option<&T> { self.items.get(&id) }

  pub fn contains(&self, id: Uuid) -> bool { self.items.contains_key(&id) }

  pub fn len(&self) -> usize { self.items.len() }

  pub fn is_empty(&self) -> bool { self.items.is_empty() }

  // ── Mutations ─────────────────────────────────────────────────────────────

  /// Replace the whole collection, keeping the order of `items`. Later
  /// duplicates of an id overwrite earlier ones in place.
  pub fn replace_all(&mut self, items: impl IntoIterator<Item = T>) {
    self.items = items.into_iter().map(|item| (item.id(), item)).collect();
    self.notify(StoreEvent::Replaced {
      table: T::TABLE,
      len:   self.items.len(),
    });
  }

  /// Upsert: append when the id is new, overwrite in place when it is not.
  pub fn add(&mut self, item: T) {
    let id = item.id();
    self.items.insert(id, item);
    self.notify(StoreEvent::Added { table: T::TABLE, id });
  }

  /// Overwrite the record with the same id. Returns `false`, and notifies
  /// nobody, when the id is not present.
  pub fn update(&mut self, item: T) -> bool {
    let id = item.id();
    let Some(slot) = self.items.get_mut(&id) else {
      trace!(table = %T::TABLE, %id, "update for absent record ignored");
      return false;
    };
    *slot = item;
    self.notify(StoreEvent::Updated { table: T::TABLE, id });
    true
  }

  /// Remove the record with `id`. Returns `false`, and notifies nobody, when
  /// the id is not present.
  pub fn remove(&mut self, id: Uuid) -> bool {
    if self.items.shift_remove(&id).is_none() {
      trace!(table = %T::TABLE, %id, "remove for absent record ignored");
      return false;
    }
    self.notify(StoreEvent::Removed { table: T::TABLE, id });
    true
  }

  // ── Subscription ──────────────────────────────────────────────────────────

  pub fn subscribe(&mut self, observer: Observer) -> SubscriptionId {
    let id = SubscriptionId::next();
    self.observers.push((id, observer));
    id
  }

  /// Returns `false` if `id` was not subscribed to this collection.
  pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
    let before = self.observers.len();
    self.observers.retain(|(sub, _)| *sub != id);
    self.observers.len() != before
  }

  pub fn observer_count(&self) -> usize { self.observers.len() }

  fn notify(&self, event: StoreEvent) {
    for (_, observer) in &self.observers {
      observer(&event);
    }
  }
}

impl<T: Entity> Default for Collection<T> {
  fn default() -> Self { Self::new() }
}

impl<T: Entity> fmt::Debug for Collection<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Collection")
      .field("table", &T::TABLE)
      .field("len", &self.items.len())
      .field("observers", &self.observers.len())
      .finish()
  }
}
